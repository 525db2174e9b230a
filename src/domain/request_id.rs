//! Idempotency key for a draw request.

use crate::error::{GachaError, GachaResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Globally unique, creation-ordered request identifier (UUID v7).
///
/// Generated once per incoming request and reused verbatim on retries; it is
/// the primary key of the history record, so a replay cannot be recorded twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// New time-ordered identifier.
    pub fn generate() -> Self {
        RequestId(Uuid::now_v7())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        RequestId(id)
    }

    /// Parse a client-supplied identifier.
    pub fn parse(s: &str) -> GachaResult<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(GachaError::invalid_parameter("request id must not be empty"));
        }
        Uuid::parse_str(trimmed)
            .map(RequestId)
            .map_err(|_| GachaError::invalid_parameter(format!("malformed request id: {:?}", s)))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
