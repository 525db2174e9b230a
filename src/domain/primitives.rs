//! Domain identifiers and time helpers.

use crate::error::{GachaError, GachaResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new(id: Uuid) -> Self {
                $name(id)
            }

            /// Fresh random identifier.
            pub fn random() -> Self {
                $name(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Parse from the canonical hyphenated form.
            pub fn parse(s: &str) -> GachaResult<Self> {
                Uuid::parse_str(s.trim()).map($name).map_err(|_| {
                    GachaError::invalid_parameter(format!("malformed {}: {:?}", $label, s))
                })
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(
    /// Owner of a wallet, pity states and inventory.
    UserId,
    "user id"
);
uuid_id!(
    /// Gacha pool identifier.
    PoolId,
    "pool id"
);
uuid_id!(
    /// Item master identifier.
    ItemId,
    "item id"
);

/// Milliseconds since the Unix epoch, the storage representation of instants.
pub fn to_millis(t: DateTime<Utc>) -> i64 {
    t.timestamp_millis()
}

/// Inverse of [`to_millis`]; out-of-range values are a storage defect.
pub fn from_millis(ms: i64) -> GachaResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .ok_or_else(|| GachaError::unexpected(format!("timestamp out of range: {}", ms)))
}
