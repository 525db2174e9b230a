//! Typed outcome for every fallible domain operation.
//!
//! Business failures are values, never panics: each carries an [`ErrorKind`]
//! from a closed taxonomy plus a human-readable message. Only
//! [`ErrorKind::UnexpectedError`] signals a defect.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Failure taxonomy shared by the ledger, sampler, state machine and coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Caller supplied an out-of-domain value.
    InvalidParameter,
    /// Wallet cannot cover the requested consumption.
    InsufficientBalance,
    /// A wallet deposit or inventory grant would exceed its bound.
    InventoryOverflow,
    /// Pool missing or outside its open interval.
    GachaPoolExpired,
    /// Emission weights are malformed or do not sum to the denominator.
    InvalidWeightConfig,
    /// No wallet exists for the user.
    WalletNotFound,
    /// Optimistic version conflict.
    ConcurrentUpdateFailure,
    /// Replay of an already-recorded request id.
    DuplicateRequest,
    /// Internal invariant violation.
    UnexpectedError,
}

impl ErrorKind {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::InvalidParameter => "COMMON-400",
            ErrorKind::InsufficientBalance => "GACHA-G001",
            ErrorKind::WalletNotFound => "GACHA-G002",
            ErrorKind::InventoryOverflow => "GACHA-G003",
            ErrorKind::GachaPoolExpired => "GACHA-P001",
            ErrorKind::InvalidWeightConfig => "GACHA-P002",
            ErrorKind::ConcurrentUpdateFailure => "GACHA-SYS-001",
            ErrorKind::DuplicateRequest => "GACHA-SYS-002",
            ErrorKind::UnexpectedError => "GACHA-500",
        }
    }

    /// Message used when a failure is raised without a custom one.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorKind::InvalidParameter => "invalid parameter",
            ErrorKind::InsufficientBalance => "insufficient balance",
            ErrorKind::WalletNotFound => "wallet not found",
            ErrorKind::InventoryOverflow => "capacity exceeded",
            ErrorKind::GachaPoolExpired => "gacha pool is closed or does not exist",
            ErrorKind::InvalidWeightConfig => "invalid emission weight configuration",
            ErrorKind::ConcurrentUpdateFailure => {
                "conflicting update from another request, please retry"
            }
            ErrorKind::DuplicateRequest => "request has already been processed",
            ErrorKind::UnexpectedError => "unexpected internal error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Failure half of [`GachaResult`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct GachaError {
    pub kind: ErrorKind,
    pub message: String,
}

impl GachaError {
    /// Failure with the kind's default message.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: kind.default_message().to_string(),
        }
    }

    /// Failure with a detailed message.
    pub fn with_message(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::with_message(ErrorKind::InvalidParameter, message)
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::with_message(ErrorKind::UnexpectedError, message)
    }

    /// Whether this failure indicates a bug rather than a business outcome.
    pub fn is_fatal(&self) -> bool {
        self.kind == ErrorKind::UnexpectedError
    }
}

impl From<sqlx::Error> for GachaError {
    fn from(err: sqlx::Error) -> Self {
        GachaError::unexpected(format!("storage error: {}", err))
    }
}

impl From<serde_json::Error> for GachaError {
    fn from(err: serde_json::Error) -> Self {
        GachaError::unexpected(format!("serialization error: {}", err))
    }
}

/// Success-or-failure outcome. `map` and `and_then` chain over success and
/// short-circuit on failure; [`ResultExt`] adds side-effect taps.
pub type GachaResult<T> = Result<T, GachaError>;

/// Railway taps over [`GachaResult`].
pub trait ResultExt<T> {
    /// Run `f` on the success value and pass the result through unchanged.
    fn tap<F: FnOnce(&T)>(self, f: F) -> Self;

    /// Run `f` on the failure and pass the result through unchanged.
    fn tap_failure<F: FnOnce(&GachaError)>(self, f: F) -> Self;
}

impl<T> ResultExt<T> for GachaResult<T> {
    fn tap<F: FnOnce(&T)>(self, f: F) -> Self {
        if let Ok(value) = &self {
            f(value);
        }
        self
    }

    fn tap_failure<F: FnOnce(&GachaError)>(self, f: F) -> Self {
        if let Err(err) = &self {
            f(err);
        }
        self
    }
}
