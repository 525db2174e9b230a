//! Non-negative currency amount with overflow-checked arithmetic.

use crate::error::{ErrorKind, GachaError, GachaResult};
use serde::{Deserialize, Serialize};

/// A non-negative amount bounded by `i32::MAX`.
///
/// All arithmetic widens to `i64` before the bound check so the check itself
/// cannot wrap. Overflow (`InventoryOverflow`) and underflow
/// (`InsufficientBalance`) are distinct failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Balance(i32);

impl Balance {
    pub const ZERO: Balance = Balance(0);
    /// Largest representable amount.
    pub const MAX: i64 = i32::MAX as i64;

    /// Balance of `amount`, rejecting negatives and values past [`Balance::MAX`].
    pub fn new(amount: i64) -> GachaResult<Self> {
        if amount < 0 {
            return Err(GachaError::invalid_parameter(format!(
                "balance must not be negative, got {}",
                amount
            )));
        }
        if amount > Self::MAX {
            return Err(GachaError::with_message(
                ErrorKind::InventoryOverflow,
                format!("balance {} exceeds maximum {}", amount, Self::MAX),
            ));
        }
        Ok(Balance(amount as i32))
    }

    pub fn amount(&self) -> i32 {
        self.0
    }

    pub fn as_i64(&self) -> i64 {
        i64::from(self.0)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// `self + value`; `value` must be non-negative.
    pub fn add(self, value: i64) -> GachaResult<Balance> {
        if value < 0 {
            return Err(GachaError::invalid_parameter(format!(
                "addition must not be negative, got {}",
                value
            )));
        }
        let next = self.as_i64().checked_add(value).unwrap_or(i64::MAX);
        if next > Self::MAX {
            return Err(GachaError::with_message(
                ErrorKind::InventoryOverflow,
                format!("balance {} + {} exceeds maximum {}", self.0, value, Self::MAX),
            ));
        }
        Ok(Balance(next as i32))
    }

    /// `self - value`; `value` must be non-negative and covered by the balance.
    pub fn subtract(self, value: i64) -> GachaResult<Balance> {
        if value < 0 {
            return Err(GachaError::invalid_parameter(format!(
                "subtraction must not be negative, got {}",
                value
            )));
        }
        if self.as_i64() < value {
            return Err(GachaError::with_message(
                ErrorKind::InsufficientBalance,
                format!("balance {} cannot cover {}", self.0, value),
            ));
        }
        Ok(Balance((self.as_i64() - value) as i32))
    }
}

impl TryFrom<i64> for Balance {
    type Error = GachaError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Balance::new(value)
    }
}

impl From<Balance> for i64 {
    fn from(b: Balance) -> Self {
        b.as_i64()
    }
}

impl std::fmt::Display for Balance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
