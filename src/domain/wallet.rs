//! Dual-currency wallet aggregate.

use super::{Balance, UserId};
use crate::error::{ErrorKind, GachaError, GachaResult, ResultExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

/// A user's paid and free currency.
///
/// Mutated only through [`Wallet::consume`] and [`Wallet::deposit`], both of
/// which return a new value and leave `self` untouched on failure. The combined
/// total never exceeds [`Balance::MAX`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub user_id: UserId,
    paid: Balance,
    free: Balance,
    /// Optimistic concurrency token, bumped by every successful save.
    pub version: i64,
}

impl Wallet {
    /// Fresh wallet with zero balances.
    pub fn create(user_id: UserId) -> Self {
        Self {
            user_id,
            paid: Balance::ZERO,
            free: Balance::ZERO,
            version: 0,
        }
    }

    /// Rehydrate a stored wallet.
    pub fn restore(user_id: UserId, paid: i64, free: i64, version: i64) -> GachaResult<Self> {
        let paid = Balance::new(paid)?;
        let free = Balance::new(free)?;
        if paid.as_i64() + free.as_i64() > Balance::MAX {
            return Err(GachaError::unexpected(format!(
                "stored wallet for {} exceeds total bound",
                user_id
            )));
        }
        Ok(Self {
            user_id,
            paid,
            free,
            version,
        })
    }

    pub fn paid(&self) -> Balance {
        self.paid
    }

    pub fn free(&self) -> Balance {
        self.free
    }

    pub fn total(&self) -> i64 {
        self.paid.as_i64() + self.free.as_i64()
    }

    /// Deduct `amount`, paid currency first, then free currency for the remainder.
    pub fn consume(&self, amount: i64) -> GachaResult<Wallet> {
        self.validate_non_negative(amount, "consume")
            .and_then(|amount| self.validate_sufficient(amount))
            .tap(|amount| debug!(user_id = %self.user_id, amount, "Consuming currency"))
            .and_then(|amount| {
                let from_paid = amount.min(self.paid.as_i64());
                let paid = self.paid.subtract(from_paid)?;
                let free = self.free.subtract(amount - from_paid)?;
                Ok(Wallet {
                    paid,
                    free,
                    ..self.clone()
                })
            })
            .tap(|w| {
                info!(
                    user_id = %w.user_id,
                    consumed = amount,
                    paid = w.paid.amount(),
                    free = w.free.amount(),
                    "Wallet consumed"
                )
            })
            .tap_failure(|e| {
                warn!(user_id = %self.user_id, code = e.kind.code(), message = %e.message, "Consume failed")
            })
    }

    /// Credit both currencies independently.
    pub fn deposit(&self, paid_amount: i64, free_amount: i64) -> GachaResult<Wallet> {
        self.validate_non_negative(paid_amount, "deposit")
            .and_then(|_| self.validate_non_negative(free_amount, "deposit"))
            .and_then(|_| self.validate_capacity(paid_amount, free_amount))
            .tap(|_| debug!(user_id = %self.user_id, paid_amount, free_amount, "Depositing currency"))
            .and_then(|_| {
                Ok(Wallet {
                    paid: self.paid.add(paid_amount)?,
                    free: self.free.add(free_amount)?,
                    ..self.clone()
                })
            })
            .tap(|w| {
                info!(
                    user_id = %w.user_id,
                    paid_amount,
                    free_amount,
                    total = w.total(),
                    "Wallet deposited"
                )
            })
            .tap_failure(|e| {
                warn!(user_id = %self.user_id, code = e.kind.code(), message = %e.message, "Deposit failed")
            })
    }

    fn validate_non_negative(&self, amount: i64, op: &str) -> GachaResult<i64> {
        if amount < 0 {
            return Err(GachaError::invalid_parameter(format!(
                "{} amount must not be negative, got {}",
                op, amount
            )));
        }
        Ok(amount)
    }

    fn validate_sufficient(&self, amount: i64) -> GachaResult<i64> {
        if self.total() < amount {
            return Err(GachaError::with_message(
                ErrorKind::InsufficientBalance,
                format!("total {} cannot cover {}", self.total(), amount),
            ));
        }
        Ok(amount)
    }

    fn validate_capacity(&self, paid_add: i64, free_add: i64) -> GachaResult<()> {
        let next_paid = self.paid.as_i64().saturating_add(paid_add);
        let next_free = self.free.as_i64().saturating_add(free_add);
        if next_paid > Balance::MAX
            || next_free > Balance::MAX
            || next_paid.saturating_add(next_free) > Balance::MAX
        {
            error!(
                user_id = %self.user_id,
                current_paid = self.paid.amount(),
                paid_add,
                current_free = self.free.amount(),
                free_add,
                "Wallet capacity overflow"
            );
            return Err(GachaError::with_message(
                ErrorKind::InventoryOverflow,
                format!("wallet would exceed maximum {}", Balance::MAX),
            ));
        }
        Ok(())
    }
}
