//! Capacity-bounded inventory ledger.

use super::{ItemId, UserId};
use crate::error::{ErrorKind, GachaError, GachaResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Quantity of one item held by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub quantity: i32,
    /// Optimistic concurrency token (0 = never persisted).
    pub version: i64,
}

impl InventoryItem {
    /// Empty holding.
    pub fn create(user_id: UserId, item_id: ItemId) -> Self {
        Self {
            user_id,
            item_id,
            quantity: 0,
            version: 0,
        }
    }

    /// Add `amount` units, all or nothing, never exceeding `max_capacity`.
    pub fn add_quantity(&self, amount: i32, max_capacity: i32) -> GachaResult<InventoryItem> {
        if amount <= 0 {
            warn!(user_id = %self.user_id, item_id = %self.item_id, amount, "Invalid grant amount");
            return Err(GachaError::invalid_parameter(format!(
                "grant amount must be at least 1, got {}",
                amount
            )));
        }

        let projected = i64::from(self.quantity) + i64::from(amount);
        if projected > i64::from(max_capacity) {
            warn!(
                user_id = %self.user_id,
                item_id = %self.item_id,
                current = self.quantity,
                amount,
                max_capacity,
                "Inventory overflow"
            );
            return Err(GachaError::with_message(
                ErrorKind::InventoryOverflow,
                format!(
                    "capacity exceeded: max {}, current {}, adding {}",
                    max_capacity, self.quantity, amount
                ),
            ));
        }

        debug!(
            user_id = %self.user_id,
            item_id = %self.item_id,
            before = self.quantity,
            amount,
            "Adding inventory quantity"
        );
        Ok(InventoryItem {
            quantity: projected as i32,
            ..self.clone()
        })
    }
}
