//! Item master record.

use super::ItemId;
use crate::error::{GachaError, GachaResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    /// Free-form rarity label (e.g. "R", "SR", "SSR").
    pub rarity: String,
    pub max_capacity: i32,
}

impl Item {
    pub fn create(name: impl Into<String>, rarity: impl Into<String>, max_capacity: i32) -> GachaResult<Self> {
        Self::restore(ItemId::random(), name, rarity, max_capacity)
    }

    pub fn restore(
        id: ItemId,
        name: impl Into<String>,
        rarity: impl Into<String>,
        max_capacity: i32,
    ) -> GachaResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(GachaError::invalid_parameter("item name is required"));
        }
        if max_capacity <= 0 {
            return Err(GachaError::invalid_parameter(format!(
                "max capacity must be at least 1, got {}",
                max_capacity
            )));
        }
        Ok(Self {
            id,
            name,
            rarity: rarity.into(),
            max_capacity,
        })
    }
}
