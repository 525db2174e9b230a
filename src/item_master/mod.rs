//! Item-master collaborator: rarity classification and capacity limits.

use crate::domain::{Item, ItemId};
use crate::error::GachaResult;
use async_trait::async_trait;
use std::fmt;

pub mod catalog;

pub use catalog::CatalogItemMaster;

/// Read-only view of the item master.
///
/// The top-rarity boundary is configuration owned by the implementation; the
/// draw engine never guesses it.
#[async_trait]
pub trait ItemMaster: Send + Sync + fmt::Debug {
    /// Master record for an item.
    ///
    /// # Errors
    /// `InvalidParameter` if the item is unknown.
    async fn item(&self, item_id: &ItemId) -> GachaResult<Item>;

    /// Whether the item counts as top rarity for pity accounting.
    async fn is_top_rarity(&self, item_id: &ItemId) -> GachaResult<bool>;

    /// Per-user holding limit for the item.
    async fn max_capacity(&self, item_id: &ItemId) -> GachaResult<i32> {
        Ok(self.item(item_id).await?.max_capacity)
    }
}
