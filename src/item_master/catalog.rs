//! In-memory item master built from item records.

use super::ItemMaster;
use crate::domain::{Item, ItemId};
use crate::error::{GachaError, GachaResult};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

/// Item master answering from a fixed catalog.
#[derive(Debug, Clone, Default)]
pub struct CatalogItemMaster {
    items: HashMap<ItemId, Item>,
    top_rarities: HashSet<String>,
}

impl CatalogItemMaster {
    /// Empty catalog; `top_rarities` are the labels treated as top rarity.
    pub fn new<I, S>(top_rarities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            items: HashMap::new(),
            top_rarities: top_rarities.into_iter().map(Into::into).collect(),
        }
    }

    /// Add an item to the catalog.
    pub fn with_item(mut self, item: Item) -> Self {
        self.items.insert(item.id, item);
        self
    }

    /// Add multiple items to the catalog.
    pub fn with_items(mut self, items: impl IntoIterator<Item = Item>) -> Self {
        self.items.extend(items.into_iter().map(|i| (i.id, i)));
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn lookup(&self, item_id: &ItemId) -> GachaResult<&Item> {
        self.items
            .get(item_id)
            .ok_or_else(|| GachaError::invalid_parameter(format!("unknown item {}", item_id)))
    }
}

#[async_trait]
impl ItemMaster for CatalogItemMaster {
    async fn item(&self, item_id: &ItemId) -> GachaResult<Item> {
        self.lookup(item_id).cloned()
    }

    async fn is_top_rarity(&self, item_id: &ItemId) -> GachaResult<bool> {
        Ok(self.top_rarities.contains(&self.lookup(item_id)?.rarity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn test_top_rarity_from_configured_labels() {
        let ssr = Item::create("Dragon", "SSR", 1).unwrap();
        let r = Item::create("Slime", "R", 999).unwrap();
        let master = CatalogItemMaster::new(["SSR"])
            .with_item(ssr.clone())
            .with_item(r.clone());

        assert!(master.is_top_rarity(&ssr.id).await.unwrap());
        assert!(!master.is_top_rarity(&r.id).await.unwrap());
        assert_eq!(master.max_capacity(&r.id).await.unwrap(), 999);
    }

    #[tokio::test]
    async fn test_unknown_item() {
        let master = CatalogItemMaster::new(["SSR"]);
        let err = master.is_top_rarity(&ItemId::random()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidParameter);
    }
}
