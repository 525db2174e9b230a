//! Item master records.

use super::{stored_uuid, Repository};
use crate::domain::{Item, ItemId};
use crate::error::GachaResult;
use sqlx::Row;

impl Repository {
    /// Register an item, replacing any record with the same id.
    pub async fn insert_item(&self, item: &Item) -> GachaResult<()> {
        sqlx::query(
            r#"
            INSERT INTO items (id, name, rarity, max_capacity)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                rarity = excluded.rarity,
                max_capacity = excluded.max_capacity
            "#,
        )
        .bind(item.id.to_string())
        .bind(item.name.as_str())
        .bind(item.rarity.as_str())
        .bind(item.max_capacity)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn query_items(&self) -> GachaResult<Vec<Item>> {
        let rows = sqlx::query("SELECT id, name, rarity, max_capacity FROM items ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                Item::restore(
                    ItemId::new(stored_uuid(&row.get::<String, _>("id"))?),
                    row.get::<String, _>("name"),
                    row.get::<String, _>("rarity"),
                    row.get::<i32, _>("max_capacity"),
                )
            })
            .collect()
    }
}
