//! Inventory persistence.

use super::{stored_uuid, Repository};
use crate::domain::{InventoryItem, ItemId, UserId};
use crate::error::{ErrorKind, GachaError, GachaResult};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;

fn inventory_from_row(row: &SqliteRow) -> GachaResult<InventoryItem> {
    Ok(InventoryItem {
        user_id: UserId::new(stored_uuid(&row.get::<String, _>("user_id"))?),
        item_id: ItemId::new(stored_uuid(&row.get::<String, _>("item_id"))?),
        quantity: row.get::<i32, _>("quantity"),
        version: row.get::<i64, _>("version"),
    })
}

impl Repository {
    /// Find a user's holding of one item.
    pub async fn find_inventory_item(
        &self,
        conn: &mut SqliteConnection,
        user_id: &UserId,
        item_id: &ItemId,
    ) -> GachaResult<Option<InventoryItem>> {
        let row = sqlx::query(
            r#"
            SELECT user_id, item_id, quantity, version
            FROM inventory_items
            WHERE user_id = ? AND item_id = ?
            "#,
        )
        .bind(user_id.to_string())
        .bind(item_id.to_string())
        .fetch_optional(&mut *conn)
        .await?;

        row.as_ref().map(inventory_from_row).transpose()
    }

    /// All holdings of a user, ordered by item id.
    pub async fn query_inventory(&self, user_id: &UserId) -> GachaResult<Vec<InventoryItem>> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, item_id, quantity, version
            FROM inventory_items
            WHERE user_id = ?
            ORDER BY item_id ASC
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(inventory_from_row).collect()
    }

    /// Insert a new holding or update a loaded one if its version still matches.
    ///
    /// # Errors
    /// `ConcurrentUpdateFailure` on a version mismatch.
    pub async fn save_inventory_item(
        &self,
        conn: &mut SqliteConnection,
        item: &mut InventoryItem,
    ) -> GachaResult<()> {
        let result = if item.version == 0 {
            sqlx::query(
                r#"
                INSERT INTO inventory_items (user_id, item_id, quantity, version)
                VALUES (?, ?, ?, 1)
                ON CONFLICT(user_id, item_id) DO NOTHING
                "#,
            )
            .bind(item.user_id.to_string())
            .bind(item.item_id.to_string())
            .bind(item.quantity)
            .execute(&mut *conn)
            .await?
        } else {
            sqlx::query(
                r#"
                UPDATE inventory_items
                SET quantity = ?, version = version + 1
                WHERE user_id = ? AND item_id = ? AND version = ?
                "#,
            )
            .bind(item.quantity)
            .bind(item.user_id.to_string())
            .bind(item.item_id.to_string())
            .bind(item.version)
            .execute(&mut *conn)
            .await?
        };

        if result.rows_affected() == 0 {
            return Err(GachaError::with_message(
                ErrorKind::ConcurrentUpdateFailure,
                format!(
                    "inventory of user {} item {} was modified concurrently",
                    item.user_id, item.item_id
                ),
            ));
        }
        item.version += 1;
        Ok(())
    }
}
