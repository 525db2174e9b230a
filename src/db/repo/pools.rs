//! Pool registration and loading.

use super::{stored_uuid, Repository};
use crate::domain::{from_millis, to_millis, Emission, GachaPool, ItemId, PoolId};
use crate::error::GachaResult;
use sqlx::sqlite::SqliteConnection;
use sqlx::Row;
use tracing::info;

impl Repository {
    /// Persist a finalized pool together with its emissions, preserving order.
    ///
    /// # Errors
    /// `InvalidWeightConfig` if the pool does not pass `validate_configuration`.
    pub async fn insert_pool(&self, pool: &GachaPool) -> GachaResult<()> {
        pool.validate_configuration()?;

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO gacha_pools (id, name, start_at_ms, end_at_ms, cost_per_draw, pity_ceiling, version)
            VALUES (?, ?, ?, ?, ?, ?, 0)
            "#,
        )
        .bind(pool.id.to_string())
        .bind(pool.name.as_str())
        .bind(to_millis(pool.start_at))
        .bind(to_millis(pool.end_at))
        .bind(pool.cost_per_draw)
        .bind(pool.pity_ceiling)
        .execute(&mut *tx)
        .await?;

        for (position, emission) in pool.emissions.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO gacha_emissions (id, pool_id, position, item_id, weight, is_pickup)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(emission.id.to_string())
            .bind(pool.id.to_string())
            .bind(position as i64)
            .bind(emission.item_id.to_string())
            .bind(emission.weight())
            .bind(emission.is_pickup)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!(pool_id = %pool.id, emissions = pool.emissions.len(), "Pool registered");
        Ok(())
    }

    /// Load a pool and its emissions in authored order.
    pub async fn load_pool_with_emissions(
        &self,
        conn: &mut SqliteConnection,
        pool_id: &PoolId,
    ) -> GachaResult<Option<GachaPool>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, start_at_ms, end_at_ms, cost_per_draw, pity_ceiling
            FROM gacha_pools
            WHERE id = ?
            "#,
        )
        .bind(pool_id.to_string())
        .fetch_optional(&mut *conn)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let emission_rows = sqlx::query(
            r#"
            SELECT id, item_id, weight, is_pickup
            FROM gacha_emissions
            WHERE pool_id = ?
            ORDER BY position ASC
            "#,
        )
        .bind(pool_id.to_string())
        .fetch_all(&mut *conn)
        .await?;

        let emissions = emission_rows
            .iter()
            .map(|r| {
                Emission::restore(
                    stored_uuid(&r.get::<String, _>("id"))?,
                    ItemId::new(stored_uuid(&r.get::<String, _>("item_id"))?),
                    r.get::<i32, _>("weight"),
                    r.get::<bool, _>("is_pickup"),
                )
            })
            .collect::<GachaResult<Vec<_>>>()?;

        Ok(Some(GachaPool {
            id: PoolId::new(stored_uuid(&row.get::<String, _>("id"))?),
            name: row.get("name"),
            start_at: from_millis(row.get::<i64, _>("start_at_ms"))?,
            end_at: from_millis(row.get::<i64, _>("end_at_ms"))?,
            cost_per_draw: row.get::<i32, _>("cost_per_draw"),
            pity_ceiling: row.get::<i32, _>("pity_ceiling"),
            emissions,
        }))
    }
}
