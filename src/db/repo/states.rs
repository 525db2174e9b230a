//! Pity state persistence with optimistic versioning.

use super::{stored_uuid, Repository};
use crate::domain::{GachaState, PoolId, UserId};
use crate::error::{ErrorKind, GachaError, GachaResult};
use sqlx::sqlite::SqliteConnection;
use sqlx::Row;

impl Repository {
    /// Find the pity state for (user, pool).
    pub async fn find_state(
        &self,
        conn: &mut SqliteConnection,
        user_id: &UserId,
        pool_id: &PoolId,
    ) -> GachaResult<Option<GachaState>> {
        let row = sqlx::query(
            r#"
            SELECT user_id, pool_id, pity_count, guaranteed_count, version
            FROM gacha_states
            WHERE user_id = ? AND pool_id = ?
            "#,
        )
        .bind(user_id.to_string())
        .bind(pool_id.to_string())
        .fetch_optional(&mut *conn)
        .await?;

        row.map(|row| {
            Ok(GachaState {
                user_id: UserId::new(stored_uuid(&row.get::<String, _>("user_id"))?),
                pool_id: PoolId::new(stored_uuid(&row.get::<String, _>("pool_id"))?),
                pity_count: row.get::<i32, _>("pity_count"),
                guaranteed_count: row.get::<i32, _>("guaranteed_count"),
                version: row.get::<i64, _>("version"),
            })
        })
        .transpose()
    }

    /// Insert a never-saved state or update a loaded one if its version still matches.
    ///
    /// # Errors
    /// `ConcurrentUpdateFailure` if another request created or modified the
    /// state since it was read.
    pub async fn save_state(
        &self,
        conn: &mut SqliteConnection,
        state: &mut GachaState,
    ) -> GachaResult<()> {
        let result = if state.version == 0 {
            sqlx::query(
                r#"
                INSERT INTO gacha_states (user_id, pool_id, pity_count, guaranteed_count, version)
                VALUES (?, ?, ?, ?, 1)
                ON CONFLICT(user_id, pool_id) DO NOTHING
                "#,
            )
            .bind(state.user_id.to_string())
            .bind(state.pool_id.to_string())
            .bind(state.pity_count)
            .bind(state.guaranteed_count)
            .execute(&mut *conn)
            .await?
        } else {
            sqlx::query(
                r#"
                UPDATE gacha_states
                SET pity_count = ?, guaranteed_count = ?, version = version + 1
                WHERE user_id = ? AND pool_id = ? AND version = ?
                "#,
            )
            .bind(state.pity_count)
            .bind(state.guaranteed_count)
            .bind(state.user_id.to_string())
            .bind(state.pool_id.to_string())
            .bind(state.version)
            .execute(&mut *conn)
            .await?
        };

        if result.rows_affected() == 0 {
            return Err(GachaError::with_message(
                ErrorKind::ConcurrentUpdateFailure,
                format!(
                    "gacha state for user {} pool {} was modified concurrently",
                    state.user_id, state.pool_id
                ),
            ));
        }
        state.version += 1;
        Ok(())
    }
}
