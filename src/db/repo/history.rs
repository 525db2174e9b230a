//! Draw history: idempotent insert keyed by request id, and queries.

use super::{stored_uuid, Repository};
use crate::domain::{from_millis, to_millis, GachaTransaction, PoolId, RequestId, UserId};
use crate::error::{ErrorKind, GachaError, GachaResult};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;

fn transaction_from_row(row: &SqliteRow) -> GachaResult<GachaTransaction> {
    Ok(GachaTransaction {
        request_id: RequestId::from_uuid(stored_uuid(&row.get::<String, _>("request_id"))?),
        user_id: UserId::new(stored_uuid(&row.get::<String, _>("user_id"))?),
        pool_id: PoolId::new(stored_uuid(&row.get::<String, _>("pool_id"))?),
        consumed_paid: row.get::<i64, _>("consumed_paid"),
        consumed_free: row.get::<i64, _>("consumed_free"),
        emission_results: row.get("emission_results"),
        executed_at: from_millis(row.get::<i64, _>("executed_at_ms"))?,
    })
}

impl Repository {
    /// Record a draw. The request id is the idempotency key.
    ///
    /// # Errors
    /// `DuplicateRequest` if a record with the same request id already exists.
    pub async fn insert_history_if_absent(
        &self,
        conn: &mut SqliteConnection,
        record: &GachaTransaction,
    ) -> GachaResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO gacha_transactions
                (request_id, user_id, pool_id, consumed_paid, consumed_free, emission_results, executed_at_ms)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(request_id) DO NOTHING
            "#,
        )
        .bind(record.request_id.to_string())
        .bind(record.user_id.to_string())
        .bind(record.pool_id.to_string())
        .bind(record.consumed_paid)
        .bind(record.consumed_free)
        .bind(record.emission_results.as_str())
        .bind(to_millis(record.executed_at))
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(GachaError::with_message(
                ErrorKind::DuplicateRequest,
                format!("request {} has already been processed", record.request_id),
            ));
        }
        Ok(())
    }

    /// Look up a single history record.
    pub async fn find_history(&self, request_id: &RequestId) -> GachaResult<Option<GachaTransaction>> {
        let row = sqlx::query(
            r#"
            SELECT request_id, user_id, pool_id, consumed_paid, consumed_free, emission_results, executed_at_ms
            FROM gacha_transactions
            WHERE request_id = ?
            "#,
        )
        .bind(request_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(transaction_from_row).transpose()
    }

    /// A user's draw history, newest first.
    pub async fn query_history(
        &self,
        user_id: &UserId,
        limit: u32,
        offset: u32,
    ) -> GachaResult<Vec<GachaTransaction>> {
        let rows = sqlx::query(
            r#"
            SELECT request_id, user_id, pool_id, consumed_paid, consumed_free, emission_results, executed_at_ms
            FROM gacha_transactions
            WHERE user_id = ?
            ORDER BY executed_at_ms DESC, request_id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(user_id.to_string())
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(transaction_from_row).collect()
    }
}
