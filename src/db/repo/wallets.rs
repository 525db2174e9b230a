//! Wallet persistence: exclusive acquisition and optimistic saves.

use super::{stored_uuid, Repository};
use crate::domain::{UserId, Wallet};
use crate::error::{ErrorKind, GachaError, GachaResult};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;

fn wallet_from_row(row: &SqliteRow) -> GachaResult<Wallet> {
    let user_id: String = row.get("user_id");
    Wallet::restore(
        UserId::new(stored_uuid(&user_id)?),
        row.get::<i64, _>("paid"),
        row.get::<i64, _>("free"),
        row.get::<i64, _>("version"),
    )
}

impl Repository {
    /// Insert a new wallet unless one already exists for the user.
    ///
    /// Returns `true` if a row was inserted.
    pub async fn insert_wallet_if_absent(
        &self,
        conn: &mut SqliteConnection,
        wallet: &Wallet,
    ) -> GachaResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO wallets (user_id, paid, free, version)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id) DO NOTHING
            "#,
        )
        .bind(wallet.user_id.to_string())
        .bind(wallet.paid().as_i64())
        .bind(wallet.free().as_i64())
        .bind(wallet.version)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Load the wallet and take the write lock for the rest of the unit of work.
    ///
    /// The no-op `UPDATE` is the first write of the transaction, so SQLite grants
    /// this connection the database write lock; competing units of work block
    /// (up to the busy timeout) until this one commits or rolls back.
    pub async fn load_wallet_for_exclusive_write(
        &self,
        conn: &mut SqliteConnection,
        user_id: &UserId,
    ) -> GachaResult<Option<Wallet>> {
        let row = sqlx::query(
            r#"
            UPDATE wallets SET version = version
            WHERE user_id = ?
            RETURNING user_id, paid, free, version
            "#,
        )
        .bind(user_id.to_string())
        .fetch_optional(&mut *conn)
        .await?;

        row.as_ref().map(wallet_from_row).transpose()
    }

    /// Read a wallet without locking.
    pub async fn find_wallet(&self, user_id: &UserId) -> GachaResult<Option<Wallet>> {
        let row = sqlx::query(
            r#"
            SELECT user_id, paid, free, version
            FROM wallets
            WHERE user_id = ?
            "#,
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(wallet_from_row).transpose()
    }

    /// Persist balances if the stored version still matches, then bump the version.
    ///
    /// # Errors
    /// `ConcurrentUpdateFailure` if the wallet changed since it was read.
    pub async fn save_wallet(
        &self,
        conn: &mut SqliteConnection,
        wallet: &mut Wallet,
    ) -> GachaResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE wallets
            SET paid = ?, free = ?, version = version + 1
            WHERE user_id = ? AND version = ?
            "#,
        )
        .bind(wallet.paid().as_i64())
        .bind(wallet.free().as_i64())
        .bind(wallet.user_id.to_string())
        .bind(wallet.version)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(GachaError::with_message(
                ErrorKind::ConcurrentUpdateFailure,
                format!("wallet {} was modified concurrently", wallet.user_id),
            ));
        }
        wallet.version += 1;
        Ok(())
    }
}
