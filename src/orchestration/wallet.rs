use super::settle;
use crate::db::Repository;
use crate::domain::{UserId, Wallet};
use crate::error::{ErrorKind, GachaError, GachaResult};
use sqlx::sqlite::SqliteConnection;
use std::sync::Arc;
use tracing::{info, warn};

/// Wallet lifecycle outside of draws.
#[derive(Clone)]
pub struct WalletService {
    repo: Arc<Repository>,
}

impl WalletService {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self { repo }
    }

    /// Create a zero wallet for the user, or return the existing one unchanged.
    pub async fn open_wallet(&self, user_id: &UserId) -> GachaResult<Wallet> {
        let mut tx = self.repo.begin().await?;
        let outcome = self.open_in(&mut tx, user_id).await;
        let (wallet, created) = settle(tx, outcome).await?;
        if created {
            info!(%user_id, "Wallet opened");
        }
        Ok(wallet)
    }

    async fn open_in(
        &self,
        conn: &mut SqliteConnection,
        user_id: &UserId,
    ) -> GachaResult<(Wallet, bool)> {
        let created = self
            .repo
            .insert_wallet_if_absent(conn, &Wallet::create(*user_id))
            .await?;
        let wallet = self
            .repo
            .load_wallet_for_exclusive_write(conn, user_id)
            .await?
            .ok_or_else(|| GachaError::unexpected(format!("wallet {} vanished after insert", user_id)))?;
        Ok((wallet, created))
    }

    /// Credit paid and free currency under the wallet lock.
    pub async fn deposit(&self, user_id: &UserId, paid: i64, free: i64) -> GachaResult<Wallet> {
        let mut tx = self.repo.begin().await?;
        let outcome = self.deposit_in(&mut tx, user_id, paid, free).await;
        settle(tx, outcome).await.map_err(|e| {
            warn!(%user_id, paid, free, code = e.kind.code(), message = %e.message, "Deposit rolled back");
            e
        })
    }

    async fn deposit_in(
        &self,
        conn: &mut SqliteConnection,
        user_id: &UserId,
        paid: i64,
        free: i64,
    ) -> GachaResult<Wallet> {
        let wallet = self
            .repo
            .load_wallet_for_exclusive_write(conn, user_id)
            .await?
            .ok_or_else(|| {
                GachaError::with_message(
                    ErrorKind::WalletNotFound,
                    format!("no wallet for user {}", user_id),
                )
            })?;
        let mut wallet = wallet.deposit(paid, free)?;
        self.repo.save_wallet(conn, &mut wallet).await?;
        Ok(wallet)
    }
}
