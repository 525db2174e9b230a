//! Repository layer for database operations.
//!
//! This module provides the `Repository` struct for all database operations.
//! Methods are organized across submodules by aggregate:
//! - `wallets.rs` - exclusive wallet acquisition and optimistic saves
//! - `pools.rs` - pool registration and loading with ordered emissions
//! - `states.rs` - pity state lookup and optimistic saves
//! - `inventory.rs` - inventory lookup and optimistic saves
//! - `history.rs` - idempotent history insert and history queries
//! - `items.rs` - item master records
//!
//! Operations that take a `&mut SqliteConnection` participate in the caller's
//! unit of work; the rest run directly against the pool.

mod history;
mod inventory;
mod items;
mod pools;
mod states;
mod wallets;

use crate::error::{GachaError, GachaResult};
use sqlx::sqlite::{Sqlite, SqlitePool};
use sqlx::Transaction;
use uuid::Uuid;

/// Repository for database operations.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Start a unit of work. Dropping it without commit rolls back.
    pub async fn begin(&self) -> GachaResult<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }
}

/// Parse a UUID read back from storage; a malformed value is a storage defect.
fn stored_uuid(raw: &str) -> GachaResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| GachaError::unexpected(format!("corrupt stored id {:?}", raw)))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Repository;
    use crate::db::init_db;
    use tempfile::TempDir;

    pub async fn setup_test_db() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();
        let pool = init_db(&db_path).await.expect("init_db failed");
        (Repository::new(pool), temp_dir)
    }
}
