//! Units of work over the repository.
//!
//! - `draw.rs` - the draw transaction coordinator
//! - `listeners.rs` - in-transaction handlers for the draw-completed event
//! - `wallet.rs` - wallet opening and deposits

pub mod draw;
pub mod listeners;
pub mod wallet;

pub use draw::DrawCoordinator;
pub use listeners::{DrawEventListener, HistoryRecorder, InventoryGranter};
pub use wallet::WalletService;

use crate::error::GachaResult;
use sqlx::{Sqlite, Transaction};
use tracing::error;

/// Commit on success, roll back on failure. The first failure wins.
pub(crate) async fn settle<T>(
    tx: Transaction<'static, Sqlite>,
    outcome: GachaResult<T>,
) -> GachaResult<T> {
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                error!(error = %rollback_err, "Rollback failed");
            }
            Err(e)
        }
    }
}
