pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod item_master;
pub mod orchestration;

pub use config::Config;
pub use db::{init_db, init_db_with, DbOptions, Repository};
pub use domain::{
    Balance, DrawCompleted, DrawReceipt, DrawnItem, Emission, EmissionOutcome, EmissionType,
    GachaPool, GachaState, GachaTransaction, InventoryItem, Item, ItemId, PoolId, RequestId, UserId,
    Wallet,
};
pub use error::{ErrorKind, GachaError, GachaResult, ResultExt};
pub use item_master::{CatalogItemMaster, ItemMaster};
pub use orchestration::{DrawCoordinator, DrawEventListener, WalletService};
