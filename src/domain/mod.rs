//! Domain aggregates and value objects for the draw engine.
//!
//! This module provides:
//! - Overflow-checked `Balance` and the dual-currency `Wallet`
//! - `GachaPool` with its ordered, weighted `Emission`s
//! - The pity/guarantee `GachaState` machine
//! - The capacity-bounded `InventoryItem` ledger
//! - Draw outcomes, the `DrawCompleted` event and the `GachaTransaction` history record

pub mod balance;
pub mod inventory;
pub mod item;
pub mod outcome;
pub mod pool;
pub mod primitives;
pub mod request_id;
pub mod state;
pub mod wallet;

pub use balance::Balance;
pub use inventory::InventoryItem;
pub use item::Item;
pub use outcome::{
    DrawCompleted, DrawReceipt, DrawnItem, EmissionOutcome, EmissionType, GachaTransaction,
};
pub use pool::{Emission, GachaPool, WEIGHT_DENOMINATOR};
pub use primitives::{from_millis, to_millis, ItemId, PoolId, UserId};
pub use request_id::RequestId;
pub use state::GachaState;
pub use wallet::Wallet;
