//! Handlers that consume the draw-completed event inside the draw's transaction.
//!
//! A failing handler fails the whole draw: the coordinator rolls back the
//! debit, the pity update and every earlier handler's writes.

use crate::db::Repository;
use crate::domain::{DrawCompleted, GachaTransaction, InventoryItem, ItemId};
use crate::error::{ErrorKind, GachaResult, ResultExt};
use crate::item_master::ItemMaster;
use async_trait::async_trait;
use sqlx::sqlite::SqliteConnection;
use std::sync::Arc;
use tracing::{error, info, warn};

#[async_trait]
pub trait DrawEventListener: Send + Sync {
    /// Handle one completed draw using the caller's connection.
    async fn on_draw_completed(
        &self,
        conn: &mut SqliteConnection,
        event: &DrawCompleted,
    ) -> GachaResult<()>;
}

/// Grants one unit of every drawn item, bounded by the item's capacity.
pub struct InventoryGranter {
    repo: Arc<Repository>,
    item_master: Arc<dyn ItemMaster>,
}

impl InventoryGranter {
    pub fn new(repo: Arc<Repository>, item_master: Arc<dyn ItemMaster>) -> Self {
        Self { repo, item_master }
    }
}

/// Drawn quantities per item, in order of first appearance.
fn tally(event: &DrawCompleted) -> Vec<(ItemId, i32)> {
    let mut counts: Vec<(ItemId, i32)> = Vec::new();
    for outcome in &event.results {
        match counts.iter_mut().find(|(id, _)| *id == outcome.item_id) {
            Some((_, n)) => *n += 1,
            None => counts.push((outcome.item_id, 1)),
        }
    }
    counts
}

#[async_trait]
impl DrawEventListener for InventoryGranter {
    async fn on_draw_completed(
        &self,
        conn: &mut SqliteConnection,
        event: &DrawCompleted,
    ) -> GachaResult<()> {
        for (item_id, amount) in tally(event) {
            let max_capacity = self.item_master.max_capacity(&item_id).await?;
            let current = self
                .repo
                .find_inventory_item(conn, &event.user_id, &item_id)
                .await?
                .unwrap_or_else(|| InventoryItem::create(event.user_id, item_id));

            let mut granted = current.add_quantity(amount, max_capacity).tap_failure(|e| {
                if e.kind == ErrorKind::InventoryOverflow {
                    error!(
                        request_id = %event.request_id,
                        user_id = %event.user_id,
                        item_id = %item_id,
                        amount,
                        max_capacity,
                        "Inventory grant exceeds capacity"
                    );
                }
            })?;
            self.repo.save_inventory_item(conn, &mut granted).await?;
        }

        info!(
            request_id = %event.request_id,
            user_id = %event.user_id,
            items = event.results.len(),
            "Inventory granted"
        );
        Ok(())
    }
}

/// Appends the immutable history record keyed by the request id.
pub struct HistoryRecorder {
    repo: Arc<Repository>,
}

impl HistoryRecorder {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl DrawEventListener for HistoryRecorder {
    async fn on_draw_completed(
        &self,
        conn: &mut SqliteConnection,
        event: &DrawCompleted,
    ) -> GachaResult<()> {
        let record = GachaTransaction::record(event)?;
        self.repo
            .insert_history_if_absent(conn, &record)
            .await
            .tap_failure(|e| {
                if e.kind == ErrorKind::DuplicateRequest {
                    warn!(request_id = %event.request_id, user_id = %event.user_id, "Replayed draw request");
                }
            })?;
        info!(request_id = %event.request_id, "History recorded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repo::test_support::setup_test_db;
    use crate::domain::{EmissionOutcome, EmissionType, Item, PoolId, RequestId, UserId};
    use crate::item_master::CatalogItemMaster;
    use chrono::Utc;

    fn outcome(item: &Item) -> EmissionOutcome {
        EmissionOutcome {
            item_id: item.id,
            item_name: item.name.clone(),
            rarity: item.rarity.clone(),
            is_pickup: false,
            is_top_rarity: false,
            emission_type: EmissionType::Normal,
        }
    }

    fn event(user_id: UserId, results: Vec<EmissionOutcome>) -> DrawCompleted {
        DrawCompleted {
            request_id: RequestId::generate(),
            user_id,
            pool_id: PoolId::random(),
            consumed_paid: 300,
            consumed_free: 0,
            results,
            occurred_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_granter_aggregates_duplicates() {
        let (repo, _temp) = setup_test_db().await;
        let repo = Arc::new(repo);
        let potion = Item::create("Potion", "R", 99).unwrap();
        let sword = Item::create("Sword", "SR", 5).unwrap();
        let master = Arc::new(
            CatalogItemMaster::new(["SSR"])
                .with_item(potion.clone())
                .with_item(sword.clone()),
        );
        let granter = InventoryGranter::new(repo.clone(), master);
        let user = UserId::random();

        let ev = event(user, vec![outcome(&potion), outcome(&sword), outcome(&potion)]);
        let mut conn = repo.pool().acquire().await.unwrap();
        granter.on_draw_completed(&mut conn, &ev).await.unwrap();

        let potions = repo
            .find_inventory_item(&mut conn, &user, &potion.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(potions.quantity, 2);
        assert_eq!(potions.version, 1);
    }

    #[tokio::test]
    async fn test_granter_rejects_over_capacity() {
        let (repo, _temp) = setup_test_db().await;
        let repo = Arc::new(repo);
        let relic = Item::create("Relic", "SSR", 1).unwrap();
        let master = Arc::new(CatalogItemMaster::new(["SSR"]).with_item(relic.clone()));
        let granter = InventoryGranter::new(repo.clone(), master);

        let ev = event(UserId::random(), vec![outcome(&relic), outcome(&relic)]);
        let mut conn = repo.pool().acquire().await.unwrap();
        let err = granter.on_draw_completed(&mut conn, &ev).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InventoryOverflow);
    }

    #[tokio::test]
    async fn test_recorder_rejects_replay() {
        let (repo, _temp) = setup_test_db().await;
        let repo = Arc::new(repo);
        let recorder = HistoryRecorder::new(repo.clone());
        let ev = event(UserId::random(), vec![]);

        let mut conn = repo.pool().acquire().await.unwrap();
        recorder.on_draw_completed(&mut conn, &ev).await.unwrap();
        let err = recorder.on_draw_completed(&mut conn, &ev).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateRequest);
    }
}
