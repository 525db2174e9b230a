use super::listeners::{DrawEventListener, HistoryRecorder, InventoryGranter};
use super::settle;
use crate::config::Config;
use crate::db::Repository;
use crate::domain::{
    from_millis, to_millis, DrawCompleted, DrawReceipt, DrawnItem, EmissionOutcome, EmissionType,
    GachaState, ItemId, PoolId, RequestId, UserId,
};
use crate::engine::lottery;
use crate::error::{ErrorKind, GachaError, GachaResult};
use crate::item_master::ItemMaster;
use chrono::Utc;
use rand::rngs::OsRng;
use sqlx::sqlite::SqliteConnection;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub const DEFAULT_MAX_DRAW_COUNT: u32 = 10;

/// Runs one draw request as a single atomic unit of work.
///
/// Within one transaction: lock the wallet, check the pool, debit the cost,
/// sample `draw_count` emissions while advancing the pity state, persist, then
/// hand the completed event to every listener. Any failure rolls everything
/// back and is returned as is.
#[derive(Clone)]
pub struct DrawCoordinator {
    repo: Arc<Repository>,
    item_master: Arc<dyn ItemMaster>,
    listeners: Vec<Arc<dyn DrawEventListener>>,
    max_draw_count: u32,
}

impl DrawCoordinator {
    /// Coordinator without listeners.
    pub fn new(repo: Arc<Repository>, item_master: Arc<dyn ItemMaster>) -> Self {
        Self {
            repo,
            item_master,
            listeners: Vec::new(),
            max_draw_count: DEFAULT_MAX_DRAW_COUNT,
        }
    }

    /// Coordinator that grants inventory and records history for every draw.
    pub fn from_config(
        repo: Arc<Repository>,
        item_master: Arc<dyn ItemMaster>,
        config: &Config,
    ) -> Self {
        let granter = InventoryGranter::new(repo.clone(), item_master.clone());
        let recorder = HistoryRecorder::new(repo.clone());
        Self::new(repo, item_master)
            .with_max_draw_count(config.max_draw_count)
            .with_listener(Arc::new(granter))
            .with_listener(Arc::new(recorder))
    }

    pub fn with_max_draw_count(mut self, max_draw_count: u32) -> Self {
        self.max_draw_count = max_draw_count;
        self
    }

    /// Listeners run in registration order.
    pub fn with_listener(mut self, listener: Arc<dyn DrawEventListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub async fn draw(
        &self,
        user_id: &UserId,
        pool_id: &PoolId,
        draw_count: u32,
        request_id: RequestId,
    ) -> GachaResult<DrawReceipt> {
        debug!(%request_id, %user_id, %pool_id, draw_count, "Draw requested");

        if draw_count == 0 || draw_count > self.max_draw_count {
            let err = GachaError::invalid_parameter(format!(
                "draw count must be between 1 and {}, got {}",
                self.max_draw_count, draw_count
            ));
            warn!(%request_id, %user_id, code = err.kind.code(), message = %err.message, "Draw rejected");
            return Err(err);
        }

        let mut tx = self.repo.begin().await?;
        let outcome = self
            .run(&mut tx, user_id, pool_id, draw_count, request_id)
            .await;

        match settle(tx, outcome).await {
            Ok(receipt) => {
                info!(
                    %request_id,
                    %user_id,
                    %pool_id,
                    draw_count,
                    consumed_paid = receipt.consumed_paid,
                    consumed_free = receipt.consumed_free,
                    "Draw committed"
                );
                Ok(receipt)
            }
            Err(e) if e.is_fatal() => {
                error!(%request_id, %user_id, %pool_id, code = e.kind.code(), message = %e.message, "Draw failed");
                Err(e)
            }
            Err(e) => {
                warn!(%request_id, %user_id, %pool_id, code = e.kind.code(), message = %e.message, "Draw rolled back");
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        conn: &mut SqliteConnection,
        user_id: &UserId,
        pool_id: &PoolId,
        draw_count: u32,
        request_id: RequestId,
    ) -> GachaResult<DrawReceipt> {
        // Lock first: the wallet write takes the database write lock, so every
        // later read in this unit of work sees committed state.
        let wallet = self
            .repo
            .load_wallet_for_exclusive_write(conn, user_id)
            .await?;

        let now = from_millis(to_millis(Utc::now()))?;
        let pool = self
            .repo
            .load_pool_with_emissions(conn, pool_id)
            .await?
            .filter(|p| p.is_open_at(now))
            .ok_or_else(|| {
                GachaError::with_message(
                    ErrorKind::GachaPoolExpired,
                    format!("pool {} is closed or does not exist", pool_id),
                )
            })?;
        pool.validate_configuration()?;

        let wallet = wallet.ok_or_else(|| {
            GachaError::with_message(
                ErrorKind::WalletNotFound,
                format!("no wallet for user {}", user_id),
            )
        })?;

        let cost = i64::from(pool.cost_per_draw) * i64::from(draw_count);
        let paid_before = wallet.paid().as_i64();
        let free_before = wallet.free().as_i64();
        let mut wallet = wallet.consume(cost)?;

        let mut state = self
            .repo
            .find_state(conn, user_id, pool_id)
            .await?
            .unwrap_or_else(|| GachaState::create(*user_id, *pool_id));

        let mut results = Vec::with_capacity(draw_count as usize);
        for _ in 0..draw_count {
            let emission_type = if state.is_pity_reached(pool.pity_ceiling) {
                EmissionType::AtCeiling
            } else {
                EmissionType::Normal
            };
            let emission = lottery::draw(pool.emissions.as_slice(), &mut OsRng)?;
            let item = self.item_master.item(&emission.item_id).await?;
            let is_top_rarity = self.item_master.is_top_rarity(&emission.item_id).await?;
            state = state.update_state(is_top_rarity, &pool)?;

            results.push(EmissionOutcome {
                item_id: item.id,
                item_name: item.name,
                rarity: item.rarity,
                is_pickup: emission.is_pickup,
                is_top_rarity,
                emission_type,
            });
        }

        let owned_before = self.owned_items(conn, user_id, &results).await?;

        self.repo.save_wallet(conn, &mut wallet).await?;
        self.repo.save_state(conn, &mut state).await?;

        let event = DrawCompleted {
            request_id,
            user_id: *user_id,
            pool_id: *pool_id,
            consumed_paid: paid_before - wallet.paid().as_i64(),
            consumed_free: free_before - wallet.free().as_i64(),
            results,
            occurred_at: now,
        };

        for listener in &self.listeners {
            listener.on_draw_completed(conn, &event).await?;
        }

        Ok(DrawReceipt {
            request_id,
            consumed_paid: event.consumed_paid,
            consumed_free: event.consumed_free,
            results: event
                .results
                .into_iter()
                .map(|o| DrawnItem {
                    is_new: !owned_before.contains(&o.item_id),
                    item_id: o.item_id,
                    name: o.item_name,
                    rarity: o.rarity,
                    emission_type: o.emission_type,
                    quantity: 1,
                })
                .collect(),
        })
    }

    /// Drawn items the user already held before this transaction.
    async fn owned_items(
        &self,
        conn: &mut SqliteConnection,
        user_id: &UserId,
        results: &[EmissionOutcome],
    ) -> GachaResult<HashSet<ItemId>> {
        let mut owned = HashSet::new();
        let distinct: HashSet<ItemId> = results.iter().map(|o| o.item_id).collect();
        for item_id in distinct {
            let held = self
                .repo
                .find_inventory_item(conn, user_id, &item_id)
                .await?
                .map_or(false, |i| i.quantity > 0);
            if held {
                owned.insert(item_id);
            }
        }
        Ok(owned)
    }
}
