//! Per-user, per-pool pity/guarantee counters.

use super::{GachaPool, PoolId, UserId};
use crate::error::{GachaError, GachaResult};
use serde::{Deserialize, Serialize};

/// Pity progress of one user against one pool.
///
/// Both counters stay within `[0, ceiling]`. Transitions go through
/// [`GachaState::update_state`] only; `version` is the optimistic token
/// checked by the repository (0 = never persisted).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GachaState {
    pub user_id: UserId,
    pub pool_id: PoolId,
    pub pity_count: i32,
    pub guaranteed_count: i32,
    pub version: i64,
}

impl GachaState {
    /// Default state created lazily on the first draw.
    pub fn create(user_id: UserId, pool_id: PoolId) -> Self {
        Self {
            user_id,
            pool_id,
            pity_count: 0,
            guaranteed_count: 0,
            version: 0,
        }
    }

    /// Next state after one draw.
    ///
    /// A top-rarity result resets both counters; otherwise both increment and
    /// are clamped at the pool's ceiling. A stale counter above the ceiling is
    /// never decreased by a non-winning draw.
    pub fn update_state(&self, is_top_rarity: bool, pool_setting: &GachaPool) -> GachaResult<GachaState> {
        let ceiling = pool_setting.pity_ceiling;
        if ceiling < 0 {
            return Err(GachaError::invalid_parameter(format!(
                "pity ceiling must not be negative, got {} for pool {}",
                ceiling, pool_setting.id
            )));
        }

        let (pity, guaranteed) = if is_top_rarity {
            (0, 0)
        } else {
            (
                clamp_increment(self.pity_count, ceiling),
                clamp_increment(self.guaranteed_count, ceiling),
            )
        };

        Ok(GachaState {
            pity_count: pity,
            guaranteed_count: guaranteed,
            ..self.clone()
        })
    }

    /// Whether the very next draw would hit or pass the ceiling.
    pub fn is_pity_reached(&self, ceiling: i32) -> bool {
        if ceiling <= 0 {
            return false;
        }
        i64::from(self.pity_count) + 1 >= i64::from(ceiling)
    }
}

fn clamp_increment(current: i32, ceiling: i32) -> i32 {
    let next = current.saturating_add(1).min(ceiling);
    next.max(current)
}
