//! Gacha pool aggregate and its weighted emissions.

use super::{ItemId, PoolId};
use crate::engine::Weighted;
use crate::error::{ErrorKind, GachaError, GachaResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Required sum of emission weights (basis points).
pub const WEIGHT_DENOMINATOR: i64 = 10_000;

/// One weighted entry of a pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Emission {
    pub id: Uuid,
    pub item_id: ItemId,
    weight: i32,
    pub is_pickup: bool,
}

impl Emission {
    /// Emission with a strictly positive weight.
    pub fn new(item_id: ItemId, weight: i32, is_pickup: bool) -> GachaResult<Self> {
        Self::restore(Uuid::new_v4(), item_id, weight, is_pickup)
    }

    pub fn restore(id: Uuid, item_id: ItemId, weight: i32, is_pickup: bool) -> GachaResult<Self> {
        if weight <= 0 {
            return Err(GachaError::with_message(
                ErrorKind::InvalidWeightConfig,
                format!("emission weight must be positive, got {}", weight),
            ));
        }
        Ok(Self {
            id,
            item_id,
            weight,
            is_pickup,
        })
    }

    pub fn weight(&self) -> i32 {
        self.weight
    }
}

impl Weighted for Emission {
    fn weight(&self) -> i64 {
        i64::from(self.weight)
    }
}

/// A pool users draw from.
///
/// Pools are assembled incrementally; [`GachaPool::validate_configuration`]
/// must pass before the pool is used for drawing. The emission order is
/// significant to the sampler and is preserved everywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GachaPool {
    pub id: PoolId,
    pub name: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub cost_per_draw: i32,
    pub pity_ceiling: i32,
    pub emissions: Vec<Emission>,
}

impl GachaPool {
    pub fn create(
        name: impl Into<String>,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
        cost_per_draw: i32,
        pity_ceiling: i32,
    ) -> GachaResult<Self> {
        if cost_per_draw <= 0 {
            return Err(GachaError::invalid_parameter(
                "cost per draw must be at least 1",
            ));
        }
        if pity_ceiling < 0 {
            return Err(GachaError::invalid_parameter(
                "pity ceiling must not be negative",
            ));
        }
        if start_at >= end_at {
            return Err(GachaError::invalid_parameter(
                "end_at must be after start_at",
            ));
        }
        Ok(Self {
            id: PoolId::random(),
            name: name.into(),
            start_at,
            end_at,
            cost_per_draw,
            pity_ceiling,
            emissions: Vec::new(),
        })
    }

    pub fn add_emission(&mut self, emission: Emission) {
        self.emissions.push(emission);
    }

    pub fn with_emission(mut self, emission: Emission) -> Self {
        self.add_emission(emission);
        self
    }

    /// Succeeds iff there is at least one emission and the weights sum to exactly
    /// [`WEIGHT_DENOMINATOR`].
    pub fn validate_configuration(&self) -> GachaResult<&Self> {
        if self.emissions.is_empty() {
            return Err(GachaError::with_message(
                ErrorKind::InvalidWeightConfig,
                format!("pool {} has no emissions", self.id),
            ));
        }
        let total: i64 = self.emissions.iter().map(|e| i64::from(e.weight)).sum();
        if total != WEIGHT_DENOMINATOR {
            return Err(GachaError::with_message(
                ErrorKind::InvalidWeightConfig,
                format!(
                    "pool {} weight total {}, expected {}",
                    self.id, total, WEIGHT_DENOMINATOR
                ),
            ));
        }
        Ok(self)
    }

    /// Half-open interval test `[start_at, end_at)`.
    pub fn is_open_at(&self, t: DateTime<Utc>) -> bool {
        self.start_at <= t && t < self.end_at
    }
}
