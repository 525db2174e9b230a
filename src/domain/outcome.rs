//! Draw outcomes, the draw-completed event and the immutable history record.

use super::{ItemId, PoolId, RequestId, UserId};
use crate::error::GachaResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pity counter state a draw was made in.
///
/// Both variants use the same weighted table; the label records the counter,
/// not a changed outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmissionType {
    /// Pity counter below its ceiling.
    Normal,
    /// Drawn while the next draw would hit or pass the pity ceiling.
    AtCeiling,
}

/// One drawn emission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmissionOutcome {
    pub item_id: ItemId,
    pub item_name: String,
    pub rarity: String,
    pub is_pickup: bool,
    pub is_top_rarity: bool,
    pub emission_type: EmissionType,
}

/// Domain event published once per successful draw, before commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawCompleted {
    pub request_id: RequestId,
    pub user_id: UserId,
    pub pool_id: PoolId,
    /// Paid currency actually deducted (pre/post snapshot delta).
    pub consumed_paid: i64,
    /// Free currency actually deducted (pre/post snapshot delta).
    pub consumed_free: i64,
    pub results: Vec<EmissionOutcome>,
    pub occurred_at: DateTime<Utc>,
}

/// Immutable history record keyed by the request id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GachaTransaction {
    pub request_id: RequestId,
    pub user_id: UserId,
    pub pool_id: PoolId,
    pub consumed_paid: i64,
    pub consumed_free: i64,
    /// Serialized `Vec<EmissionOutcome>`.
    pub emission_results: String,
    pub executed_at: DateTime<Utc>,
}

impl GachaTransaction {
    /// History record for a completed draw.
    pub fn record(event: &DrawCompleted) -> GachaResult<Self> {
        Ok(Self {
            request_id: event.request_id,
            user_id: event.user_id,
            pool_id: event.pool_id,
            consumed_paid: event.consumed_paid,
            consumed_free: event.consumed_free,
            emission_results: serde_json::to_string(&event.results)?,
            executed_at: event.occurred_at,
        })
    }

    /// Deserialize the stored outcome list.
    pub fn outcomes(&self) -> GachaResult<Vec<EmissionOutcome>> {
        Ok(serde_json::from_str(&self.emission_results)?)
    }
}

/// One entry of a [`DrawReceipt`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawnItem {
    pub item_id: ItemId,
    pub name: String,
    pub rarity: String,
    pub emission_type: EmissionType,
    /// The user held none of this item before the transaction.
    pub is_new: bool,
    pub quantity: i32,
}

/// What the caller receives from a committed draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawReceipt {
    pub request_id: RequestId,
    pub consumed_paid: i64,
    pub consumed_free: i64,
    pub results: Vec<DrawnItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serializes_outcomes() {
        let event = DrawCompleted {
            request_id: RequestId::generate(),
            user_id: UserId::random(),
            pool_id: PoolId::random(),
            consumed_paid: 100,
            consumed_free: 200,
            results: vec![EmissionOutcome {
                item_id: ItemId::random(),
                item_name: "Sword".to_string(),
                rarity: "SSR".to_string(),
                is_pickup: true,
                is_top_rarity: true,
                emission_type: EmissionType::AtCeiling,
            }],
            occurred_at: Utc::now(),
        };

        let tx = GachaTransaction::record(&event).unwrap();
        assert_eq!(tx.request_id, event.request_id);
        assert!(tx.emission_results.contains("\"emission_type\":\"AT_CEILING\""));
        assert_eq!(tx.outcomes().unwrap(), event.results);
    }
}
