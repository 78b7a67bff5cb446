//! Deal persistence collaborator.
//!
//! The engine's contract with storage is best effort: a store failure
//! is logged by the caller and never prevents an evaluation result
//! from being returned. Assumption records are append-only and are
//! removed only by cascading deal deletion.

use crate::core::types::{
    now_ms, AssumptionRecord, ChannelObservation, EvaluationResult, ProductInput, ProductMetadata,
};
use crate::overrides::OverrideSet;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// A stored deal: the inputs it was evaluated from, the overrides in
/// effect, and the last evaluation result. Observations are stored so
/// an override recompute can reconstruct channel data without
/// re-fetching from the marketplaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deal {
    pub deal_id: String,
    pub input: ProductInput,
    pub metadata: ProductMetadata,
    pub observations: Vec<ChannelObservation>,
    pub overrides: OverrideSet,
    pub result: EvaluationResult,
    pub created_ms: u64,
    pub updated_ms: u64,
}

/// Storage collaborator for deals and assumption records.
#[async_trait]
pub trait DealStore: Send + Sync {
    async fn create_deal(&self, deal: Deal) -> Result<()>;
    async fn find_deal(&self, deal_id: &str) -> Result<Option<Deal>>;
    async fn update_deal(&self, deal: Deal) -> Result<()>;
    /// Delete a deal and, cascading, its assumption records.
    async fn delete_deal(&self, deal_id: &str) -> Result<()>;
    async fn append_assumptions(&self, records: &[AssumptionRecord]) -> Result<()>;
    async fn assumptions_for(&self, deal_id: &str) -> Result<Vec<AssumptionRecord>>;
}

/// In-memory store used by tests and the demo wiring.
#[derive(Default)]
pub struct MemoryDealStore {
    deals: RwLock<HashMap<String, Deal>>,
    records: RwLock<Vec<AssumptionRecord>>,
}

impl MemoryDealStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DealStore for MemoryDealStore {
    async fn create_deal(&self, mut deal: Deal) -> Result<()> {
        deal.created_ms = now_ms();
        deal.updated_ms = deal.created_ms;
        self.deals.write().await.insert(deal.deal_id.clone(), deal);
        Ok(())
    }

    async fn find_deal(&self, deal_id: &str) -> Result<Option<Deal>> {
        Ok(self.deals.read().await.get(deal_id).cloned())
    }

    async fn update_deal(&self, mut deal: Deal) -> Result<()> {
        deal.updated_ms = now_ms();
        self.deals.write().await.insert(deal.deal_id.clone(), deal);
        Ok(())
    }

    async fn delete_deal(&self, deal_id: &str) -> Result<()> {
        self.deals.write().await.remove(deal_id);
        self.records
            .write()
            .await
            .retain(|r| r.deal_id != deal_id);
        Ok(())
    }

    async fn append_assumptions(&self, records: &[AssumptionRecord]) -> Result<()> {
        self.records.write().await.extend_from_slice(records);
        Ok(())
    }

    async fn assumptions_for(&self, deal_id: &str) -> Result<Vec<AssumptionRecord>> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|r| r.deal_id == deal_id)
            .cloned()
            .collect())
    }
}

/// Store that always fails. Used to verify the best-effort contract.
pub struct FailingDealStore;

#[async_trait]
impl DealStore for FailingDealStore {
    async fn create_deal(&self, _deal: Deal) -> Result<()> {
        anyhow::bail!("storage unavailable")
    }

    async fn find_deal(&self, _deal_id: &str) -> Result<Option<Deal>> {
        anyhow::bail!("storage unavailable")
    }

    async fn update_deal(&self, _deal: Deal) -> Result<()> {
        anyhow::bail!("storage unavailable")
    }

    async fn delete_deal(&self, _deal_id: &str) -> Result<()> {
        anyhow::bail!("storage unavailable")
    }

    async fn append_assumptions(&self, _records: &[AssumptionRecord]) -> Result<()> {
        anyhow::bail!("storage unavailable")
    }

    async fn assumptions_for(&self, _deal_id: &str) -> Result<Vec<AssumptionRecord>> {
        anyhow::bail!("storage unavailable")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::AssumptionType;

    fn record(deal_id: &str) -> AssumptionRecord {
        AssumptionRecord {
            deal_id: deal_id.to_string(),
            assumption_type: AssumptionType::Duty,
            old_value: serde_json::json!({ "rate": 0.05 }),
            new_value: serde_json::json!({ "rate": 0.10 }),
            changed_by: "tester".to_string(),
            timestamp_ms: now_ms(),
        }
    }

    #[tokio::test]
    async fn delete_cascades_to_records() {
        let store = MemoryDealStore::new();
        store
            .append_assumptions(&[record("d-1"), record("d-2")])
            .await
            .unwrap();
        store.delete_deal("d-1").await.unwrap();
        assert!(store.assumptions_for("d-1").await.unwrap().is_empty());
        assert_eq!(store.assumptions_for("d-2").await.unwrap().len(), 1);
    }
}
