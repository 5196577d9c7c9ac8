//! In-process candidate store backed by DashMap, seeded from a JSON file.
//! Stands in for the campaign database: it joins ad units to campaigns and
//! serves them by placement type.

use crate::semantic::VectorIndex;
use agentads_core::collaborators::CandidateSource;
use agentads_core::types::{AdUnit, Campaign, Candidate, UnitStatus, UnitType};
use anyhow::Context;
use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Seed file layout.
#[derive(Debug, Default, Deserialize)]
pub struct StoreSeed {
    #[serde(default)]
    pub campaigns: Vec<Campaign>,
    #[serde(default)]
    pub ad_units: Vec<AdUnit>,
}

#[derive(Default)]
pub struct InMemoryCandidateStore {
    campaigns: DashMap<String, Arc<Campaign>>,
    units: DashMap<String, AdUnit>,
}

impl InMemoryCandidateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: StoreSeed) -> Self {
        let store = Self::new();
        for campaign in seed.campaigns {
            store.upsert_campaign(campaign);
        }
        for unit in seed.ad_units {
            store.upsert_unit(unit);
        }
        store
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading seed file {}", path.display()))?;
        let seed: StoreSeed = serde_json::from_str(&raw)
            .with_context(|| format!("parsing seed file {}", path.display()))?;
        let store = Self::from_seed(seed);
        info!(
            path = %path.display(),
            campaigns = store.campaigns.len(),
            ad_units = store.units.len(),
            "Candidate store seeded"
        );
        Ok(store)
    }

    pub fn upsert_campaign(&self, campaign: Campaign) {
        self.campaigns.insert(campaign.id.clone(), Arc::new(campaign));
    }

    pub fn upsert_unit(&self, unit: AdUnit) {
        self.units.insert(unit.id.clone(), unit);
    }

    pub fn campaign_count(&self) -> usize {
        self.campaigns.len()
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Copy every unit embedding into `index`. Returns how many were indexed.
    pub fn index_embeddings(&self, index: &VectorIndex) -> usize {
        let mut indexed = 0;
        for entry in self.units.iter() {
            if let Some(embedding) = &entry.value().embedding {
                index.insert(entry.key().clone(), embedding.clone());
                indexed += 1;
            }
        }
        indexed
    }

    /// Active units of `unit_type` joined with their campaign, ordered by unit id.
    pub fn candidates(&self, unit_type: UnitType) -> Vec<Candidate> {
        let mut candidates: Vec<Candidate> = self
            .units
            .iter()
            .filter(|entry| {
                let unit = entry.value();
                unit.unit_type == unit_type && unit.status == UnitStatus::Active
            })
            .filter_map(|entry| {
                let unit = entry.value();
                match self.campaigns.get(&unit.campaign_id) {
                    Some(campaign) => Some(Candidate::new(unit.clone(), campaign.value().clone())),
                    None => {
                        warn!(
                            unit_id = %unit.id,
                            campaign_id = %unit.campaign_id,
                            "Ad unit references unknown campaign"
                        );
                        None
                    }
                }
            })
            .collect();
        candidates.sort_by(|a, b| a.unit.id.cmp(&b.unit.id));
        candidates
    }
}

#[async_trait]
impl CandidateSource for InMemoryCandidateStore {
    async fn fetch_candidates(&self, unit_type: UnitType) -> anyhow::Result<Vec<Candidate>> {
        Ok(self.candidates(unit_type))
    }
}
