//! Seams to the services the decision path depends on but does not own.
//!
//! Storage and the embedding service are async and fallible; the decision
//! log is fire-and-forget. Modules accept `Arc<dyn ...>` so tests can swap in
//! the in-memory implementations below.

use crate::types::{Candidate, DecisionRecord, SimilarityScores, UnitType};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Fetches active ad units of one placement type, joined with their campaigns.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    async fn fetch_candidates(&self, unit_type: UnitType) -> anyhow::Result<Vec<Candidate>>;
}

/// Looks up ad units semantically similar to a piece of conversational text.
/// Only units named in `unit_ids` are scored, so units outside the fetched
/// candidate set cannot take up result slots.
#[async_trait]
pub trait SimilaritySearch: Send + Sync {
    async fn similar_units(
        &self,
        text: &str,
        unit_ids: &[String],
    ) -> anyhow::Result<SimilarityScores>;
}

/// Receives one record per decision for analytics.
pub trait DecisionSink: Send + Sync {
    fn record(&self, record: DecisionRecord);
}

/// In-memory sink that captures records for testing.
#[derive(Default)]
pub struct CaptureSink {
    records: Mutex<Vec<DecisionRecord>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn records(&self) -> Vec<DecisionRecord> {
        self.records.lock().expect("decision sink mutex poisoned").clone()
    }

    pub fn count(&self) -> usize {
        self.records.lock().expect("decision sink mutex poisoned").len()
    }
}

impl DecisionSink for CaptureSink {
    fn record(&self, record: DecisionRecord) {
        self.records
            .lock()
            .expect("decision sink mutex poisoned")
            .push(record);
    }
}

/// Similarity search that never finds anything. Used when embeddings are disabled.
pub struct NoSimilarity;

#[async_trait]
impl SimilaritySearch for NoSimilarity {
    async fn similar_units(
        &self,
        _text: &str,
        _unit_ids: &[String],
    ) -> anyhow::Result<SimilarityScores> {
        Ok(SimilarityScores::new())
    }
}

pub fn capture_sink() -> Arc<CaptureSink> {
    Arc::new(CaptureSink::new())
}
