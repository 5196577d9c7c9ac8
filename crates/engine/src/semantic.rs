//! In-memory vector index of ad-unit embeddings and the similarity search
//! built on it.

use crate::embedding::Embedder;
use agentads_core::collaborators::SimilaritySearch;
use agentads_core::config::EmbeddingConfig;
use agentads_core::types::SimilarityScores;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// Cosine similarity in [-1, 1]. Zero for empty or mismatched vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }
    dot / denom
}

#[derive(Default)]
pub struct VectorIndex {
    vectors: DashMap<String, Vec<f32>>,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, unit_id: impl Into<String>, embedding: Vec<f32>) {
        self.vectors.insert(unit_id.into(), embedding);
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Units among `unit_ids` at or above `min_similarity`, best first, at
    /// most `limit`. Ids without an embedding are skipped. Ties are ordered by
    /// unit id so results do not depend on input order.
    pub fn search(
        &self,
        query: &[f32],
        unit_ids: &[String],
        min_similarity: f64,
        limit: usize,
    ) -> Vec<(String, f64)> {
        let mut hits: Vec<(String, f64)> = unit_ids
            .iter()
            .filter_map(|id| {
                let vector = self.vectors.get(id)?;
                let sim = cosine_similarity(query, vector.value()) as f64;
                Some((id.clone(), sim))
            })
            .filter(|(_, sim)| *sim >= min_similarity)
            .collect();
        hits.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        hits.dedup_by(|a, b| a.0 == b.0);
        hits.truncate(limit);
        hits
    }
}

/// Embeds conversational text and looks it up in the [`VectorIndex`].
pub struct SemanticSearch {
    embedder: Arc<dyn Embedder>,
    index: Arc<VectorIndex>,
    min_similarity: f64,
    max_results: usize,
}

impl SemanticSearch {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<VectorIndex>,
        config: &EmbeddingConfig,
    ) -> Self {
        Self {
            embedder,
            index,
            min_similarity: config.min_similarity,
            max_results: config.max_results,
        }
    }
}

#[async_trait]
impl SimilaritySearch for SemanticSearch {
    async fn similar_units(
        &self,
        text: &str,
        unit_ids: &[String],
    ) -> anyhow::Result<SimilarityScores> {
        if self.index.is_empty() || unit_ids.is_empty() {
            return Ok(SimilarityScores::new());
        }
        let query = self.embedder.embed(text).await?;
        let hits = self
            .index
            .search(&query, unit_ids, self.min_similarity, self.max_results);
        debug!(
            model = self.embedder.model_name(),
            hits = hits.len(),
            "Semantic lookup complete"
        );
        Ok(hits.into_iter().collect())
    }
}
