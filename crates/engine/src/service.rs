//! Decision service: runs the collaborators around the pure engine.
//!
//! Collaborator failures never reach the caller. A store failure yields an
//! empty candidate set (no-fill); an embedding failure falls back to taxonomy
//! matching. Only a request missing required fields is an error.

use crate::engine::{DecisionEngine, DecisionOutcome};
use agentads_core::collaborators::{CandidateSource, DecisionSink, SimilaritySearch};
use agentads_core::error::DecisionResult;
use agentads_core::types::{DecisionStatus, SimilarityScores};
use agentads_core::wire::{DecideRequest, ValidatedRequest};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

pub struct DecisionService {
    engine: Arc<DecisionEngine>,
    candidates: Arc<dyn CandidateSource>,
    similarity: Arc<dyn SimilaritySearch>,
    sink: Arc<dyn DecisionSink>,
}

impl DecisionService {
    pub fn new(
        engine: Arc<DecisionEngine>,
        candidates: Arc<dyn CandidateSource>,
        similarity: Arc<dyn SimilaritySearch>,
        sink: Arc<dyn DecisionSink>,
    ) -> Self {
        Self {
            engine,
            candidates,
            similarity,
            sink,
        }
    }

    pub async fn decide(&self, request: DecideRequest) -> DecisionResult<DecisionOutcome> {
        let start = Instant::now();
        metrics::counter!("decide.requests").increment(1);

        let request = request.validate().inspect_err(|e| {
            metrics::counter!("decide.validation_errors").increment(1);
            warn!(error = %e, "Decide request rejected");
        })?;

        let candidates = match self
            .candidates
            .fetch_candidates(request.placement.unit_type)
            .await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                metrics::counter!("decide.store_errors").increment(1);
                warn!(
                    request_id = %request.request_id,
                    error = %e,
                    "Candidate fetch failed, serving no-fill"
                );
                Vec::new()
            }
        };

        let similarity = if candidates.is_empty() {
            None
        } else {
            let unit_ids: Vec<String> = candidates.iter().map(|c| c.unit.id.clone()).collect();
            self.lookup_similarity(&request, &unit_ids).await
        };

        let outcome = self.engine.decide(&request, candidates, similarity);
        self.sink.record(outcome.record.clone());

        match outcome.status() {
            DecisionStatus::Filled => metrics::counter!("decide.filled").increment(1),
            DecisionStatus::NoFill => metrics::counter!("decide.no_fill").increment(1),
        }
        metrics::histogram!("decide.latency_us").record(start.elapsed().as_micros() as f64);

        Ok(outcome)
    }

    /// Similarity of the fetched candidates to the conversation, or `None`
    /// when there is no context or nothing was found.
    async fn lookup_similarity(
        &self,
        request: &ValidatedRequest,
        unit_ids: &[String],
    ) -> Option<SimilarityScores> {
        let text = request.semantic_text()?;
        match self.similarity.similar_units(&text, unit_ids).await {
            Ok(scores) if !scores.is_empty() => Some(scores),
            Ok(_) => {
                debug!(request_id = %request.request_id, "No semantic matches, using taxonomy");
                metrics::counter!("decide.semantic_fallback").increment(1);
                None
            }
            Err(e) => {
                warn!(
                    request_id = %request.request_id,
                    error = %e,
                    "Similarity lookup failed, using taxonomy"
                );
                metrics::counter!("decide.semantic_fallback").increment(1);
                None
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::InMemoryCandidateStore;
    use crate::test_support::{make_campaign, make_unit};
    use agentads_core::collaborators::{capture_sink, NoSimilarity};
    use agentads_core::config::AppConfig;
    use agentads_core::error::DecisionError;
    use agentads_core::types::{Candidate, MatchKind, UnitType};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FailingStore;

    #[async_trait]
    impl CandidateSource for FailingStore {
        async fn fetch_candidates(&self, _unit_type: UnitType) -> anyhow::Result<Vec<Candidate>> {
            anyhow::bail!("connection refused")
        }
    }

    struct FailingSimilarity;

    #[async_trait]
    impl SimilaritySearch for FailingSimilarity {
        async fn similar_units(
            &self,
            _text: &str,
            _unit_ids: &[String],
        ) -> anyhow::Result<SimilarityScores> {
            anyhow::bail!("embedding service timeout")
        }
    }

    struct FixedSimilarity(SimilarityScores);

    #[async_trait]
    impl SimilaritySearch for FixedSimilarity {
        async fn similar_units(
            &self,
            _text: &str,
            _unit_ids: &[String],
        ) -> anyhow::Result<SimilarityScores> {
            Ok(self.0.clone())
        }
    }

    /// Knows similarities for more units than the store serves and only
    /// answers for the ids it is asked about.
    #[derive(Default)]
    struct ScopedSimilarity {
        asked: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SimilaritySearch for ScopedSimilarity {
        async fn similar_units(
            &self,
            _text: &str,
            unit_ids: &[String],
        ) -> anyhow::Result<SimilarityScores> {
            self.asked.lock().unwrap().extend(unit_ids.iter().cloned());
            let known = [("tool-1", 1.0), ("tool-2", 1.0), ("a", 0.8)];
            Ok(known
                .into_iter()
                .filter(|(id, _)| unit_ids.iter().any(|u| u == id))
                .collect())
        }
    }

    fn store() -> Arc<InMemoryCandidateStore> {
        let store = InMemoryCandidateStore::new();
        store.upsert_campaign(make_campaign("A", &["insurance.auto.full_coverage"]));
        store.upsert_campaign(make_campaign("B", &["insurance"]));
        store.upsert_unit(make_unit("a", "A", UnitType::SponsoredSuggestion));
        store.upsert_unit(make_unit("b", "B", UnitType::SponsoredSuggestion));
        Arc::new(store)
    }

    fn engine() -> Arc<DecisionEngine> {
        Arc::new(DecisionEngine::from_config(&AppConfig::default()).unwrap())
    }

    fn request(context: Option<&str>) -> DecideRequest {
        serde_json::from_value(serde_json::json!({
            "request_id": "req-42",
            "agent_id": "agent-7",
            "placement": { "type": "sponsored_suggestion", "surface": "chat" },
            "opportunity": {
                "intent": { "taxonomy": "insurance.auto.full_coverage.quote" },
                "context": { "country": "US", "language": "en", "platform": "web" }
            },
            "context": context,
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_taxonomy_decision_recorded() {
        let sink = capture_sink();
        let service =
            DecisionService::new(engine(), store(), Arc::new(NoSimilarity), sink.clone());
        let outcome = service.decide(request(None)).await.unwrap();
        assert_eq!(outcome.status(), DecisionStatus::Filled);
        assert_eq!(outcome.response.request_id, "req-42");
        assert_eq!(outcome.response.units.len(), 2);
        assert_eq!(sink.count(), 1);
        assert_eq!(sink.records()[0].agent_id, "agent-7");
    }

    #[tokio::test]
    async fn test_validation_error_surfaces() {
        let sink = capture_sink();
        let service =
            DecisionService::new(engine(), store(), Arc::new(NoSimilarity), sink.clone());
        let err = service.decide(DecideRequest::default()).await.unwrap_err();
        assert!(matches!(err, DecisionError::Validation { .. }));
        assert_eq!(sink.count(), 0);
    }

    #[tokio::test]
    async fn test_store_failure_degrades_to_no_fill() {
        let service = DecisionService::new(
            engine(),
            Arc::new(FailingStore),
            Arc::new(NoSimilarity),
            capture_sink(),
        );
        let outcome = service.decide(request(None)).await.unwrap();
        assert_eq!(outcome.status(), DecisionStatus::NoFill);
        assert!(outcome.response.units.is_empty());
    }

    #[tokio::test]
    async fn test_embedding_failure_falls_back_to_taxonomy() {
        let service = DecisionService::new(
            engine(),
            store(),
            Arc::new(FailingSimilarity),
            capture_sink(),
        );
        let outcome = service
            .decide(request(Some("my car insurance is too expensive")))
            .await
            .unwrap();
        assert_eq!(outcome.record.match_kind, MatchKind::Taxonomy);
        assert_eq!(outcome.status(), DecisionStatus::Filled);
    }

    #[tokio::test]
    async fn test_semantic_mode_when_context_present() {
        let scores: SimilarityScores = vec![("b", 0.9)].into_iter().collect();
        let service = DecisionService::new(
            engine(),
            store(),
            Arc::new(FixedSimilarity(scores)),
            capture_sink(),
        );

        let outcome = service
            .decide(request(Some("looking for any kind of insurance")))
            .await
            .unwrap();
        assert_eq!(outcome.record.match_kind, MatchKind::Semantic);
        assert_eq!(outcome.response.units.len(), 1);
        assert_eq!(outcome.response.units[0].unit_id, "b");

        // Without conversational context the similarity service is not consulted.
        let outcome = service.decide(request(None)).await.unwrap();
        assert_eq!(outcome.record.match_kind, MatchKind::Taxonomy);
    }

    #[tokio::test]
    async fn test_similarity_is_scoped_to_fetched_candidates() {
        let similarity = Arc::new(ScopedSimilarity::default());
        let service = DecisionService::new(engine(), store(), similarity.clone(), capture_sink());

        let outcome = service
            .decide(request(Some("which car insurance covers hail damage")))
            .await
            .unwrap();

        let mut asked = similarity.asked.lock().unwrap().clone();
        asked.sort();
        assert_eq!(asked, vec!["a", "b"]);
        assert_eq!(outcome.record.match_kind, MatchKind::Semantic);
        assert_eq!(outcome.status(), DecisionStatus::Filled);
        assert_eq!(outcome.response.units[0].unit_id, "a");
    }

    #[tokio::test]
    async fn test_scores_for_unfetched_units_fall_back_to_taxonomy() {
        let scores: SimilarityScores = vec![("tool-1", 1.0), ("tool-2", 1.0)].into_iter().collect();
        let service = DecisionService::new(
            engine(),
            store(),
            Arc::new(FixedSimilarity(scores)),
            capture_sink(),
        );
        let outcome = service
            .decide(request(Some("which car insurance covers hail damage")))
            .await
            .unwrap();
        assert_eq!(outcome.record.match_kind, MatchKind::Taxonomy);
        assert_eq!(outcome.status(), DecisionStatus::Filled);
        assert_eq!(outcome.response.units.len(), 2);
    }
}
