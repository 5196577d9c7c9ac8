//! The pure decision kernel: migrate, filter, score, rank, package.
//!
//! `DecisionEngine::decide` performs no I/O. Candidates and (optionally)
//! semantic similarity are fetched by the caller beforehand, so any number of
//! decisions may run concurrently against one shared engine.

use crate::filter::{CandidateFilter, EligibilityContext};
use crate::matcher::{RelevancePolicy, TaxonomyMatcher};
use crate::migrator::{DeprecationTable, Migration, TaxonomyMigrator};
use crate::package::ResponsePackager;
use crate::ranker::{Ranker, Selection};
use crate::scorer::{MatchMode, Scorer};
use agentads_core::config::{AppConfig, DecisionConfig};
use agentads_core::error::DecisionResult;
use agentads_core::taxonomy::TaxonomyPath;
use agentads_core::types::{
    Candidate, DecisionRecord, DecisionStage, DecisionStatus, MatchKind, ScoredEntry,
    SimilarityScores,
};
use agentads_core::wire::{DecideResponse, ValidatedRequest};
use chrono::Utc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Everything a single decision produced.
#[derive(Debug, Clone)]
pub struct DecisionOutcome {
    pub response: DecideResponse,
    pub record: DecisionRecord,
}

impl DecisionOutcome {
    pub fn status(&self) -> DecisionStatus {
        self.response.status
    }

    pub fn warning(&self) -> Option<&str> {
        self.response.taxonomy_warning.as_deref()
    }
}

pub struct DecisionEngine {
    migrator: TaxonomyMigrator,
    filter: CandidateFilter,
    scorer: Scorer,
    ranker: Ranker,
    packager: ResponsePackager,
    policy: DecisionConfig,
    node_id: String,
}

impl DecisionEngine {
    pub fn new(
        migrator: TaxonomyMigrator,
        scorer: Scorer,
        packager: ResponsePackager,
        policy: DecisionConfig,
        node_id: String,
    ) -> Self {
        Self {
            migrator,
            filter: CandidateFilter::new(),
            scorer,
            ranker: Ranker::new(),
            packager,
            policy,
            node_id,
        }
    }

    /// Build an engine from application config, validating the deprecation
    /// table, relevance policy and tracking base URL.
    pub fn from_config(config: &AppConfig) -> DecisionResult<Self> {
        let table = DeprecationTable::from_config(&config.taxonomy)?;
        let policy = RelevancePolicy::from_config(&config.relevance)?;
        let packager = ResponsePackager::new(&config.tracking, &config.decision)?;
        info!(
            taxonomy_version = %table.version(),
            deprecated_entries = table.len(),
            "Decision engine initialized"
        );
        Ok(Self::new(
            TaxonomyMigrator::new(table),
            Scorer::new(TaxonomyMatcher::new(policy)),
            packager,
            config.decision.clone(),
            config.node_id.clone(),
        ))
    }

    pub fn migrate(&self, taxonomy: &str) -> Migration {
        self.migrator.migrate(taxonomy)
    }

    /// Pick the relevance signal for this request. Similarity wins when it
    /// scores at least one eligible candidate; otherwise the migrated
    /// taxonomy, if it parses. `None` means nothing can be relevant.
    pub fn resolve_mode(
        &self,
        taxonomy: &str,
        similarity: Option<SimilarityScores>,
        eligible: &[Candidate],
    ) -> Option<MatchMode> {
        if let Some(scores) = similarity {
            if eligible.iter().any(|c| scores.get(&c.unit.id).is_some()) {
                return Some(MatchMode::Semantic(scores));
            }
            if !scores.is_empty() {
                metrics::counter!("decide.semantic_fallback").increment(1);
                debug!(
                    matches = scores.len(),
                    "No eligible unit has a similarity score, using taxonomy"
                );
            }
        }
        match TaxonomyPath::parse(taxonomy) {
            Ok(path) => Some(MatchMode::Taxonomy(path)),
            Err(e) => {
                warn!(taxonomy = %taxonomy, error = %e, "Malformed taxonomy, nothing will match");
                None
            }
        }
    }

    pub fn decide(
        &self,
        request: &ValidatedRequest,
        candidates: Vec<Candidate>,
        similarity: Option<SimilarityScores>,
    ) -> DecisionOutcome {
        let start = Instant::now();
        let decision_id = Uuid::new_v4();
        let mut stage = DecisionStage::Received;

        let migration = self.migrator.migrate(request.taxonomy());
        if migration.migrated() {
            metrics::counter!("taxonomy.migrated").increment(1);
            debug!(
                request_id = %request.request_id,
                from = %request.taxonomy(),
                to = %migration.path,
                "Taxonomy migrated"
            );
        }
        stage = advance(stage, DecisionStage::Migrated);

        let candidates_fetched = candidates.len();
        let ctx = EligibilityContext::from_request(request);
        let filtered = self.filter.filter(candidates, &ctx);
        let candidates_eligible = filtered.eligible.len();
        let rejections = filtered.rejection_summary();
        stage = advance(stage, DecisionStage::Filtered);

        let mode = self.resolve_mode(&migration.path, similarity, &filtered.eligible);
        let kind = mode.as_ref().map(MatchMode::kind).unwrap_or(MatchKind::Taxonomy);

        let max_units = self
            .policy
            .effective_max_units(request.opportunity.constraints.max_units);
        let selection = match mode {
            // Nothing eligible: straight to no-fill without scoring.
            _ if filtered.eligible.is_empty() => Selection::default(),
            None => Selection::default(),
            Some(mode) => {
                let scored = self.scorer.score(filtered.eligible, &mode);
                stage = advance(stage, DecisionStage::Scored);
                let selection = self.ranker.select(scored, max_units);
                stage = advance(stage, DecisionStage::Selected);
                selection
            }
        };

        let status = selection.status();
        stage = advance(
            stage,
            match status {
                DecisionStatus::Filled => DecisionStage::Filled,
                DecisionStatus::NoFill => DecisionStage::NoFill,
            },
        );

        let mut response = DecideResponse::no_fill(
            request.request_id.clone(),
            decision_id.to_string(),
            self.policy.ttl_ms,
        );
        response.taxonomy_warning = migration.warning.clone();
        if status == DecisionStatus::Filled {
            response.status = DecisionStatus::Filled;
            response.units = self
                .packager
                .package(selection.units(), kind, &migration.path);
        }

        let latency_us = start.elapsed().as_micros() as u64;
        let record = DecisionRecord {
            decision_id,
            request_id: request.request_id.clone(),
            agent_id: request.agent_id.clone(),
            node_id: self.node_id.clone(),
            placement_type: request.placement.unit_type,
            surface: request.placement.surface.clone(),
            requested_taxonomy: request.taxonomy().to_string(),
            effective_taxonomy: migration.path.clone(),
            taxonomy_migrated: migration.migrated(),
            match_kind: kind,
            status,
            final_stage: stage,
            candidates_fetched,
            candidates_eligible,
            rejections,
            scored: selection
                .ranked
                .iter()
                .enumerate()
                .map(|(i, s)| ScoredEntry {
                    unit_id: s.candidate.unit.id.clone(),
                    campaign_id: s.candidate.campaign.id.clone(),
                    relevance: s.relevance,
                    composite: s.composite,
                    selected: i < selection.selected,
                })
                .collect(),
            latency_us,
            timestamp: Utc::now(),
        };

        info!(
            request_id = %request.request_id,
            decision_id = %decision_id,
            match_kind = kind.as_str(),
            fetched = candidates_fetched,
            eligible = candidates_eligible,
            scored = selection.ranked.len(),
            units = response.units.len(),
            status = ?status,
            latency_us = latency_us,
            "Decision made"
        );

        DecisionOutcome { response, record }
    }
}

/// Move the state machine forward. Stages never go backwards.
fn advance(from: DecisionStage, to: DecisionStage) -> DecisionStage {
    debug_assert!(!from.is_terminal(), "decision already terminal at {:?}", from);
    to
}
