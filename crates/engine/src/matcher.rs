//! Hierarchical relevance between a requested taxonomy path and a campaign's
//! targeted taxonomies.
//!
//! The targeted taxonomy is treated as a prefix candidate of the request:
//! a campaign on `insurance.auto` matches a request for
//! `insurance.auto.full_coverage.quote` on two segments. Matched segment
//! counts map to relevance through a step function ([`RelevancePolicy`]) that
//! rewards specificity steeply rather than linearly.

use agentads_core::config::RelevanceConfig;
use agentads_core::error::{DecisionError, DecisionResult};
use agentads_core::taxonomy::{TaxonomyPath, TaxonomyTarget};

/// Relevance of an exact string match, regardless of policy.
pub const EXACT_MATCH: f64 = 1.0;

/// Relevance per number of leading segments matched. Index 0 is always 0.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelevancePolicy {
    steps: [f64; 5],
}

impl RelevancePolicy {
    /// Steps must lie in (0, 1] and be non-decreasing in specificity.
    pub fn new(
        vertical: f64,
        category: f64,
        subcategory: f64,
        intent: f64,
    ) -> DecisionResult<Self> {
        let steps = [0.0, vertical, category, subcategory, intent];
        if steps[1..].iter().any(|s| !(*s > 0.0 && *s <= 1.0)) {
            return Err(DecisionError::Config(format!(
                "relevance steps must be in (0, 1], got {:?}",
                &steps[1..]
            )));
        }
        if steps.windows(2).any(|w| w[1] < w[0]) {
            return Err(DecisionError::Config(format!(
                "relevance steps must not decrease with specificity, got {:?}",
                &steps[1..]
            )));
        }
        Ok(Self { steps })
    }

    pub fn from_config(config: &RelevanceConfig) -> DecisionResult<Self> {
        Self::new(
            config.vertical,
            config.category,
            config.subcategory,
            config.intent,
        )
    }

    pub fn score_for(&self, matched_segments: usize) -> f64 {
        self.steps[matched_segments.min(self.steps.len() - 1)]
    }
}

impl Default for RelevancePolicy {
    fn default() -> Self {
        Self {
            steps: [0.0, 0.5, 0.7, 0.9, 1.0],
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TaxonomyMatcher {
    policy: RelevancePolicy,
}

impl TaxonomyMatcher {
    pub fn new(policy: RelevancePolicy) -> Self {
        Self { policy }
    }

    /// Relevance of one targeted taxonomy for a request, in [0, 1].
    pub fn match_score(&self, requested: &TaxonomyPath, targeted: &TaxonomyTarget) -> f64 {
        if requested.as_str() == targeted.as_str() {
            return EXACT_MATCH;
        }
        let matched = targeted
            .segments()
            .iter()
            .zip(requested.segments())
            .take_while(|(t, r)| t == r)
            .count();
        self.policy.score_for(matched)
    }

    /// String form of [`match_score`](Self::match_score). Anything that fails to
    /// parse scores zero.
    pub fn match_score_str(&self, requested: &str, targeted: &str) -> f64 {
        match (TaxonomyPath::parse(requested), TaxonomyTarget::parse(targeted)) {
            (Ok(requested), Ok(targeted)) => self.match_score(&requested, &targeted),
            _ => 0.0,
        }
    }

    /// A campaign matches as well as its single best target.
    pub fn relevance_for_campaign(
        &self,
        requested: &TaxonomyPath,
        targets: &[TaxonomyTarget],
    ) -> f64 {
        targets
            .iter()
            .map(|t| self.match_score(requested, t))
            .fold(0.0, f64::max)
    }
}
