//! Relevance and composite ranking score per candidate.

use crate::matcher::TaxonomyMatcher;
use agentads_core::taxonomy::TaxonomyPath;
use agentads_core::types::{Candidate, MatchKind, ScoredCandidate, SimilarityScores};

/// How relevance is computed for a request, resolved once before scoring.
#[derive(Debug, Clone)]
pub enum MatchMode {
    /// Embedding similarity per ad unit, supplied by the similarity collaborator.
    Semantic(SimilarityScores),
    /// Hierarchical match of the (migrated) requested path against campaign targets.
    Taxonomy(TaxonomyPath),
}

impl MatchMode {
    pub fn kind(&self) -> MatchKind {
        match self {
            MatchMode::Semantic(_) => MatchKind::Semantic,
            MatchMode::Taxonomy(_) => MatchKind::Taxonomy,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Scorer {
    matcher: TaxonomyMatcher,
}

impl Scorer {
    pub fn new(matcher: TaxonomyMatcher) -> Self {
        Self { matcher }
    }

    pub fn relevance(&self, candidate: &Candidate, mode: &MatchMode) -> f64 {
        match mode {
            MatchMode::Semantic(scores) => scores.get(&candidate.unit.id).unwrap_or(0.0),
            MatchMode::Taxonomy(requested) => self
                .matcher
                .relevance_for_campaign(requested, &candidate.campaign.taxonomies),
        }
    }

    /// relevance x bid x quality. Semantic mode prices by CPC first, taxonomy
    /// mode by CPM first; a missing bid or quality counts as 1.0.
    pub fn composite(&self, candidate: &Candidate, relevance: f64, mode: &MatchMode) -> f64 {
        let campaign = &candidate.campaign;
        let bid = match mode {
            MatchMode::Semantic(_) => campaign.bid.cpc_first(),
            MatchMode::Taxonomy(_) => campaign.bid.cpm_first(),
        };
        relevance * bid * campaign.quality()
    }

    /// Score every candidate, keeping input order. Candidates with zero
    /// relevance are dropped here even though the filter never looks at relevance.
    pub fn score(&self, candidates: Vec<Candidate>, mode: &MatchMode) -> Vec<ScoredCandidate> {
        candidates
            .into_iter()
            .filter_map(|candidate| {
                let relevance = self.relevance(&candidate, mode);
                if relevance <= 0.0 || relevance.is_nan() {
                    return None;
                }
                let composite = self.composite(&candidate, relevance, mode);
                if composite.is_nan() {
                    return None;
                }
                Some(ScoredCandidate {
                    candidate,
                    relevance,
                    composite,
                })
            })
            .collect()
    }
}
