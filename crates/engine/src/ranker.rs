//! Ordering and truncation of scored candidates.

use agentads_core::types::{DecisionStatus, ScoredCandidate};

/// A full ranking and how many of its leading entries were selected.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub ranked: Vec<ScoredCandidate>,
    pub selected: usize,
}

impl Selection {
    /// The selected units, best first.
    pub fn units(&self) -> &[ScoredCandidate] {
        &self.ranked[..self.selected]
    }

    pub fn status(&self) -> DecisionStatus {
        Ranker::status_for(self.units())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Ranker;

impl Ranker {
    pub fn new() -> Self {
        Self
    }

    /// Sort by composite score, highest first. The sort is stable, so
    /// equal scores keep their input order and identical inputs always
    /// produce identical rankings.
    pub fn rank(&self, mut scored: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
        scored.sort_by(|a, b| b.composite.total_cmp(&a.composite));
        scored
    }

    /// Rank, then select at most `max_units` from the top. The unselected
    /// tail stays in the ranking for the decision record.
    pub fn select(&self, scored: Vec<ScoredCandidate>, max_units: usize) -> Selection {
        let ranked = self.rank(scored);
        let selected = ranked.len().min(max_units);
        Selection { ranked, selected }
    }

    pub fn status_for(selected: &[ScoredCandidate]) -> DecisionStatus {
        if selected.is_empty() {
            DecisionStatus::NoFill
        } else {
            DecisionStatus::Filled
        }
    }
}
