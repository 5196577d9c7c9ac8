use crate::taxonomy::{deserialize_targets, TaxonomyTarget};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

/// Placement / ad unit format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UnitType {
    SponsoredSuggestion,
    SponsoredBlock,
    SponsoredTool,
}

impl UnitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitType::SponsoredSuggestion => "sponsored_suggestion",
            UnitType::SponsoredBlock => "sponsored_block",
            UnitType::SponsoredTool => "sponsored_tool",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Active,
    Paused,
    #[serde(other)]
    Inactive,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    Active,
    Paused,
    #[serde(other)]
    Inactive,
}

/// Allow-lists for geo / language / platform. Empty means unrestricted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Targeting {
    #[serde(default)]
    pub countries: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub platforms: Vec<String>,
}

impl Targeting {
    pub fn allows_country(&self, country: &str) -> bool {
        allow_list_permits(&self.countries, country)
    }

    pub fn allows_language(&self, language: &str) -> bool {
        allow_list_permits(&self.languages, language)
    }

    pub fn allows_platform(&self, platform: &str) -> bool {
        allow_list_permits(&self.platforms, platform)
    }
}

fn allow_list_permits(list: &[String], value: &str) -> bool {
    list.is_empty() || list.iter().any(|v| v.eq_ignore_ascii_case(value))
}

/// Point-in-time read of a campaign's budget counter, in minor currency units.
///
/// The decision path only ever reads this value; the counter itself is
/// incremented atomically by billing when clicks are recorded, so a snapshot
/// may be slightly stale.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BudgetSnapshot {
    pub total: u64,
    #[serde(default)]
    pub spent: u64,
}

impl BudgetSnapshot {
    pub fn new(total: u64, spent: u64) -> Self {
        Self { total, spent }
    }

    pub fn remaining(&self) -> u64 {
        self.total.saturating_sub(self.spent)
    }

    pub fn has_remaining(&self) -> bool {
        self.spent < self.total
    }
}

/// Bid amounts. Either, both or neither may be set.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Bid {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpc: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpm: Option<f64>,
}

impl Bid {
    pub fn cpc(amount: f64) -> Self {
        Self {
            cpc: Some(amount),
            cpm: None,
        }
    }

    pub fn cpm(amount: f64) -> Self {
        Self {
            cpc: None,
            cpm: Some(amount),
        }
    }

    /// CPC, falling back to CPM, then 1.0.
    pub fn cpc_first(&self) -> f64 {
        self.cpc.or(self.cpm).unwrap_or(1.0)
    }

    /// CPM, falling back to CPC, then 1.0.
    pub fn cpm_first(&self) -> f64 {
        self.cpm.or(self.cpc).unwrap_or(1.0)
    }
}

/// An advertiser's spending intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    pub advertiser_id: String,
    #[serde(default, deserialize_with = "deserialize_targets")]
    pub taxonomies: Vec<TaxonomyTarget>,
    #[serde(default)]
    pub targeting: Targeting,
    pub budget: BudgetSnapshot,
    #[serde(default)]
    pub bid: Bid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
    pub status: CampaignStatus,
}

impl Campaign {
    pub fn is_active(&self) -> bool {
        self.status == CampaignStatus::Active
    }

    /// Quality signal, 1.0 when the campaign has none.
    pub fn quality(&self) -> f64 {
        self.quality_score.unwrap_or(1.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Creative {
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub cta: String,
    pub action_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Disclosure {
    pub sponsor_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// One creative belonging to exactly one campaign. Read-only to the decision path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdUnit {
    pub id: String,
    pub campaign_id: String,
    pub unit_type: UnitType,
    pub creative: Creative,
    pub disclosure: Disclosure,
    pub status: UnitStatus,
    /// Embedding of the creative, used to seed the semantic index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

/// An ad unit joined with its campaign, as fetched from storage.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub unit: AdUnit,
    pub campaign: Arc<Campaign>,
}

impl Candidate {
    pub fn new(unit: AdUnit, campaign: Arc<Campaign>) -> Self {
        Self { unit, campaign }
    }
}

/// A candidate annotated with its relevance and ranking score.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    /// 0.0-1.0
    pub relevance: f64,
    /// relevance x bid x quality; only meaningful for ordering.
    pub composite: f64,
}

/// Externally computed embedding similarity, keyed by ad unit id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimilarityScores(HashMap<String, f64>);

impl SimilarityScores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, unit_id: impl Into<String>, similarity: f64) {
        self.0.insert(unit_id.into(), similarity.clamp(0.0, 1.0));
    }

    pub fn get(&self, unit_id: &str) -> Option<f64> {
        self.0.get(unit_id).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for SimilarityScores {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut scores = SimilarityScores::new();
        for (unit_id, similarity) in iter {
            scores.insert(unit_id, similarity);
        }
        scores
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    Filled,
    NoFill,
}

/// Which relevance signal a decision was scored with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Semantic,
    Taxonomy,
}

impl MatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchKind::Semantic => "semantic",
            MatchKind::Taxonomy => "taxonomy",
        }
    }
}

/// Lifecycle of a single decision. `Filled` and `NoFill` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStage {
    Received,
    Migrated,
    Filtered,
    Scored,
    Selected,
    Filled,
    NoFill,
}

impl DecisionStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DecisionStage::Filled | DecisionStage::NoFill)
    }
}

/// Per-candidate line of a decision record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredEntry {
    pub unit_id: String,
    pub campaign_id: String,
    pub relevance: f64,
    pub composite: f64,
    pub selected: bool,
}

/// Structured record of one decision, emitted to the decision log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub decision_id: Uuid,
    pub request_id: String,
    pub agent_id: String,
    pub node_id: String,
    pub placement_type: UnitType,
    pub surface: String,
    pub requested_taxonomy: String,
    pub effective_taxonomy: String,
    pub taxonomy_migrated: bool,
    pub match_kind: MatchKind,
    pub status: DecisionStatus,
    pub final_stage: DecisionStage,
    pub candidates_fetched: usize,
    pub candidates_eligible: usize,
    pub rejections: BTreeMap<String, usize>,
    pub scored: Vec<ScoredEntry>,
    pub latency_us: u64,
    pub timestamp: DateTime<Utc>,
}
