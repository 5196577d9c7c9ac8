//! JSON wire format for the `/v1/decide` endpoint.

use crate::error::{DecisionError, DecisionResult};
use crate::types::{DecisionStatus, UnitType};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Inbound decide request, as received. Top-level required fields are
/// optional here so that validation can name every missing one.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DecideRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement: Option<Placement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opportunity: Option<Opportunity>,
    /// Free-text conversation context. Triggers semantic matching.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_intent: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Placement {
    #[serde(rename = "type")]
    pub unit_type: UnitType,
    #[serde(default)]
    pub surface: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Opportunity {
    pub intent: OpportunityIntent,
    pub context: OpportunityContext,
    #[serde(default)]
    pub constraints: Constraints,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OpportunityIntent {
    pub taxonomy: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OpportunityContext {
    pub country: String,
    pub language: String,
    pub platform: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct Constraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_units: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_unit_types: Vec<UnitType>,
}

/// A request that passed boundary validation.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    pub request_id: String,
    pub agent_id: String,
    pub placement: Placement,
    pub opportunity: Opportunity,
    pub context: Option<String>,
    pub user_intent: Option<String>,
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false)
}

impl DecideRequest {
    /// Check required fields. Every missing field is reported, not just the first.
    pub fn validate(self) -> DecisionResult<ValidatedRequest> {
        let mut missing = Vec::new();
        if !present(&self.request_id) {
            missing.push("request_id".to_string());
        }
        if !present(&self.agent_id) {
            missing.push("agent_id".to_string());
        }
        if self.placement.is_none() {
            missing.push("placement".to_string());
        }
        match &self.opportunity {
            None => missing.push("opportunity".to_string()),
            Some(opp) => {
                if opp.intent.taxonomy.trim().is_empty() {
                    missing.push("opportunity.intent.taxonomy".to_string());
                }
            }
        }

        match (self.request_id, self.agent_id, self.placement, self.opportunity) {
            (Some(request_id), Some(agent_id), Some(placement), Some(opportunity))
                if missing.is_empty() =>
            {
                Ok(ValidatedRequest {
                    request_id,
                    agent_id,
                    placement,
                    opportunity,
                    context: self.context,
                    user_intent: self.user_intent,
                })
            }
            _ => Err(DecisionError::Validation { missing }),
        }
    }
}

impl ValidatedRequest {
    /// Text to embed for semantic matching, if the caller sent any
    /// conversational signal. The structured query alone does not switch modes.
    pub fn semantic_text(&self) -> Option<String> {
        let parts: Vec<&str> = [self.user_intent.as_deref(), self.context.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if parts.is_empty() {
            return None;
        }
        let mut text = parts.join("\n");
        if let Some(query) = self.opportunity.intent.query.as_deref() {
            if !query.trim().is_empty() {
                text.push('\n');
                text.push_str(query.trim());
            }
        }
        Some(text)
    }

    pub fn taxonomy(&self) -> &str {
        &self.opportunity.intent.taxonomy
    }
}

/// Outbound decide response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DecideResponse {
    pub request_id: String,
    pub decision_id: String,
    pub status: DecisionStatus,
    pub ttl_ms: u64,
    pub units: Vec<ResponseUnit>,
    /// Set when the requested taxonomy was deprecated and rewritten.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxonomy_warning: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResponseUnit {
    pub unit_id: String,
    pub unit_type: UnitType,
    pub disclosure: UnitDisclosure,
    pub tracking: UnitTracking,
    pub suggestion: Suggestion,
    #[serde(rename = "_score")]
    pub score: ScoreAnnotation,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UnitDisclosure {
    pub label: String,
    pub explanation: String,
    pub sponsor_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UnitTracking {
    pub token: String,
    pub impression_url: String,
    pub click_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Suggestion {
    pub title: String,
    pub body: String,
    pub cta: String,
    pub action_url: String,
    pub tracking_url: String,
    pub tracked_url: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct ScoreAnnotation {
    pub relevance: f64,
    pub composite: f64,
    /// 1-indexed rank.
    pub position: u32,
}

impl DecideResponse {
    /// Create an empty response.
    pub fn no_fill(request_id: String, decision_id: String, ttl_ms: u64) -> Self {
        Self {
            request_id,
            decision_id,
            status: DecisionStatus::NoFill,
            ttl_ms,
            units: Vec::new(),
            taxonomy_warning: None,
        }
    }
}
