//! Turns selected candidates into wire response units, issuing a fresh
//! tracking token per unit.

use agentads_core::config::{DecisionConfig, TrackingConfig};
use agentads_core::error::{DecisionError, DecisionResult};
use agentads_core::types::{MatchKind, ScoredCandidate};
use agentads_core::wire::{ResponseUnit, ScoreAnnotation, Suggestion, UnitDisclosure, UnitTracking};
use url::Url;
use uuid::Uuid;

/// Builds impression / click URLs under a base URL.
#[derive(Debug, Clone)]
pub struct TrackingUrls {
    base: Url,
}

impl TrackingUrls {
    pub fn new(base_url: &str) -> DecisionResult<Self> {
        let mut base = Url::parse(base_url).map_err(|e| {
            DecisionError::Config(format!("invalid tracking base_url '{}': {}", base_url, e))
        })?;
        if base.cannot_be_a_base() {
            return Err(DecisionError::Config(format!(
                "tracking base_url '{}' cannot be a base",
                base_url
            )));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { base })
    }

    fn join(&self, path: &str) -> Url {
        // Relative join onto a base that ends in '/' with a path of plain segments.
        self.base.join(path).unwrap_or_else(|_| self.base.clone())
    }

    pub fn impression_url(&self, token: &str) -> String {
        let mut url = self.join("v1/events/impression");
        url.query_pairs_mut().append_pair("token", token);
        url.to_string()
    }

    pub fn click_url(&self, token: &str) -> String {
        self.join(&format!("v1/click/{}", token)).to_string()
    }

    /// Click URL that redirects on to the advertiser's landing page.
    pub fn tracked_url(&self, token: &str, action_url: &str) -> String {
        let mut url = self.join(&format!("v1/click/{}", token));
        url.query_pairs_mut().append_pair("redirect", action_url);
        url.to_string()
    }
}

#[derive(Debug, Clone)]
pub struct ResponsePackager {
    urls: TrackingUrls,
    default_label: String,
}

impl ResponsePackager {
    pub fn new(tracking: &TrackingConfig, decision: &DecisionConfig) -> DecisionResult<Self> {
        Ok(Self {
            urls: TrackingUrls::new(&tracking.base_url)?,
            default_label: decision.disclosure_label.clone(),
        })
    }

    /// Package ranked candidates. Positions are 1-indexed in input order.
    pub fn package(
        &self,
        selected: &[ScoredCandidate],
        kind: MatchKind,
        taxonomy: &str,
    ) -> Vec<ResponseUnit> {
        selected
            .iter()
            .enumerate()
            .map(|(i, scored)| self.package_unit(scored, (i + 1) as u32, kind, taxonomy))
            .collect()
    }

    fn package_unit(
        &self,
        scored: &ScoredCandidate,
        position: u32,
        kind: MatchKind,
        taxonomy: &str,
    ) -> ResponseUnit {
        let unit = &scored.candidate.unit;
        let token = Uuid::new_v4().to_string();
        let click_url = self.urls.click_url(&token);

        ResponseUnit {
            unit_id: unit.id.clone(),
            unit_type: unit.unit_type,
            disclosure: UnitDisclosure {
                label: unit
                    .disclosure
                    .label
                    .clone()
                    .unwrap_or_else(|| self.default_label.clone()),
                explanation: explanation(&unit.disclosure.sponsor_name, kind, taxonomy),
                sponsor_name: unit.disclosure.sponsor_name.clone(),
            },
            tracking: UnitTracking {
                impression_url: self.urls.impression_url(&token),
                click_url: click_url.clone(),
                token: token.clone(),
            },
            suggestion: Suggestion {
                title: unit.creative.title.clone(),
                body: unit.creative.body.clone(),
                cta: unit.creative.cta.clone(),
                action_url: unit.creative.action_url.clone(),
                tracking_url: click_url,
                tracked_url: self.urls.tracked_url(&token, &unit.creative.action_url),
            },
            score: ScoreAnnotation {
                relevance: scored.relevance,
                composite: scored.composite,
                position,
            },
        }
    }
}

fn explanation(sponsor: &str, kind: MatchKind, taxonomy: &str) -> String {
    match kind {
        MatchKind::Semantic => format!(
            "Sponsored by {}. Shown because it is relevant to your conversation.",
            sponsor
        ),
        MatchKind::Taxonomy => format!(
            "Sponsored by {}. Shown because it matches the topic '{}'.",
            sponsor, taxonomy
        ),
    }
}
