//! Builders shared by the unit tests in this crate.

use agentads_core::taxonomy::TaxonomyTarget;
use agentads_core::types::{
    AdUnit, Bid, BudgetSnapshot, Campaign, CampaignStatus, Candidate, Creative, Disclosure,
    Targeting, UnitStatus, UnitType,
};
use agentads_core::wire::{
    Constraints, DecideRequest, Opportunity, OpportunityContext, OpportunityIntent, Placement,
    ValidatedRequest,
};
use std::sync::Arc;

pub fn make_campaign(id: &str, taxonomies: &[&str]) -> Campaign {
    Campaign {
        id: id.to_string(),
        advertiser_id: format!("adv-{}", id),
        taxonomies: taxonomies
            .iter()
            .map(|t| TaxonomyTarget::parse(t).expect("test taxonomy"))
            .collect(),
        targeting: Targeting::default(),
        budget: BudgetSnapshot::new(10_000, 0),
        bid: Bid::cpc(1.0),
        quality_score: None,
        status: CampaignStatus::Active,
    }
}

pub fn make_unit(id: &str, campaign_id: &str, unit_type: UnitType) -> AdUnit {
    AdUnit {
        id: id.to_string(),
        campaign_id: campaign_id.to_string(),
        unit_type,
        creative: Creative {
            title: format!("Title {}", id),
            body: "Body".into(),
            cta: "Learn more".into(),
            action_url: format!("https://example.com/{}", id),
        },
        disclosure: Disclosure {
            sponsor_name: "Acme".into(),
            label: None,
        },
        status: UnitStatus::Active,
        embedding: None,
    }
}

pub fn make_candidate(unit_id: &str, campaign: Campaign) -> Candidate {
    let unit = make_unit(unit_id, &campaign.id, UnitType::SponsoredSuggestion);
    Candidate::new(unit, Arc::new(campaign))
}

pub fn make_request(taxonomy: &str) -> ValidatedRequest {
    DecideRequest {
        request_id: Some("req-1".into()),
        agent_id: Some("agent-1".into()),
        placement: Some(Placement {
            unit_type: UnitType::SponsoredSuggestion,
            surface: "chat".into(),
        }),
        opportunity: Some(Opportunity {
            intent: OpportunityIntent {
                taxonomy: taxonomy.into(),
                query: None,
            },
            context: OpportunityContext {
                country: "US".into(),
                language: "en".into(),
                platform: "web".into(),
                region: None,
                city: None,
            },
            constraints: Constraints::default(),
        }),
        context: None,
        user_intent: None,
    }
    .validate()
    .expect("valid test request")
}
