//! Hard eligibility rules. A candidate must pass all of them; there is no
//! partial credit and no scoring here.

use agentads_core::types::{Candidate, UnitType};
use agentads_core::wire::ValidatedRequest;
use std::collections::BTreeMap;
use tracing::debug;

/// Why a candidate was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Ineligibility {
    CampaignInactive,
    UnitTypeMismatch,
    UnitTypeNotAllowed,
    CountryNotTargeted,
    LanguageNotTargeted,
    PlatformNotTargeted,
    BudgetExhausted,
}

impl Ineligibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ineligibility::CampaignInactive => "campaign_inactive",
            Ineligibility::UnitTypeMismatch => "unit_type_mismatch",
            Ineligibility::UnitTypeNotAllowed => "unit_type_not_allowed",
            Ineligibility::CountryNotTargeted => "country_not_targeted",
            Ineligibility::LanguageNotTargeted => "language_not_targeted",
            Ineligibility::PlatformNotTargeted => "platform_not_targeted",
            Ineligibility::BudgetExhausted => "budget_exhausted",
        }
    }
}

/// The parts of a request that eligibility depends on.
#[derive(Debug, Clone, Copy)]
pub struct EligibilityContext<'a> {
    pub placement: UnitType,
    pub allowed_unit_types: &'a [UnitType],
    pub country: &'a str,
    pub language: &'a str,
    pub platform: &'a str,
}

impl<'a> EligibilityContext<'a> {
    pub fn from_request(request: &'a ValidatedRequest) -> Self {
        let opp = &request.opportunity;
        Self {
            placement: request.placement.unit_type,
            allowed_unit_types: &opp.constraints.allowed_unit_types,
            country: &opp.context.country,
            language: &opp.context.language,
            platform: &opp.context.platform,
        }
    }
}

#[derive(Debug, Default)]
pub struct FilterOutcome {
    /// Survivors, in their original order.
    pub eligible: Vec<Candidate>,
    pub rejections: BTreeMap<Ineligibility, usize>,
}

impl FilterOutcome {
    pub fn rejected(&self) -> usize {
        self.rejections.values().sum()
    }

    /// Rejection counts keyed by reason name, for logging.
    pub fn rejection_summary(&self) -> BTreeMap<String, usize> {
        self.rejections
            .iter()
            .map(|(reason, count)| (reason.as_str().to_string(), *count))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CandidateFilter;

impl CandidateFilter {
    pub fn new() -> Self {
        Self
    }

    /// Check one candidate. Reports the first failing rule; since the rules
    /// are conjunctive the order only affects which reason is reported.
    pub fn check(
        &self,
        candidate: &Candidate,
        ctx: &EligibilityContext<'_>,
    ) -> Result<(), Ineligibility> {
        let campaign = &candidate.campaign;
        if !campaign.is_active() {
            return Err(Ineligibility::CampaignInactive);
        }
        if candidate.unit.unit_type != ctx.placement {
            return Err(Ineligibility::UnitTypeMismatch);
        }
        if !ctx.allowed_unit_types.is_empty()
            && !ctx.allowed_unit_types.contains(&candidate.unit.unit_type)
        {
            return Err(Ineligibility::UnitTypeNotAllowed);
        }
        if !campaign.targeting.allows_country(ctx.country) {
            return Err(Ineligibility::CountryNotTargeted);
        }
        if !campaign.targeting.allows_language(ctx.language) {
            return Err(Ineligibility::LanguageNotTargeted);
        }
        if !campaign.targeting.allows_platform(ctx.platform) {
            return Err(Ineligibility::PlatformNotTargeted);
        }
        if !campaign.budget.has_remaining() {
            return Err(Ineligibility::BudgetExhausted);
        }
        Ok(())
    }

    pub fn filter(
        &self,
        candidates: Vec<Candidate>,
        ctx: &EligibilityContext<'_>,
    ) -> FilterOutcome {
        let mut outcome = FilterOutcome {
            eligible: Vec::with_capacity(candidates.len()),
            rejections: BTreeMap::new(),
        };
        for candidate in candidates {
            match self.check(&candidate, ctx) {
                Ok(()) => outcome.eligible.push(candidate),
                Err(reason) => {
                    debug!(
                        unit_id = %candidate.unit.id,
                        campaign_id = %candidate.campaign.id,
                        reason = reason.as_str(),
                        "Candidate ineligible"
                    );
                    *outcome.rejections.entry(reason).or_insert(0) += 1;
                }
            }
        }
        outcome
    }
}
