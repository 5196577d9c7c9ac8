//! OpenAPI document and Swagger UI configuration.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "AgentAds Decision API",
        version = "0.1.0",
        description = "Sponsored-unit decisions for conversational agents.\n\n\
            Matches an opportunity's intent taxonomy (or conversation text) against \
            active campaigns and returns ranked, disclosed units.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Decisions", description = "Ad decision endpoint"),
        (name = "Operations", description = "Health, readiness, and liveness probes"),
    ),
    paths(
        crate::rest::handle_decide,
        crate::rest::health_check,
        crate::rest::readiness,
        crate::rest::liveness,
    ),
    components(schemas(
        agentads_core::wire::DecideRequest,
        agentads_core::wire::Placement,
        agentads_core::wire::Opportunity,
        agentads_core::wire::OpportunityIntent,
        agentads_core::wire::OpportunityContext,
        agentads_core::wire::Constraints,
        agentads_core::wire::DecideResponse,
        agentads_core::wire::ResponseUnit,
        agentads_core::wire::UnitDisclosure,
        agentads_core::wire::UnitTracking,
        agentads_core::wire::Suggestion,
        agentads_core::wire::ScoreAnnotation,
        agentads_core::types::UnitType,
        agentads_core::types::DecisionStatus,
        crate::rest::ErrorResponse,
        crate::rest::HealthResponse,
    ))
)]
pub struct ApiDoc;
