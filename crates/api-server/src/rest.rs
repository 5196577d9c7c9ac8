//! REST API handlers for ad decisions and operational endpoints.

use agentads_core::error::DecisionError;
use agentads_core::wire::{DecideRequest, DecideResponse};
use agentads_engine::DecisionService;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, warn};
use utoipa::ToSchema;

/// Carries the taxonomy deprecation warning when the request was auto-migrated.
pub const TAXONOMY_DEPRECATION_HEADER: HeaderName =
    HeaderName::from_static("x-taxonomy-deprecation");

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<DecisionService>,
    pub node_id: String,
    pub start_time: Instant,
}

/// POST /v1/decide: Ask for sponsored units for one conversational opportunity.
#[utoipa::path(
    post,
    path = "/v1/decide",
    tag = "Decisions",
    request_body = DecideRequest,
    responses(
        (status = 200, description = "Decision made (filled or no_fill)", body = DecideResponse,
            headers(("x-taxonomy-deprecation" = String,
                description = "Set when the requested taxonomy was migrated"))),
        (status = 400, description = "Malformed JSON or missing required fields",
            body = ErrorResponse),
        (status = 500, description = "Internal error", body = ErrorResponse),
    )
)]
pub async fn handle_decide(State(state): State<AppState>, body: Bytes) -> Response {
    let request: DecideRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "Decide request is not valid JSON");
            metrics::counter!("api.invalid_json").increment(1);
            return ErrorResponse::new("invalid_json", e.to_string())
                .with_status(StatusCode::BAD_REQUEST);
        }
    };

    match state.service.decide(request).await {
        Ok(outcome) => {
            let warning = outcome.warning().map(str::to_owned);
            let mut response = Json(outcome.response).into_response();
            if let Some(value) = warning.and_then(|w| HeaderValue::from_str(&w).ok()) {
                response
                    .headers_mut()
                    .insert(TAXONOMY_DEPRECATION_HEADER, value);
            }
            response
        }
        Err(e) if e.is_client_error() => {
            let missing_fields = match &e {
                DecisionError::Validation { missing } => missing.clone(),
                _ => Vec::new(),
            };
            ErrorResponse {
                error: "invalid_request".to_string(),
                message: e.to_string(),
                missing_fields,
            }
            .with_status(StatusCode::BAD_REQUEST)
        }
        Err(e) => {
            error!(error = %e, "Decision failed");
            metrics::counter!("api.errors").increment(1);
            ErrorResponse::new("decision_failed", "Internal processing error")
                .with_status(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /health: Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Operations",
    responses((status = 200, description = "Service is healthy", body = HealthResponse))
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        node_id: state.node_id.clone(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET /ready: Readiness probe.
/// The engine is built before the router, so a serving node is ready.
#[utoipa::path(
    get,
    path = "/ready",
    tag = "Operations",
    responses((status = 200, description = "Ready to accept traffic"))
)]
pub async fn readiness() -> StatusCode {
    StatusCode::OK
}

/// GET /live: Liveness probe.
#[utoipa::path(
    get,
    path = "/live",
    tag = "Operations",
    responses((status = 200, description = "Process is alive"))
)]
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_fields: Vec<String>,
}

impl ErrorResponse {
    pub fn new(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
            missing_fields: Vec::new(),
        }
    }

    fn with_status(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub node_id: String,
    pub uptime_secs: u64,
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        self.with_status(StatusCode::INTERNAL_SERVER_ERROR)
    }
}
