//! Integration test for the full decide request/response flow.
//! Runs the HTTP router in-process against the sample seed file; no external services.

use agentads_api::{router, AppState};
use agentads_core::collaborators::{capture_sink, CaptureSink, NoSimilarity};
use agentads_core::config::AppConfig;
use agentads_engine::{DecisionEngine, DecisionService, InMemoryCandidateStore};
use axum::body::{to_bytes, Body};
use axum::http::header::CONTENT_TYPE;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceExt;

const BODY_LIMIT: usize = 1_048_576;
const SEED_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/seed.json");

fn build_app() -> (Router, Arc<CaptureSink>) {
    let mut config = AppConfig::default();
    config.tracking.base_url = "https://ads.example.com".to_string();

    let store = Arc::new(InMemoryCandidateStore::load(SEED_PATH).expect("seed file"));
    let engine = Arc::new(DecisionEngine::from_config(&config).expect("engine"));
    let sink = capture_sink();
    let service = DecisionService::new(engine, store, Arc::new(NoSimilarity), sink.clone());

    let state = AppState {
        service: Arc::new(service),
        node_id: config.node_id.clone(),
        start_time: Instant::now(),
    };
    (router(state), sink)
}

fn decide_request(body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/decide")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .expect("build request")
}

fn opportunity(taxonomy: &str) -> Value {
    json!({
        "request_id": "req-int-001",
        "agent_id": "agent-travel-bot",
        "placement": { "type": "sponsored_suggestion", "surface": "chat" },
        "opportunity": {
            "intent": { "taxonomy": taxonomy },
            "context": { "country": "US", "language": "en", "platform": "web" }
        }
    })
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}

#[tokio::test]
async fn test_decide_ranks_by_taxonomy_relevance() {
    let (app, sink) = build_app();
    let body = opportunity("insurance.auto.full_coverage.quote").to_string();

    let response = app.oneshot(decide_request(body)).await.expect("router call");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("x-taxonomy-deprecation").is_none());

    let json = json_body(response).await;
    assert_eq!(json["request_id"], "req-int-001");
    assert_eq!(json["status"], "filled");
    assert_eq!(json["ttl_ms"], 60_000);
    assert!(json.get("taxonomy_warning").is_none());

    let units = json["units"].as_array().expect("units array");
    let ids: Vec<&str> = units.iter().map(|u| u["unit_id"].as_str().unwrap_or("")).collect();
    // Family law is off-topic and the spent campaign is out of budget.
    // The tool unit has the wrong placement type.
    assert_eq!(ids, vec!["unit-acme-quote", "unit-shield-bundle"]);

    let first = &units[0];
    assert_eq!(first["_score"]["relevance"], 0.9);
    assert_eq!(first["_score"]["position"], 1);
    assert_eq!(first["disclosure"]["label"], "Sponsored");
    assert_eq!(first["disclosure"]["sponsor_name"], "Acme Insurance");

    let token = first["tracking"]["token"].as_str().expect("token");
    assert_eq!(
        first["tracking"]["click_url"],
        format!("https://ads.example.com/v1/click/{}", token)
    );
    assert_eq!(
        first["tracking"]["impression_url"],
        format!("https://ads.example.com/v1/events/impression?token={}", token)
    );
    assert_eq!(first["suggestion"]["action_url"], "https://acme.example/auto/quote");

    assert_eq!(units[1]["disclosure"]["label"], "Ad");
    assert_eq!(units[1]["_score"]["relevance"], 0.5);

    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].candidates_fetched, 5);
    assert_eq!(records[0].candidates_eligible, 4);
    assert_eq!(records[0].rejections.get("budget_exhausted"), Some(&1));
}

#[tokio::test]
async fn test_decide_migrates_deprecated_taxonomy() {
    let (app, sink) = build_app();
    let body = opportunity("shopping.ecommerce.platform").to_string();

    let response = app.oneshot(decide_request(body)).await.expect("router call");
    assert_eq!(response.status(), StatusCode::OK);
    let header = response
        .headers()
        .get("x-taxonomy-deprecation")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .expect("deprecation header");
    assert!(header.contains("business.ecommerce.platform.trial"));

    let json = json_body(response).await;
    assert_eq!(json["status"], "filled");
    assert_eq!(json["taxonomy_warning"], header.as_str());
    assert_eq!(json["units"][0]["unit_id"], "unit-shopkit-trial");
    assert_eq!(json["units"][0]["_score"]["relevance"], 1.0);

    let record = &sink.records()[0];
    assert!(record.taxonomy_migrated);
    assert_eq!(record.effective_taxonomy, "business.ecommerce.platform.trial");
}

#[tokio::test]
async fn test_decide_is_deterministic_for_identical_input() {
    let (app, _) = build_app();
    let mut orders = Vec::new();
    for _ in 0..3 {
        let body = opportunity("insurance.auto.full_coverage.quote").to_string();
        let response = app
            .clone()
            .oneshot(decide_request(body))
            .await
            .expect("router call");
        let json = json_body(response).await;
        let ids: Vec<String> = json["units"]
            .as_array()
            .expect("units array")
            .iter()
            .map(|u| u["unit_id"].as_str().unwrap_or("").to_string())
            .collect();
        orders.push(ids);
    }
    assert!(orders.windows(2).all(|w| w[0] == w[1]));
}

#[tokio::test]
async fn test_decide_no_fill_is_success() {
    let (app, _) = build_app();
    let body = opportunity("travel.flights.international.book").to_string();

    let response = app.oneshot(decide_request(body)).await.expect("router call");
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "no_fill");
    assert_eq!(json["units"], json!([]));
    assert!(json["decision_id"].as_str().is_some_and(|id| !id.is_empty()));
}

#[tokio::test]
async fn test_decide_respects_max_units_constraint() {
    let (app, _) = build_app();
    let mut request = opportunity("insurance.auto.full_coverage.quote");
    request["opportunity"]["constraints"] = json!({ "max_units": 1 });

    let response = app
        .oneshot(decide_request(request.to_string()))
        .await
        .expect("router call");
    let json = json_body(response).await;
    assert_eq!(json["units"].as_array().map(Vec::len), Some(1));
    assert_eq!(json["units"][0]["unit_id"], "unit-acme-quote");
}

#[tokio::test]
async fn test_decide_zero_max_units_is_no_fill() {
    let (app, sink) = build_app();
    let mut request = opportunity("insurance.auto.full_coverage.quote");
    request["opportunity"]["constraints"] = json!({ "max_units": 0 });

    let response = app
        .oneshot(decide_request(request.to_string()))
        .await
        .expect("router call");
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "no_fill");
    assert_eq!(json["units"], json!([]));
    assert_eq!(sink.count(), 1);
}

#[tokio::test]
async fn test_decide_lists_missing_fields() {
    let (app, sink) = build_app();
    let body =
        json!({ "placement": { "type": "sponsored_suggestion", "surface": "chat" } }).to_string();

    let response = app.oneshot(decide_request(body)).await.expect("router call");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"], "invalid_request");
    assert_eq!(
        json["missing_fields"],
        json!(["request_id", "agent_id", "opportunity"])
    );
    assert_eq!(sink.count(), 0);
}

#[tokio::test]
async fn test_decide_rejects_malformed_json() {
    let (app, _) = build_app();
    let response = app
        .oneshot(decide_request("{ not json".to_string()))
        .await
        .expect("router call");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"], "invalid_json");
}

#[tokio::test]
async fn test_health_reports_node() {
    let (app, _) = build_app();
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .expect("build request");
    let response = app.oneshot(request).await.expect("router call");
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["node_id"], "node-01");
}
