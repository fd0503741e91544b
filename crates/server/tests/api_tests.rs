//! Integration tests for the server API endpoints

use advisor_lib::{
    health::{components, HealthRegistry},
    market::PriceSource,
    predictor::Classifier,
    AdvisorError, AdvisorMetrics, MarketRecord, MarketService, RecommendationService,
    StructuredLogger, NUM_FEATURES,
};
use agriguru_server::api::{create_router, AppState, LIVENESS_MESSAGE};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct FixtureClassifier {
    labels: Vec<String>,
    probabilities: Vec<f32>,
}

impl Classifier for FixtureClassifier {
    fn predict_probabilities(
        &self,
        _features: &[f32; NUM_FEATURES],
    ) -> advisor_lib::Result<Vec<f32>> {
        Ok(self.probabilities.clone())
    }

    fn class_labels(&self) -> &[String] {
        &self.labels
    }
}

struct FixtureSource {
    result: advisor_lib::Result<Vec<MarketRecord>>,
}

#[async_trait]
impl PriceSource for FixtureSource {
    async fn fetch_records(
        &self,
        _state: &str,
        _district: &str,
    ) -> advisor_lib::Result<Vec<MarketRecord>> {
        self.result.clone()
    }
}

fn record(crop: &str, market: &str, price: f64) -> MarketRecord {
    MarketRecord {
        crop: crop.to_string(),
        market: market.to_string(),
        modal_price: Some(price),
    }
}

fn default_classifier() -> FixtureClassifier {
    FixtureClassifier {
        labels: ["rice", "maize", "chickpea", "coffee"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        probabilities: vec![0.62, 0.08, 0.1, 0.2],
    }
}

async fn setup_app(
    classifier: FixtureClassifier,
    source: advisor_lib::Result<Vec<MarketRecord>>,
) -> (Router, Arc<AppState>) {
    let health_registry = HealthRegistry::new();
    health_registry.register(components::CLASSIFIER).await;
    health_registry.register(components::PRICE_SOURCE).await;

    let state = Arc::new(AppState::new(
        RecommendationService::new(Arc::new(classifier)),
        MarketService::new(Arc::new(FixtureSource { result: source })),
        health_registry,
        AdvisorMetrics::new(),
        StructuredLogger::new("test"),
    ));
    let router = create_router(state.clone());

    (router, state)
}

async fn setup_test_app() -> (Router, Arc<AppState>) {
    let records = vec![
        record("Wheat", "Khanna", 10000.0),
        record("Wheat", "Jagraon", 50000.0),
        record("Rice", "Karnal", 8000.0),
    ];
    setup_app(default_classifier(), Ok(records)).await
}

fn valid_sample() -> Value {
    json!({
        "N": 90, "P": 42, "K": 43,
        "temperature": 20.8, "humidity": 82.0, "ph": 6.5, "rainfall": 202.9
    })
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_root_returns_liveness_message() {
    let (app, _state) = setup_test_app().await;

    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["message"], LIVENESS_MESSAGE);
}

#[tokio::test]
async fn test_predict_returns_ranked_recommendation() {
    let (app, _state) = setup_test_app().await;

    let response = app.oneshot(post_json("/predict", &valid_sample())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["recommended_crop"], "rice");
    assert_eq!(body["confidence"], 0.62);

    let ranking = body["ranking"].as_array().unwrap();
    assert_eq!(ranking.len(), 4);
    assert_eq!(ranking[0]["crop"], body["recommended_crop"]);
    assert_eq!(ranking[0]["probability"], body["confidence"]);
    let crops: Vec<_> = ranking.iter().map(|r| r["crop"].as_str().unwrap()).collect();
    assert_eq!(crops, vec!["rice", "coffee", "chickpea", "maize"]);

    let sum: f64 = ranking.iter().map(|r| r["probability"].as_f64().unwrap()).sum();
    assert!((sum - 1.0).abs() <= 0.01);
}

#[tokio::test]
async fn test_predict_is_idempotent() {
    let (app, _state) = setup_test_app().await;

    let first = app
        .clone()
        .oneshot(post_json("/predict", &valid_sample()))
        .await
        .unwrap();
    let second = app.oneshot(post_json("/predict", &valid_sample())).await.unwrap();

    assert_eq!(body_json(first).await, body_json(second).await);
}

#[tokio::test]
async fn test_predict_out_of_range_is_validation_error() {
    let (app, _state) = setup_test_app().await;

    let mut sample = valid_sample();
    sample["rainfall"] = json!(450.0);

    let response = app.oneshot(post_json("/predict", &sample)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_json(response).await;
    assert_eq!(body["error"], "validation_error");
    assert!(body["message"].as_str().unwrap().contains("rainfall"));
}

#[tokio::test]
async fn test_predict_non_numeric_field_rejected() {
    let (app, _state) = setup_test_app().await;

    let mut sample = valid_sample();
    sample["ph"] = json!("acidic");

    let response = app.oneshot(post_json("/predict", &sample)).await.unwrap();
    assert!(response.status().is_client_error());

    let body = body_json(response).await;
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_predict_malformed_model_output_is_server_error() {
    let classifier = FixtureClassifier {
        labels: vec!["rice".to_string(), "maize".to_string()],
        probabilities: vec![0.9],
    };
    let (app, state) = setup_app(classifier, Ok(vec![])).await;
    state.health_registry.set_ready(true).await;

    let response = app
        .clone()
        .oneshot(post_json("/predict", &valid_sample()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_json(response).await;
    assert_eq!(body["error"], "inference_error");
    assert!(body["message"].is_string());

    // A broken model takes the instance out of rotation
    let response = app.clone().oneshot(get("/readyz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = app.oneshot(get("/healthz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        body_json(response).await["components"]["classifier"]["status"],
        "unhealthy"
    );
}

#[tokio::test]
async fn test_predict_validation_error_keeps_classifier_healthy() {
    let (app, _state) = setup_test_app().await;

    let mut sample = valid_sample();
    sample["ph"] = json!(12.0);
    let response = app
        .clone()
        .oneshot(post_json("/predict", &sample))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app.oneshot(get("/healthz")).await.unwrap();
    assert_eq!(
        body_json(response).await["components"]["classifier"]["status"],
        "healthy"
    );
}

#[tokio::test]
async fn test_crops_lists_class_labels_in_order() {
    let (app, _state) = setup_test_app().await;

    let response = app.oneshot(get("/crops")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["crops"], json!(["rice", "maize", "chickpea", "coffee"]));
}

#[tokio::test]
async fn test_market_prices_first_seen_and_sorted() {
    let (app, _state) = setup_test_app().await;

    let response = app
        .oneshot(get("/market_prices?state=Punjab&district=Ludhiana"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let prices = body["prices"].as_array().unwrap();
    assert_eq!(prices.len(), 2);
    assert_eq!(prices[0], json!({"crop": "Wheat", "market": "Khanna", "price": "100.00/kg"}));
    assert_eq!(prices[1], json!({"crop": "Rice", "market": "Karnal", "price": "80.00/kg"}));
}

#[tokio::test]
async fn test_market_prices_bounded_to_five() {
    let records = (1..=9)
        .map(|i| record(&format!("crop{}", i), "Azadpur", i as f64 * 1000.0))
        .collect();
    let (app, _state) = setup_app(default_classifier(), Ok(records)).await;

    let response = app
        .oneshot(get("/market_prices?state=Delhi&district=North%20Delhi"))
        .await
        .unwrap();
    let body = body_json(response).await;
    let prices = body["prices"].as_array().unwrap();

    assert_eq!(prices.len(), 5);
    assert_eq!(prices[0]["crop"], "crop9");
    assert_eq!(prices[4]["crop"], "crop5");
}

#[tokio::test]
async fn test_market_prices_no_data_is_404() {
    let no_data = Err(AdvisorError::NoData {
        state: "Goa".to_string(),
        district: "North Goa".to_string(),
    });
    let (app, _state) = setup_app(default_classifier(), no_data).await;

    let response = app
        .oneshot(get("/market_prices?state=Goa&district=North%20Goa"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "no_data");
}

#[tokio::test]
async fn test_market_prices_upstream_failure_is_502_and_degrades_health() {
    let unavailable = Err(AdvisorError::SourceUnavailable("upstream returned 503".to_string()));
    let (app, _state) = setup_app(default_classifier(), unavailable).await;

    let response = app
        .clone()
        .oneshot(get("/market_prices?state=Punjab&district=Ludhiana"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["error"], "source_unavailable");

    let response = app.oneshot(get("/healthz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let health = body_json(response).await;
    assert_eq!(health["status"], "degraded");
    assert_eq!(health["components"]["price_source"]["status"], "degraded");
}

#[tokio::test]
async fn test_market_prices_missing_district_is_validation_error() {
    let (app, _state) = setup_test_app().await;

    let response = app.oneshot(get("/market_prices?state=Punjab")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["error"], "validation_error");
}

#[tokio::test]
async fn test_healthz_includes_component_details() {
    let (app, _state) = setup_test_app().await;

    let response = app.oneshot(get("/healthz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let health = body_json(response).await;
    assert_eq!(health["status"], "healthy");
    assert!(health["components"]["classifier"].is_object());
    assert!(health["components"]["price_source"].is_object());
}

#[tokio::test]
async fn test_readyz_returns_503_until_ready() {
    let (app, state) = setup_test_app().await;

    let response = app.clone().oneshot(get("/readyz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["ready"], false);

    state.health_registry.set_ready(true).await;

    let response = app.oneshot(get("/readyz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["ready"], true);
}

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    let (app, state) = setup_test_app().await;

    state.metrics.observe_prediction_latency(0.002);
    state.metrics.observe_market_latency(0.3);
    state.metrics.set_model_info("crop_model", 4);

    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().contains("text/plain"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let metrics_text = String::from_utf8(body.to_vec()).unwrap();

    assert!(metrics_text.contains("agriguru_prediction_latency_seconds_bucket"));
    assert!(metrics_text.contains("agriguru_market_latency_seconds_count"));
    assert!(metrics_text.contains("agriguru_model_info"));
}
