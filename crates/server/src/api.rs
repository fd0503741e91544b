//! HTTP API: recommendation and market endpoints, health probes and Prometheus metrics

use advisor_lib::{
    health::{ComponentStatus, HealthRegistry},
    AdvisorError, AdvisorMetrics, MarketService, RecommendationService, SoilWeatherSample,
    StructuredLogger,
};
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

/// Liveness message returned by `GET /`
pub const LIVENESS_MESSAGE: &str = "AgriGuru backend is running.";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub recommendations: RecommendationService,
    pub market: MarketService,
    pub health_registry: HealthRegistry,
    pub metrics: AdvisorMetrics,
    pub logger: StructuredLogger,
}

impl AppState {
    pub fn new(
        recommendations: RecommendationService,
        market: MarketService,
        health_registry: HealthRegistry,
        metrics: AdvisorMetrics,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            recommendations,
            market,
            health_registry,
            metrics,
            logger,
        }
    }

    /// Record a failed operation and convert it into a response error
    fn fail(&self, operation: &str, err: AdvisorError) -> ApiError {
        self.metrics.inc_failure(operation, err.kind());
        self.logger
            .log_failure(operation, err.kind(), &err.to_string(), err.is_client_error());
        ApiError(err)
    }
}

/// Error response with a stable `{"error": kind, "message": text}` body
#[derive(Debug)]
pub struct ApiError(pub AdvisorError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            AdvisorError::OutOfRange { .. } | AdvisorError::InvalidInput { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AdvisorError::NoData { .. } => StatusCode::NOT_FOUND,
            AdvisorError::SourceUnavailable(_) => StatusCode::BAD_GATEWAY,
            AdvisorError::Inference(_) | AdvisorError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.0.kind(),
            "message": self.0.to_string(),
        }));
        (self.status(), body).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct MarketQuery {
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub district: String,
}

async fn root() -> impl IntoResponse {
    Json(json!({ "message": LIVENESS_MESSAGE }))
}

/// Crop recommendation for a soil/weather sample
async fn predict(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SoilWeatherSample>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(sample) = payload.map_err(|rejection| {
        state.fail(
            "predict",
            AdvisorError::InvalidInput {
                field: "body",
                reason: rejection.body_text(),
            },
        )
    })?;

    let start = Instant::now();
    let service = state.recommendations.clone();
    let result = tokio::task::spawn_blocking(move || service.predict(&sample))
        .await
        .unwrap_or_else(|e| Err(AdvisorError::Internal(format!("prediction task failed: {}", e))));

    let elapsed = start.elapsed();
    state.health_registry.record_classifier(&result).await;
    let recommendation = result.map_err(|e| state.fail("predict", e))?;

    state.metrics.observe_prediction_latency(elapsed.as_secs_f64());
    state.metrics.inc_predictions_served();
    state.logger.log_prediction(
        &recommendation.recommended_crop,
        recommendation.confidence,
        state.recommendations.model_version(),
        elapsed.as_secs_f64() * 1000.0,
    );

    Ok(Json(recommendation).into_response())
}

/// Known crop labels in class order
async fn crops(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let crops = state
        .recommendations
        .list_crops()
        .map_err(|e| state.fail("list_crops", e))?;
    Ok(Json(json!({ "crops": crops })).into_response())
}

/// Top market prices for a state and district
async fn market_prices(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MarketQuery>,
) -> Result<Response, ApiError> {
    let start = Instant::now();
    let result = state.market.market_prices(&query.state, &query.district).await;
    state.health_registry.record_price_source(&result).await;

    let elapsed = start.elapsed();
    let prices = result.map_err(|e| state.fail("market_prices", e))?;

    state.metrics.observe_market_latency(elapsed.as_secs_f64());
    state.metrics.inc_market_queries_served();
    state.logger.log_market_query(
        &query.state,
        &query.district,
        prices.len(),
        elapsed.as_secs_f64() * 1000.0,
    );

    Ok(Json(json!({ "prices": prices })).into_response())
}

/// Health check response - returns 200 if healthy or degraded, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/predict", post(predict))
        .route("/crops", get(crops))
        .route("/market_prices", get(market_prices))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        // The browser front end is served from another origin
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
