//! Observability infrastructure for the advisor service
//!
//! Provides:
//! - Prometheus metrics (prediction latency, market query latency, outcome counters, model info)
//! - Structured JSON logging events with tracing

use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_counter_vec,
    GaugeVec, Histogram, IntCounter, IntCounterVec,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for model inference latency (seconds)
const PREDICTION_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25,
];

/// Histogram buckets for outbound price queries (seconds)
const MARKET_BUCKETS: &[f64] = &[0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<AdvisorMetricsInner> = OnceLock::new();

struct AdvisorMetricsInner {
    prediction_latency_seconds: Histogram,
    market_latency_seconds: Histogram,
    predictions_served: IntCounter,
    market_queries_served: IntCounter,
    request_failures: IntCounterVec,
    model_info: GaugeVec,
}

impl AdvisorMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "agriguru_prediction_latency_seconds",
                "Time spent validating, classifying and ranking a sample",
                PREDICTION_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            market_latency_seconds: register_histogram!(
                "agriguru_market_latency_seconds",
                "Time spent fetching and ranking market prices",
                MARKET_BUCKETS.to_vec()
            )
            .expect("Failed to register market_latency_seconds"),

            predictions_served: register_int_counter!(
                "agriguru_predictions_served_total",
                "Total number of crop recommendations returned"
            )
            .expect("Failed to register predictions_served"),

            market_queries_served: register_int_counter!(
                "agriguru_market_queries_served_total",
                "Total number of market price results returned"
            )
            .expect("Failed to register market_queries_served"),

            request_failures: register_int_counter_vec!(
                "agriguru_request_failures_total",
                "Failed requests by operation and error kind",
                &["operation", "kind"]
            )
            .expect("Failed to register request_failures"),

            model_info: register_gauge_vec!(
                "agriguru_model_info",
                "Information about the loaded crop classifier",
                &["version", "classes"]
            )
            .expect("Failed to register model_info"),
        }
    }
}

/// Advisor metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Clone)]
pub struct AdvisorMetrics {
    _private: (),
}

impl Default for AdvisorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl AdvisorMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(AdvisorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &AdvisorMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    pub fn observe_market_latency(&self, duration_secs: f64) {
        self.inner().market_latency_seconds.observe(duration_secs);
    }

    pub fn inc_predictions_served(&self) {
        self.inner().predictions_served.inc();
    }

    pub fn inc_market_queries_served(&self) {
        self.inner().market_queries_served.inc();
    }

    /// Count a failed request by operation and error kind
    pub fn inc_failure(&self, operation: &str, kind: &str) {
        self.inner()
            .request_failures
            .with_label_values(&[operation, kind])
            .inc();
    }

    /// Publish the loaded model's version and class count
    pub fn set_model_info(&self, version: &str, classes: usize) {
        self.inner().model_info.reset();
        self.inner()
            .model_info
            .with_label_values(&[version, &classes.to_string()])
            .set(1.0);
    }
}

/// Structured logger for service events
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn log_startup(&self, version: &str, model_version: &str, classes: usize) {
        info!(
            event = "service_started",
            instance = %self.instance,
            service_version = %version,
            model_version = %model_version,
            classes = classes,
            "AgriGuru advisor started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            instance = %self.instance,
            reason = %reason,
            "AgriGuru advisor shutting down"
        );
    }

    pub fn log_prediction(
        &self,
        crop: &str,
        confidence: f64,
        model_version: &str,
        elapsed_ms: f64,
    ) {
        info!(
            event = "prediction_served",
            instance = %self.instance,
            crop = %crop,
            confidence = confidence,
            model_version = %model_version,
            elapsed_ms = elapsed_ms,
            "Crop recommendation served"
        );
    }

    pub fn log_market_query(&self, state: &str, district: &str, returned: usize, elapsed_ms: f64) {
        info!(
            event = "market_query_served",
            instance = %self.instance,
            state = %state,
            district = %district,
            returned = returned,
            elapsed_ms = elapsed_ms,
            "Market prices served"
        );
    }

    /// Log a failed request; client errors at info, server errors at warn
    pub fn log_failure(&self, operation: &str, kind: &str, message: &str, client_error: bool) {
        if client_error {
            info!(
                event = "request_failed",
                instance = %self.instance,
                operation = %operation,
                kind = %kind,
                message = %message,
                "Request rejected"
            );
        } else {
            warn!(
                event = "request_failed",
                instance = %self.instance,
                operation = %operation,
                kind = %kind,
                message = %message,
                "Request failed"
            );
        }
    }
}
