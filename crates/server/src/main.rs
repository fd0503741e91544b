//! AgriGuru advisor server
//!
//! Loads the crop classifier once at startup and serves crop
//! recommendations and market prices over HTTP.

use advisor_lib::{
    health::{components, HealthRegistry},
    market::DataGovClient,
    predictor::{Classifier, OnnxClassifier},
    AdvisorMetrics, MarketService, RecommendationService, StructuredLogger,
};
use agriguru_server::{api, config::ServerConfig};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting agriguru-server");

    let config = ServerConfig::load()?;
    info!(
        instance = %config.instance,
        model_path = %config.model_path.display(),
        price_api_url = %config.price_api_url,
        "Server configured"
    );

    let health_registry = HealthRegistry::new();
    health_registry.register(components::PRICE_SOURCE).await;

    // A missing or malformed model is fatal: never serve without it
    let classifier = Arc::new(
        OnnxClassifier::load(&config.model_path, &config.labels_path)
            .context("Failed to load crop classifier")?,
    );
    health_registry.register(components::CLASSIFIER).await;

    let price_source = Arc::new(
        DataGovClient::new(config.price_client_config())
            .context("Failed to create market price client")?,
    );

    let metrics = AdvisorMetrics::new();
    metrics.set_model_info(classifier.model_version(), classifier.class_labels().len());

    let logger = StructuredLogger::new(&config.instance);
    logger.log_startup(
        SERVICE_VERSION,
        classifier.model_version(),
        classifier.class_labels().len(),
    );

    let app_state = Arc::new(api::AppState::new(
        RecommendationService::new(classifier.clone()),
        MarketService::new(price_source),
        health_registry.clone(),
        metrics,
        logger.clone(),
    ));

    health_registry.set_ready(true).await;

    let api_handle = tokio::spawn(api::serve(config.port, app_state));

    tokio::select! {
        result = api_handle => {
            match result {
                Ok(Ok(())) => logger.log_shutdown("API server exited"),
                Ok(Err(e)) => {
                    error!(error = %e, "API server failed");
                    return Err(e);
                }
                Err(e) => return Err(e).context("API server task panicked"),
            }
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            logger.log_shutdown("SIGINT received");
        }
    }

    let stats = classifier.stats();
    info!(
        total_inferences = stats.total_inferences,
        slow_inferences = stats.slow_inferences,
        "Shutting down"
    );

    Ok(())
}
