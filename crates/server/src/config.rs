//! Server configuration

use advisor_lib::market::PriceClientConfig;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration, read from `AGRIGURU_*` environment variables
/// and an optional `agriguru.toml`
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Instance name used in structured logs
    #[serde(default = "default_instance")]
    pub instance: String,

    /// HTTP listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// ONNX export of the trained crop classifier
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    /// JSON array of class labels in encoder order
    #[serde(default = "default_labels_path")]
    pub labels_path: PathBuf,

    /// Base URL of the market price API
    #[serde(default = "default_price_api_url")]
    pub price_api_url: String,

    /// API key for the market price API
    #[serde(default)]
    pub price_api_key: String,

    /// Dataset resource id of daily commodity prices
    #[serde(default = "default_price_resource_id")]
    pub price_resource_id: String,

    /// Records requested per price query
    #[serde(default = "default_price_record_limit")]
    pub price_record_limit: u32,

    /// Timeout for one price query attempt, in seconds
    #[serde(default = "default_price_timeout")]
    pub price_timeout_secs: u64,

    /// Retries after a transient price query failure
    #[serde(default = "default_price_max_retries")]
    pub price_max_retries: u32,
}

fn default_instance() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "agriguru".to_string())
}

fn default_port() -> u16 {
    8000
}

fn default_model_path() -> PathBuf {
    PathBuf::from("crop_model.onnx")
}

fn default_labels_path() -> PathBuf {
    PathBuf::from("crop_labels.json")
}

fn default_price_api_url() -> String {
    PriceClientConfig::default().base_url
}

fn default_price_resource_id() -> String {
    PriceClientConfig::default().resource_id
}

fn default_price_record_limit() -> u32 {
    100
}

fn default_price_timeout() -> u64 {
    10
}

fn default_price_max_retries() -> u32 {
    2
}

impl ServerConfig {
    /// Load configuration from the optional config file, then environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("agriguru").required(false))
            .add_source(config::Environment::with_prefix("AGRIGURU"))
            .build()
            .context("Failed to read configuration")?;

        config
            .try_deserialize()
            .context("Invalid AGRIGURU configuration")
    }

    /// Settings for the outbound price client
    pub fn price_client_config(&self) -> PriceClientConfig {
        PriceClientConfig {
            base_url: self.price_api_url.clone(),
            api_key: self.price_api_key.clone(),
            resource_id: self.price_resource_id.clone(),
            record_limit: self.price_record_limit,
            request_timeout: Duration::from_secs(self.price_timeout_secs),
            max_retries: self.price_max_retries,
            ..PriceClientConfig::default()
        }
    }
}
