//! Core library for the AgriGuru crop advisor
//!
//! This crate provides:
//! - Validation of soil and weather samples
//! - Crop classification through an opaque ONNX model and ranking of its output
//! - Market price fetching, deduplication and ranking
//! - Health checks and observability

pub mod error;
pub mod health;
pub mod market;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod service;
pub mod validation;

pub use error::{AdvisorError, Result};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{AdvisorMetrics, StructuredLogger};
pub use service::{MarketService, RecommendationService};
