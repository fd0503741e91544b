//! Error taxonomy shared by the recommendation and market pipelines

use thiserror::Error;

/// Errors surfaced by advisor operations
///
/// Each variant maps to a stable external `kind` so the HTTP layer can
/// translate it without inspecting messages.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdvisorError {
    /// A sample attribute fell outside its documented range
    #[error("{field} = {value} is out of range: must be {bound}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        bound: String,
    },

    /// A request parameter was missing or blank
    #[error("invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    /// The classifier failed or returned malformed output
    #[error("inference failed: {0}")]
    Inference(String),

    /// The price source could not be reached or answered with a failure
    #[error("price source unavailable: {0}")]
    SourceUnavailable(String),

    /// The price source answered but had nothing usable for the location
    #[error("no market data for {state}/{district}")]
    NoData { state: String, district: String },

    /// Startup or runtime failure outside the request contract
    #[error("internal error: {0}")]
    Internal(String),
}

impl AdvisorError {
    /// Stable machine-readable kind used in error responses
    pub fn kind(&self) -> &'static str {
        match self {
            AdvisorError::OutOfRange { .. } | AdvisorError::InvalidInput { .. } => {
                "validation_error"
            }
            AdvisorError::Inference(_) => "inference_error",
            AdvisorError::SourceUnavailable(_) => "source_unavailable",
            AdvisorError::NoData { .. } => "no_data",
            AdvisorError::Internal(_) => "internal_error",
        }
    }

    /// True for failures caused by the caller's input rather than the service
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AdvisorError::OutOfRange { .. }
                | AdvisorError::InvalidInput { .. }
                | AdvisorError::NoData { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, AdvisorError>;
