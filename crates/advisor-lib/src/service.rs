//! Request-level services for the two pipelines
//!
//! Both services are stateless per request; they only hold shared,
//! read-only handles to the classifier and the price source.

use crate::error::{AdvisorError, Result};
use crate::market::{normalize_and_rank, PriceSource, TOP_N};
use crate::models::{RankedPrice, Recommendation, SoilWeatherSample};
use crate::predictor::{class_probabilities, rank, Classifier};
use crate::validation::validate;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Validates samples, runs the classifier and ranks its output
#[derive(Clone)]
pub struct RecommendationService {
    classifier: Arc<dyn Classifier>,
}

impl RecommendationService {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self { classifier }
    }

    /// Recommend a crop for a sample
    ///
    /// Validation happens before the classifier is touched.
    pub fn predict(&self, sample: &SoilWeatherSample) -> Result<Recommendation> {
        validate(sample)?;

        let result = class_probabilities(self.classifier.as_ref(), sample).and_then(rank);
        match &result {
            Ok(rec) => debug!(
                crop = %rec.recommended_crop,
                confidence = rec.confidence,
                "Recommendation computed"
            ),
            Err(e) => error!(
                error = %e,
                nitrogen = sample.nitrogen,
                phosphorus = sample.phosphorus,
                potassium = sample.potassium,
                ph = sample.ph,
                temperature = sample.temperature,
                humidity = sample.humidity,
                rainfall = sample.rainfall,
                "Inference failed"
            ),
        }
        result
    }

    /// Known crop labels in class order
    pub fn list_crops(&self) -> Result<Vec<String>> {
        let labels = self.classifier.class_labels();
        if labels.is_empty() {
            return Err(AdvisorError::Internal("classifier has no class labels".to_string()));
        }
        Ok(labels.to_vec())
    }

    pub fn model_version(&self) -> &str {
        self.classifier.model_version()
    }
}

/// Fetches, normalizes and ranks market prices for a location
#[derive(Clone)]
pub struct MarketService {
    source: Arc<dyn PriceSource>,
    top_n: usize,
}

impl MarketService {
    pub fn new(source: Arc<dyn PriceSource>) -> Self {
        Self { source, top_n: TOP_N }
    }

    /// Top prices for a (state, district) pair
    pub async fn market_prices(&self, state: &str, district: &str) -> Result<Vec<RankedPrice>> {
        let state = require_location("state", state)?;
        let district = require_location("district", district)?;

        let records = match self.source.fetch_records(state, district).await {
            Ok(records) => records,
            Err(e) => {
                warn!(state, district, kind = e.kind(), error = %e, "Market price fetch failed");
                return Err(e);
            }
        };

        let fetched = records.len();
        let prices = normalize_and_rank(records, self.top_n);
        if prices.is_empty() {
            warn!(state, district, fetched, "No priced records for location");
            return Err(AdvisorError::NoData {
                state: state.to_string(),
                district: district.to_string(),
            });
        }

        debug!(state, district, fetched, returned = prices.len(), "Market prices ranked");
        Ok(prices)
    }
}

fn require_location<'a>(field: &'static str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AdvisorError::InvalidInput {
            field,
            reason: "must not be empty".to_string(),
        });
    }
    Ok(trimmed)
}
