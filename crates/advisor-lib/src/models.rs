//! Core data models for the advisor

use serde::{Deserialize, Serialize};

/// Number of input features expected by the crop classifier
pub const NUM_FEATURES: usize = 7;

/// Soil and weather measurements for a single recommendation request
///
/// Field names on the wire follow the front end's form (`N`, `P`, `K`, `ph`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoilWeatherSample {
    #[serde(rename = "N")]
    pub nitrogen: f64,
    #[serde(rename = "P")]
    pub phosphorus: f64,
    #[serde(rename = "K")]
    pub potassium: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub ph: f64,
    pub rainfall: f64,
}

impl SoilWeatherSample {
    /// Features in the order the trained model expects:
    /// N, P, K, pH, temperature, humidity, rainfall
    pub fn features(&self) -> [f32; NUM_FEATURES] {
        [
            self.nitrogen as f32,
            self.phosphorus as f32,
            self.potassium as f32,
            self.ph as f32,
            self.temperature as f32,
            self.humidity as f32,
            self.rainfall as f32,
        ]
    }
}

/// A crop label paired with the classifier's probability for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropProbability {
    pub crop: String,
    pub probability: f64,
}

impl CropProbability {
    pub fn new(crop: impl Into<String>, probability: f64) -> Self {
        Self {
            crop: crop.into(),
            probability,
        }
    }
}

/// Ranked crop recommendation derived from one classifier run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub recommended_crop: String,
    pub confidence: f64,
    pub ranking: Vec<CropProbability>,
}

/// Raw price record as returned by the market price source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketRecord {
    #[serde(rename = "commodity", default, deserialize_with = "text_field::deserialize")]
    pub crop: String,
    #[serde(default, deserialize_with = "text_field::deserialize")]
    pub market: String,
    /// Modal price in minor currency units, as reported upstream.
    /// The source sends numbers as strings; both forms are accepted.
    #[serde(default, deserialize_with = "price_field::deserialize")]
    pub modal_price: Option<f64>,
}

/// Normalized, display-ready market price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPrice {
    pub crop: String,
    pub market: String,
    pub price: String,
    #[serde(skip)]
    pub price_per_kg: f64,
}

/// Null text fields read as empty so one bad record does not reject a batch
mod text_field {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
    }
}

mod price_field {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|p| p.is_finite()))
    }
}
