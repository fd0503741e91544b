//! Boundary validation for soil and weather samples
//!
//! Every attribute must fall inside an inclusive, agronomically plausible
//! range before the sample is handed to the classifier.

use crate::error::{AdvisorError, Result};
use crate::models::SoilWeatherSample;

/// Inclusive range for one sample attribute
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldRange {
    pub field: &'static str,
    pub min: f64,
    pub max: f64,
}

impl FieldRange {
    const fn new(field: &'static str, min: f64, max: f64) -> Self {
        Self { field, min, max }
    }

    /// Check a single value against this range
    pub fn check(&self, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(self.violation(
                value,
                format!("a finite number in [{}, {}]", self.min, self.max),
            ));
        }
        if value < self.min {
            return Err(self.violation(value, format!(">= {}", self.min)));
        }
        if value > self.max {
            return Err(self.violation(value, format!("<= {}", self.max)));
        }
        Ok(())
    }

    fn violation(&self, value: f64, bound: String) -> AdvisorError {
        AdvisorError::OutOfRange {
            field: self.field,
            value,
            bound,
        }
    }
}

pub const NITROGEN: FieldRange = FieldRange::new("N", 0.0, 140.0);
pub const PHOSPHORUS: FieldRange = FieldRange::new("P", 5.0, 145.0);
pub const POTASSIUM: FieldRange = FieldRange::new("K", 5.0, 205.0);
pub const PH: FieldRange = FieldRange::new("ph", 3.5, 9.0);
pub const TEMPERATURE: FieldRange = FieldRange::new("temperature", 8.0, 44.0);
pub const HUMIDITY: FieldRange = FieldRange::new("humidity", 14.0, 100.0);
pub const RAINFALL: FieldRange = FieldRange::new("rainfall", 20.0, 300.0);

/// All ranges, in model feature order
pub const RANGES: [FieldRange; 7] = [
    NITROGEN,
    PHOSPHORUS,
    POTASSIUM,
    PH,
    TEMPERATURE,
    HUMIDITY,
    RAINFALL,
];

/// Validate a sample, reporting the first out-of-range attribute in feature order
pub fn validate(sample: &SoilWeatherSample) -> Result<()> {
    let values = [
        sample.nitrogen,
        sample.phosphorus,
        sample.potassium,
        sample.ph,
        sample.temperature,
        sample.humidity,
        sample.rainfall,
    ];

    RANGES
        .iter()
        .zip(values)
        .try_for_each(|(range, value)| range.check(value))
}
