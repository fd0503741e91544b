//! Crop classification: model capability, adapter and ranking

mod inference;
mod output;

pub use inference::{load_labels, InferenceStats, OnnxClassifier};
pub use output::{rank, round_to, DISPLAY_PRECISION, PROBABILITY_SUM_TOLERANCE};

use crate::error::{AdvisorError, Result};
use crate::models::{CropProbability, SoilWeatherSample, NUM_FEATURES};

/// Capability exposed by a trained crop classifier
///
/// Implementations must be safe for concurrent read-only use; the
/// server shares one instance across all requests.
pub trait Classifier: Send + Sync {
    /// Class probabilities aligned to `class_labels()`
    fn predict_probabilities(&self, features: &[f32; NUM_FEATURES]) -> Result<Vec<f32>>;

    /// Class labels in the model's class index order
    fn class_labels(&self) -> &[String];

    /// Index of the most probable class (first index wins ties)
    fn predict(&self, features: &[f32; NUM_FEATURES]) -> Result<usize> {
        let probabilities = self.predict_probabilities(features)?;
        probabilities
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f32)>, (idx, &p)| match best {
                Some((_, best_p)) if best_p >= p => best,
                _ => Some((idx, p)),
            })
            .map(|(idx, _)| idx)
            .ok_or_else(|| AdvisorError::Inference("model returned no probabilities".to_string()))
    }

    /// Version string reported in metrics and logs
    fn model_version(&self) -> &str {
        "unknown"
    }
}

/// Run the classifier on a validated sample and pair each probability with its label
pub fn class_probabilities(
    classifier: &dyn Classifier,
    sample: &SoilWeatherSample,
) -> Result<Vec<CropProbability>> {
    let labels = classifier.class_labels();
    let probabilities = classifier.predict_probabilities(&sample.features())?;

    if probabilities.len() != labels.len() {
        return Err(AdvisorError::Inference(format!(
            "model returned {} probabilities for {} classes",
            probabilities.len(),
            labels.len()
        )));
    }

    labels
        .iter()
        .zip(probabilities)
        .map(|(label, p)| {
            if !p.is_finite() || p < 0.0 {
                return Err(AdvisorError::Inference(format!(
                    "invalid probability {} for class {}",
                    p, label
                )));
            }
            Ok(CropProbability::new(label.clone(), p as f64))
        })
        .collect()
}
