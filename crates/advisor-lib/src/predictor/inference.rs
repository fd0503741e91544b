//! ONNX inference using tract
//!
//! Loads the exported crop classifier once at startup and runs it for
//! each request. The plan is immutable after loading, so a single
//! instance is shared across requests without locking.

use super::Classifier;
use crate::error::{AdvisorError, Result};
use crate::models::NUM_FEATURES;
use anyhow::Context;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tract_onnx::prelude::*;
use tracing::{debug, info, warn};

/// Inference latency above which a warning is logged
const MAX_INFERENCE_MS: u128 = 50;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Crop classifier backed by an ONNX export of the trained model
pub struct OnnxClassifier {
    model: TractModel,
    labels: Vec<String>,
    version: String,
    inference_count: AtomicU64,
    slow_inference_count: AtomicU64,
}

impl OnnxClassifier {
    /// Load the model and its label list from disk
    pub fn load(
        model_path: impl AsRef<Path>,
        labels_path: impl AsRef<Path>,
    ) -> anyhow::Result<Self> {
        let model_path = model_path.as_ref();
        let model_bytes = std::fs::read(model_path)
            .with_context(|| format!("Failed to read model file {}", model_path.display()))?;
        let labels = load_labels(labels_path)?;

        let version = model_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("crop_model")
            .to_string();

        let classifier = Self::from_bytes(&model_bytes, labels)?.with_version(version);
        info!(
            model = %model_path.display(),
            classes = classifier.labels.len(),
            "Crop classifier loaded"
        );
        Ok(classifier)
    }

    /// Build a classifier from in-memory model bytes and labels
    pub fn from_bytes(model_bytes: &[u8], labels: Vec<String>) -> anyhow::Result<Self> {
        validate_labels(&labels)?;
        let model = Self::load_model(model_bytes)?;
        Ok(Self {
            model,
            labels,
            version: "v1".to_string(),
            inference_count: AtomicU64::new(0),
            slow_inference_count: AtomicU64::new(0),
        })
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Load and optimize an ONNX model from bytes
    fn load_model(model_bytes: &[u8]) -> anyhow::Result<TractModel> {
        let model = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))
            .context("Failed to parse ONNX model")?
            .with_input_fact(0, f32::fact([1, NUM_FEATURES]).into())
            .context("Failed to set input shape")?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;
        Ok(model)
    }

    fn run(&self, features: &[f32; NUM_FEATURES]) -> anyhow::Result<Vec<f32>> {
        let input: Tensor =
            tract_ndarray::Array2::from_shape_vec((1, NUM_FEATURES), features.to_vec())
                .context("Failed to build input tensor")?
                .into();

        let outputs = self.model.run(tvec!(input.into()))?;
        let values: Vec<Vec<f32>> = outputs
            .iter()
            .filter(|t| t.datum_type() == f32::datum_type())
            .map(|t| t.as_slice::<f32>().map(|s| s.to_vec()))
            .collect::<TractResult<_>>()?;

        select_probabilities(values, self.labels.len())
    }

    /// Get inference statistics
    pub fn stats(&self) -> InferenceStats {
        InferenceStats {
            total_inferences: self.inference_count.load(Ordering::Relaxed),
            slow_inferences: self.slow_inference_count.load(Ordering::Relaxed),
        }
    }
}

impl Classifier for OnnxClassifier {
    fn predict_probabilities(&self, features: &[f32; NUM_FEATURES]) -> Result<Vec<f32>> {
        let start = Instant::now();
        let probabilities = self
            .run(features)
            .map_err(|e| AdvisorError::Inference(format!("{:#}", e)))?;

        let elapsed = start.elapsed();
        self.inference_count.fetch_add(1, Ordering::Relaxed);
        if elapsed.as_millis() > MAX_INFERENCE_MS {
            self.slow_inference_count.fetch_add(1, Ordering::Relaxed);
            warn!(
                elapsed_ms = elapsed.as_millis(),
                "Inference exceeded {}ms target", MAX_INFERENCE_MS
            );
        } else {
            debug!(elapsed_us = elapsed.as_micros(), "Inference completed");
        }

        Ok(probabilities)
    }

    fn class_labels(&self) -> &[String] {
        &self.labels
    }

    fn model_version(&self) -> &str {
        &self.version
    }
}

/// Inference statistics
#[derive(Debug, Clone, Copy)]
pub struct InferenceStats {
    pub total_inferences: u64,
    pub slow_inferences: u64,
}

/// Pick the probability output among the model's float outputs
///
/// Exported classifiers emit a label tensor and a `[1, n_classes]`
/// probability tensor; the first float output of the right length wins.
fn select_probabilities(outputs: Vec<Vec<f32>>, num_classes: usize) -> anyhow::Result<Vec<f32>> {
    let found = outputs.len();
    outputs
        .into_iter()
        .find(|values| values.len() == num_classes)
        .with_context(|| {
            format!(
                "No probability output with {} classes among {} float outputs",
                num_classes, found
            )
        })
}

/// Read the class label list (a JSON array of strings in encoder order)
pub fn load_labels(path: impl AsRef<Path>) -> anyhow::Result<Vec<String>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read labels file {}", path.display()))?;
    let labels: Vec<String> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse labels file {}", path.display()))?;
    validate_labels(&labels)?;
    Ok(labels)
}

fn validate_labels(labels: &[String]) -> anyhow::Result<()> {
    if labels.is_empty() {
        anyhow::bail!("Label list is empty");
    }
    if let Some(idx) = labels.iter().position(|l| l.trim().is_empty()) {
        anyhow::bail!("Label at index {} is empty", idx);
    }
    for (idx, label) in labels.iter().enumerate() {
        if labels[..idx].contains(label) {
            anyhow::bail!("Duplicate label {:?} at index {}", label, idx);
        }
    }
    Ok(())
}
