//! Recommendation ranking
//!
//! Turns the classifier's per-class probabilities into a ranked
//! recommendation. Selection uses unrounded values; rounding only
//! affects the returned view.

use crate::error::{AdvisorError, Result};
use crate::models::{CropProbability, Recommendation};

/// Decimal places kept in reported probabilities
pub const DISPLAY_PRECISION: i32 = 4;

/// Allowed deviation of the probability sum from 1.0
pub const PROBABILITY_SUM_TOLERANCE: f64 = 0.01;

/// Round a value to a fixed number of decimal places
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Rank class probabilities into a recommendation
///
/// The top entry is the first class holding the maximum probability.
/// The ranking is a stable descending sort, so equal probabilities keep
/// the classifier's class order.
pub fn rank(probabilities: Vec<CropProbability>) -> Result<Recommendation> {
    if probabilities.is_empty() {
        return Err(AdvisorError::Inference("model returned no classes".to_string()));
    }

    let sum: f64 = probabilities.iter().map(|p| p.probability).sum();
    if (sum - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
        return Err(AdvisorError::Inference(format!(
            "class probabilities sum to {:.4}, expected 1.0",
            sum
        )));
    }

    let mut ranked = probabilities;
    ranked.sort_by(|a, b| b.probability.total_cmp(&a.probability));

    let top = &ranked[0];
    let recommended_crop = top.crop.clone();
    let confidence = round_to(top.probability, DISPLAY_PRECISION);

    let ranking: Vec<CropProbability> = ranked
        .into_iter()
        .map(|p| CropProbability {
            probability: round_to(p.probability, DISPLAY_PRECISION),
            crop: p.crop,
        })
        .collect();

    // Rounding each entry can push a borderline sum out of tolerance
    let rounded_sum: f64 = ranking.iter().map(|p| p.probability).sum();
    if (rounded_sum - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
        return Err(AdvisorError::Inference(format!(
            "rounded class probabilities sum to {:.4}, expected 1.0",
            rounded_sum
        )));
    }

    Ok(Recommendation {
        recommended_crop,
        confidence,
        ranking,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probs(pairs: &[(&str, f64)]) -> Vec<CropProbability> {
        pairs.iter().map(|(c, p)| CropProbability::new(*c, *p)).collect()
    }

    #[test]
    fn test_top_recommendation_is_maximum() {
        let rec = rank(probs(&[("maize", 0.1), ("rice", 0.75), ("jute", 0.15)])).unwrap();

        assert_eq!(rec.recommended_crop, "rice");
        assert_eq!(rec.confidence, 0.75);
        let order: Vec<_> = rec.ranking.iter().map(|p| p.crop.as_str()).collect();
        assert_eq!(order, vec!["rice", "jute", "maize"]);
    }

    #[test]
    fn test_ties_keep_class_order() {
        let rec = rank(probs(&[("apple", 0.2), ("banana", 0.4), ("coffee", 0.4)])).unwrap();

        assert_eq!(rec.recommended_crop, "banana");
        let order: Vec<_> = rec.ranking.iter().map(|p| p.crop.as_str()).collect();
        assert_eq!(order, vec!["banana", "coffee", "apple"]);
    }

    #[test]
    fn test_selection_uses_unrounded_values() {
        // Both round to 0.5 but the second is strictly larger
        let rec = rank(probs(&[("mango", 0.49996), ("grapes", 0.50004)])).unwrap();

        assert_eq!(rec.recommended_crop, "grapes");
        assert_eq!(rec.confidence, 0.5);
        assert_eq!(rec.ranking[0].crop, "grapes");
        assert_eq!(rec.ranking[1].probability, 0.5);
    }

    #[test]
    fn test_probabilities_rounded_to_four_places() {
        let rec = rank(probs(&[("rice", 0.123456), ("maize", 0.876544)])).unwrap();

        assert_eq!(rec.confidence, 0.8765);
        assert_eq!(rec.ranking[1].probability, 0.1235);
    }

    #[test]
    fn test_every_class_present_once() {
        let labels = ["rice", "maize", "chickpea", "kidneybeans", "pigeonpeas"];
        let input: Vec<_> = labels
            .iter()
            .map(|l| CropProbability::new(*l, 0.2))
            .collect();
        let rec = rank(input).unwrap();

        assert_eq!(rec.ranking.len(), labels.len());
        for label in labels {
            assert_eq!(rec.ranking.iter().filter(|p| p.crop == label).count(), 1);
        }
        let sum: f64 = rec.ranking.iter().map(|p| p.probability).sum();
        assert!((sum - 1.0).abs() <= PROBABILITY_SUM_TOLERANCE);
    }

    #[test]
    fn test_top_matches_first_ranked_entry() {
        let rec = rank(probs(&[("a", 0.3), ("b", 0.3), ("c", 0.4)])).unwrap();
        assert_eq!(rec.ranking[0].crop, rec.recommended_crop);
        assert_eq!(rec.ranking[0].probability, rec.confidence);
    }

    #[test]
    fn test_empty_input_rejected() {
        assert_eq!(rank(vec![]).unwrap_err().kind(), "inference_error");
    }

    #[test]
    fn test_unnormalized_output_rejected() {
        let err = rank(probs(&[("rice", 0.9), ("maize", 0.9)])).unwrap_err();
        assert_eq!(err.kind(), "inference_error");
    }

    #[test]
    fn test_rounding_tolerance_accepted() {
        assert!(rank(probs(&[("rice", 0.333), ("maize", 0.333), ("jute", 0.333)])).is_ok());
    }

    #[test]
    fn test_rounded_sum_outside_tolerance_rejected() {
        // Raw sum 1.009953 is in tolerance; each rounds up to 0.3367 for 1.0101
        let err = rank(probs(&[("a", 0.336651), ("b", 0.336651), ("c", 0.336651)])).unwrap_err();
        assert_eq!(err.kind(), "inference_error");
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.98766, 4), 0.9877);
        assert_eq!(round_to(100.0, 2), 100.0);
        assert_eq!(round_to(21.505, 1), 21.5);
    }
}
