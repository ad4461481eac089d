//! Softmax and top-k decoding of classifier logits

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::model::host::LabelList;

/// Number of classes returned when the caller does not ask otherwise
pub const DEFAULT_TOP_K: usize = 3;

/// One ranked class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassPrediction {
    pub index: usize,
    pub label: String,
    pub prob: f32,
}

/// Ranked predictions for one image
///
/// `topk` is ordered by descending probability; `top1` is its first entry, or
/// `None` when the model has no classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub top1: Option<ClassPrediction>,
    pub topk: Vec<ClassPrediction>,
}

/// Numerically stable softmax
///
/// The maximum logit is subtracted before exponentiating so large logits
/// cannot overflow to infinity.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(f32::NEG_INFINITY, f32::max);

    if !max.is_finite() {
        // Empty, all-NaN or +inf logits: fall back to the limit distribution
        return limit_distribution(logits, max);
    }

    let exps: Vec<f32> = logits.iter().map(|&v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().filter(|v| !v.is_nan()).sum();

    exps.into_iter().map(|e| e / sum).collect()
}

/// Uniform mass on the entries equal to `max` when it is not finite
fn limit_distribution(logits: &[f32], max: f32) -> Vec<f32> {
    let hits = logits.iter().filter(|&&v| v == max).count();
    if hits == 0 {
        return vec![f32::NAN; logits.len()];
    }

    logits
        .iter()
        .map(|&v| if v == max { 1.0 / hits as f32 } else { 0.0 })
        .collect()
}

/// Descending by probability, NaN last, ties by ascending index
fn rank(a: &(usize, f32), b: &(usize, f32)) -> Ordering {
    match (a.1.is_nan(), b.1.is_nan()) {
        (true, true) => a.0.cmp(&b.0),
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b
            .1
            .partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then(a.0.cmp(&b.0)),
    }
}

/// Rank the `k` most probable classes
///
/// `k` is clamped to the number of classes. Labels are resolved through
/// [`LabelList::label_for`], so a short label list yields placeholders.
pub fn top_k(logits: &[f32], k: usize, labels: &LabelList) -> PredictionResult {
    let probs = softmax(logits);

    let mut indexed: Vec<(usize, f32)> = probs.into_iter().enumerate().collect();
    indexed.sort_by(rank);

    let topk: Vec<ClassPrediction> = indexed
        .into_iter()
        .take(k.min(logits.len()))
        .map(|(index, prob)| ClassPrediction {
            index,
            label: labels.label_for(index),
            // NaN is ranked last already; report it as zero mass
            prob: if prob.is_nan() { 0.0 } else { prob },
        })
        .collect();

    PredictionResult {
        top1: topk.first().cloned(),
        topk,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> LabelList {
        LabelList::new(names.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[1.0, 2.0, 3.0, -4.0, 0.5]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn test_softmax_large_logits_do_not_overflow() {
        let probs = softmax(&[1000.0, 1001.0, 999.0]);
        assert!(probs.iter().all(|p| p.is_finite()));
        assert!(probs[1] > probs[0] && probs[0] > probs[2]);

        let probs = softmax(&[-1000.0, -1000.0]);
        assert!((probs[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_softmax_degenerate_inputs() {
        assert!(softmax(&[]).is_empty());

        let probs = softmax(&[f32::INFINITY, 0.0, f32::INFINITY]);
        assert_eq!(probs, vec![0.5, 0.0, 0.5]);
    }

    #[test]
    fn test_top_k_sorted_descending() {
        let result = top_k(&[0.1, 3.0, 1.0, 2.0, -1.0], 3, &labels(&["a", "b", "c", "d", "e"]));

        let indices: Vec<usize> = result.topk.iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![1, 3, 2]);
        assert_eq!(result.topk[0].label, "b");
        assert!(result.topk.windows(2).all(|w| w[0].prob >= w[1].prob));
        assert_eq!(result.top1, Some(result.topk[0].clone()));
    }

    #[test]
    fn test_ties_break_by_ascending_index() {
        let result = top_k(&[1.0, 5.0, 5.0, 1.0, 5.0], 4, &labels(&["a", "b", "c", "d", "e"]));

        let indices: Vec<usize> = result.topk.iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![1, 2, 4, 0]);
    }

    #[test]
    fn test_k_clamped_to_class_count() {
        let result = top_k(&[0.3, 0.1], 10, &labels(&["a", "b"]));
        assert_eq!(result.topk.len(), 2);

        let total: f32 = result.topk.iter().map(|p| p.prob).sum();
        assert!((total - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_out_of_range_index_gets_placeholder() {
        let result = top_k(&[0.0, 0.0, 9.0], 3, &labels(&["a"]));
        assert_eq!(result.topk[0].index, 2);
        assert_eq!(result.topk[0].label, "class_2");
        assert_eq!(result.topk[1].label, "a");
    }

    #[test]
    fn test_zero_classes_has_no_top1() {
        let result = top_k(&[], DEFAULT_TOP_K, &labels(&["a"]));
        assert!(result.top1.is_none());
        assert!(result.topk.is_empty());
    }

    #[test]
    fn test_zero_k() {
        let result = top_k(&[1.0, 2.0], 0, &labels(&["a", "b"]));
        assert!(result.top1.is_none());
        assert!(result.topk.is_empty());
    }

    #[test]
    fn test_nan_logits_rank_last() {
        let result = top_k(&[f32::NAN, 1.0, 2.0], 3, &labels(&["a", "b", "c"]));
        let indices: Vec<usize> = result.topk.iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![2, 1, 0]);
    }

    #[test]
    fn test_nan_probability_serializes_as_number() {
        let result = top_k(&[f32::NAN, 1.0], 3, &labels(&["a", "b"]));
        assert_eq!(result.topk[1].index, 0);
        assert_eq!(result.topk[1].prob, 0.0);

        let json = serde_json::to_value(&result).unwrap();
        for entry in json["topk"].as_array().unwrap() {
            assert!(entry["prob"].is_f64());
        }

        let all_nan = top_k(&[f32::NAN, f32::NAN], 2, &labels(&["a", "b"]));
        assert!(all_nan.topk.iter().all(|p| p.prob == 0.0));
    }

    #[test]
    fn test_top_k_is_idempotent() {
        let logits = [0.2, -1.3, 4.1, 4.1, 0.0, 2.2];
        let names = labels(&["a", "b", "c", "d", "e", "f"]);
        assert_eq!(top_k(&logits, 3, &names), top_k(&logits, 3, &names));
    }

    #[test]
    fn test_serialized_shape() {
        let result = top_k(&[2.0, 1.0], 3, &labels(&["healthy", "rust"]));
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["top1"]["index"], 0);
        assert_eq!(json["top1"]["label"], "healthy");
        assert!(json["top1"]["prob"].as_f64().unwrap() > 0.5);
        assert_eq!(json["topk"].as_array().unwrap().len(), 2);

        let empty = serde_json::to_value(top_k(&[], 3, &labels(&["a"]))).unwrap();
        assert!(empty["top1"].is_null());
    }
}
