//! Classification metrics against ground-truth labels.

use crate::models::aggregator::EnsembleScore;
use std::collections::HashMap;

/// Default score threshold for flagging an entity
pub const DEFAULT_EVALUATION_THRESHOLD: f64 = 0.5;

/// Precision / recall / F1 for one evaluation run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationResult {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Score-threshold classification against a binary ground-truth mapping.
/// Entities absent from the mapping count as negatives. Every degenerate
/// denominator resolves to 0.0 rather than an error.
pub fn compute_classification_metrics(
    scores: &[EnsembleScore],
    ground_truth: &HashMap<String, u8>,
    threshold: f64,
) -> EvaluationResult {
    let mut tp = 0u32;
    let mut fp = 0u32;
    let mut fn_ = 0u32;

    for score in scores {
        let label = ground_truth.get(&score.entity_id).copied().unwrap_or(0);
        let flagged = score.score >= threshold;
        match (flagged, label) {
            (true, 1) => tp += 1,
            (true, 0) => fp += 1,
            (false, 1) => fn_ += 1,
            _ => {}
        }
    }

    let precision = if tp + fp > 0 {
        tp as f64 / (tp + fp) as f64
    } else {
        0.0
    };
    let recall = if tp + fn_ > 0 {
        tp as f64 / (tp + fn_) as f64
    } else {
        0.0
    };
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    EvaluationResult {
        precision,
        recall,
        f1,
    }
}
