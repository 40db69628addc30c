//! Unsupervised anomaly scoring over feature vectors.
//!
//! Detectors are independent of the predictive-model registry: the engine
//! fans every registered detector out over every feature vector and emits
//! raw scores. Fusion with other signals happens elsewhere.

use crate::feature_store::FeatureVector;
use std::collections::HashMap;
use tracing::debug;

/// Capability interface for anomaly detection algorithms
pub trait AnomalyDetector: Send + Sync {
    fn name(&self) -> &str;

    /// Anomaly score for one named-feature mapping; higher is more anomalous
    fn score(&self, features: &HashMap<String, f64>) -> f64;
}

/// One detector's score for one entity
#[derive(Debug, Clone)]
pub struct AnomalyScore {
    pub entity_id: String,
    pub detector_name: String,
    pub score: f64,
}

/// Runs a set of detectors over feature vectors
#[derive(Default)]
pub struct AnomalyEngine {
    detectors: Vec<Box<dyn AnomalyDetector>>,
}

impl AnomalyEngine {
    pub fn new(detectors: Vec<Box<dyn AnomalyDetector>>) -> Self {
        Self { detectors }
    }

    /// One score per (detector, vector) pair. Stateless detectors make this
    /// idempotent over identical inputs.
    pub fn run(&self, vectors: &[FeatureVector]) -> Vec<AnomalyScore> {
        let mut scores = Vec::with_capacity(vectors.len() * self.detectors.len());
        for vector in vectors {
            for detector in &self.detectors {
                scores.push(AnomalyScore {
                    entity_id: vector.entity_id.clone(),
                    detector_name: detector.name().to_string(),
                    score: detector.score(&vector.features),
                });
            }
        }

        debug!(
            vectors = vectors.len(),
            detectors = self.detectors.len(),
            scores = scores.len(),
            "Ran anomaly detectors"
        );
        scores
    }
}

/// Z-score detector over a single feature against a fixed baseline.
///
/// Stateless: the baseline mean and standard deviation are supplied at
/// construction. A missing feature scores as the baseline mean (z = 0).
pub struct ZScoreDetector {
    name: String,
    feature: String,
    baseline_mean: f64,
    baseline_std: f64,
}

impl ZScoreDetector {
    pub fn new(
        name: impl Into<String>,
        feature: impl Into<String>,
        baseline_mean: f64,
        baseline_std: f64,
    ) -> Self {
        Self {
            name: name.into(),
            feature: feature.into(),
            // std floor keeps a degenerate baseline from blowing up the score
            baseline_std: if baseline_std <= 0.0 { 1e-9 } else { baseline_std },
            baseline_mean,
        }
    }
}

impl AnomalyDetector for ZScoreDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn score(&self, features: &HashMap<String, f64>) -> f64 {
        let value = features
            .get(&self.feature)
            .copied()
            .unwrap_or(self.baseline_mean);
        ((value - self.baseline_mean) / self.baseline_std).abs()
    }
}
