//! Structured explanations for ensembled scores.
//!
//! Ranks a vector's features by absolute magnitude and keeps the strongest
//! contributors. Rendering narrative text from these is a downstream
//! formatting concern; the pipeline only retains the structured form.

use crate::feature_store::FeatureVector;
use crate::models::aggregator::EnsembleScore;

/// Top contributing features for one scored entity
#[derive(Debug, Clone)]
pub struct Explanation {
    pub entity_id: String,
    pub top_features: Vec<String>,
}

/// Builds explanations from feature magnitudes
#[derive(Debug, Clone)]
pub struct Explainer {
    top_n: usize,
}

impl Explainer {
    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }

    pub fn build_explanation(
        &self,
        vector: &FeatureVector,
        score: &EnsembleScore,
    ) -> Explanation {
        let mut ranked: Vec<(&String, &f64)> = vector.features.iter().collect();
        ranked.sort_by(|a, b| {
            b.1.abs()
                .partial_cmp(&a.1.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Explanation {
            entity_id: score.entity_id.clone(),
            top_features: ranked
                .into_iter()
                .take(self.top_n)
                .map(|(name, _)| name.clone())
                .collect(),
        }
    }
}

impl Default for Explainer {
    fn default() -> Self {
        Self::new(3)
    }
}
