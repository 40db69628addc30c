//! Score ensembling across models.

use crate::models::registry::ModelPrediction;
use std::collections::HashMap;

/// Combined score for an entity after ensembling
#[derive(Debug, Clone)]
pub struct EnsembleScore {
    pub entity_id: String,
    pub score: f64,
    /// Per-model scores; keys are exactly the models that produced a
    /// prediction for this entity in this run
    pub breakdown: HashMap<String, f64>,
}

/// Combines per-model predictions into one score per entity
#[derive(Debug, Clone, Default)]
pub struct EnsembleCombiner {
    weights: HashMap<String, f64>,
}

impl EnsembleCombiner {
    /// Combiner using the unweighted mean of model scores
    pub fn new() -> Self {
        Self::default()
    }

    /// Combiner using a weighted average; models absent from `weights`
    /// contribute weight zero
    pub fn with_weights(weights: HashMap<String, f64>) -> Self {
        Self { weights }
    }

    /// Group predictions by entity and compute one combined score each.
    /// Commutative over prediction order.
    pub fn combine(&self, predictions: &[ModelPrediction]) -> Vec<EnsembleScore> {
        let mut grouped: HashMap<String, HashMap<String, f64>> = HashMap::new();
        for prediction in predictions {
            grouped
                .entry(prediction.entity_id.clone())
                .or_default()
                .insert(prediction.model_name.clone(), prediction.score);
        }

        grouped
            .into_iter()
            .map(|(entity_id, breakdown)| EnsembleScore {
                score: self.weighted_average(&breakdown),
                entity_id,
                breakdown,
            })
            .collect()
    }

    /// Mean score per model name across all predictions, for backtest
    /// diagnostics. Models with no observations are skipped.
    pub fn aggregate_statistics(&self, predictions: &[ModelPrediction]) -> HashMap<String, f64> {
        let mut by_model: HashMap<String, Vec<f64>> = HashMap::new();
        for prediction in predictions {
            by_model
                .entry(prediction.model_name.clone())
                .or_default()
                .push(prediction.score);
        }

        by_model
            .into_iter()
            .filter(|(_, scores)| !scores.is_empty())
            .map(|(name, scores)| {
                let mean = scores.iter().sum::<f64>() / scores.len() as f64;
                (name, mean)
            })
            .collect()
    }

    /// Weighted average over the models present for one entity.
    ///
    /// No configured weights → unweighted mean. A zero applicable total
    /// weight also falls back to the unweighted mean rather than dividing
    /// by zero.
    fn weighted_average(&self, model_scores: &HashMap<String, f64>) -> f64 {
        if model_scores.is_empty() {
            return 0.0;
        }

        if self.weights.is_empty() {
            return unweighted_mean(model_scores);
        }

        let mut total_weight = 0.0;
        let mut weighted_sum = 0.0;
        for (name, score) in model_scores {
            let weight = self.weights.get(name).copied().unwrap_or(0.0);
            total_weight += weight;
            weighted_sum += weight * score;
        }

        if total_weight > 0.0 {
            weighted_sum / total_weight
        } else {
            unweighted_mean(model_scores)
        }
    }
}

fn unweighted_mean(model_scores: &HashMap<String, f64>) -> f64 {
    model_scores.values().sum::<f64>() / model_scores.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prediction(model: &str, entity: &str, score: f64) -> ModelPrediction {
        ModelPrediction {
            model_name: model.to_string(),
            entity_id: entity.to_string(),
            score,
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn test_unweighted_mean() {
        let combiner = EnsembleCombiner::new();
        let scores = combiner.combine(&[
            prediction("model_a", "acct_1", 0.2),
            prediction("model_b", "acct_1", 0.8),
        ]);

        assert_eq!(scores.len(), 1);
        assert!((scores[0].score - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_weighted_average_ignores_unweighted_models() {
        let combiner = EnsembleCombiner::with_weights(HashMap::from([
            ("model_a".to_string(), 1.0),
            ("model_b".to_string(), 0.0),
        ]));
        let scores = combiner.combine(&[
            prediction("model_a", "acct_1", 0.2),
            prediction("model_b", "acct_1", 0.8),
        ]);

        // Applicable weight is 1.0; model_b contributes nothing.
        assert!((scores[0].score - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_zero_total_weight_falls_back_to_mean() {
        let combiner =
            EnsembleCombiner::with_weights(HashMap::from([("model_c".to_string(), 1.0)]));
        let scores = combiner.combine(&[
            prediction("model_a", "acct_1", 0.2),
            prediction("model_b", "acct_1", 0.8),
        ]);

        assert!((scores[0].score - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_breakdown_keys_match_contributing_models() {
        let combiner = EnsembleCombiner::new();
        let scores = combiner.combine(&[
            prediction("model_a", "acct_1", 0.2),
            prediction("model_b", "acct_1", 0.8),
            prediction("model_a", "acct_2", 0.6),
        ]);

        let acct_1 = scores.iter().find(|s| s.entity_id == "acct_1").unwrap();
        let acct_2 = scores.iter().find(|s| s.entity_id == "acct_2").unwrap();

        let mut keys: Vec<_> = acct_1.breakdown.keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["model_a", "model_b"]);
        assert_eq!(acct_2.breakdown.len(), 1);
        assert!((acct_2.score - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_empty_predictions_yield_no_scores() {
        let combiner = EnsembleCombiner::new();
        assert!(combiner.combine(&[]).is_empty());
        assert!(combiner.aggregate_statistics(&[]).is_empty());
    }

    #[test]
    fn test_aggregate_statistics_per_model_means() {
        let combiner = EnsembleCombiner::new();
        let stats = combiner.aggregate_statistics(&[
            prediction("model_a", "acct_1", 0.2),
            prediction("model_a", "acct_2", 0.4),
            prediction("model_b", "acct_1", 0.9),
        ]);

        assert!((stats["model_a"] - 0.3).abs() < 1e-12);
        assert!((stats["model_b"] - 0.9).abs() < 1e-12);
    }
}
