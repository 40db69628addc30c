//! Concrete heuristic scoring models.
//!
//! Lightweight stand-ins for trained models: each maps a named-feature
//! vector to a risk score in [0, 1]. They exist so the registry, ensemble,
//! and binaries run against real variants rather than mocks.

use crate::feature_store::{FEATURE_AVG_TRADE_SIZE, FEATURE_PROFIT_PROXY};
use crate::models::registry::PredictiveModel;
use std::collections::HashMap;

/// Logistic model over a configured set of feature weights.
///
/// Score = sigmoid(bias + Σ weight_i · feature_i); missing features
/// contribute zero.
pub struct LogisticScorer {
    name: String,
    weights: HashMap<String, f64>,
    bias: f64,
}

impl LogisticScorer {
    pub fn new(name: impl Into<String>, weights: HashMap<String, f64>, bias: f64) -> Self {
        Self {
            name: name.into(),
            weights,
            bias,
        }
    }
}

impl PredictiveModel for LogisticScorer {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict_proba(&self, features: &HashMap<String, f64>) -> f64 {
        let activation: f64 = self
            .weights
            .iter()
            .map(|(feature, weight)| weight * features.get(feature).copied().unwrap_or(0.0))
            .sum::<f64>()
            + self.bias;
        1.0 / (1.0 + (-activation).exp())
    }
}

/// Flags accounts whose rolling trade size runs far above a baseline.
///
/// The ratio of rolling size to baseline is squashed into [0, 1); a rolling
/// size at the baseline scores 0.5.
pub struct VolumeSpikeScorer {
    baseline_size: f64,
}

impl VolumeSpikeScorer {
    pub fn new(baseline_size: f64) -> Self {
        Self {
            baseline_size: baseline_size.max(f64::EPSILON),
        }
    }
}

impl PredictiveModel for VolumeSpikeScorer {
    fn name(&self) -> &str {
        "volume_spike"
    }

    fn predict_proba(&self, features: &HashMap<String, f64>) -> f64 {
        let rolling = features
            .get(FEATURE_AVG_TRADE_SIZE)
            .copied()
            .unwrap_or(0.0)
            .max(0.0);
        let ratio = rolling / self.baseline_size;
        ratio / (ratio + 1.0)
    }
}

/// Scores the signed profit proxy directly: consistently winning entries at
/// long odds score high, losing-direction entries score low.
pub struct ProfitConsistencyScorer;

impl PredictiveModel for ProfitConsistencyScorer {
    fn name(&self) -> &str {
        "profit_consistency"
    }

    fn predict_proba(&self, features: &HashMap<String, f64>) -> f64 {
        let profit = features.get(FEATURE_PROFIT_PROXY).copied().unwrap_or(0.0);
        // profit_proxy lives in [-1, 1]; remap to [0, 1]
        ((profit + 1.0) / 2.0).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logistic_scorer_monotone_in_weighted_features() {
        let scorer = LogisticScorer::new(
            "logistic",
            HashMap::from([(FEATURE_PROFIT_PROXY.to_string(), 4.0)]),
            0.0,
        );

        let low = scorer.predict_proba(&HashMap::from([(
            FEATURE_PROFIT_PROXY.to_string(),
            -0.7,
        )]));
        let neutral = scorer.predict_proba(&HashMap::new());
        let high = scorer.predict_proba(&HashMap::from([(
            FEATURE_PROFIT_PROXY.to_string(),
            0.7,
        )]));

        assert!(low < neutral && neutral < high);
        assert!((neutral - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_volume_spike_scorer_baseline_is_midpoint() {
        let scorer = VolumeSpikeScorer::new(100.0);

        let at_baseline = scorer.predict_proba(&HashMap::from([(
            FEATURE_AVG_TRADE_SIZE.to_string(),
            100.0,
        )]));
        let spike = scorer.predict_proba(&HashMap::from([(
            FEATURE_AVG_TRADE_SIZE.to_string(),
            900.0,
        )]));

        assert!((at_baseline - 0.5).abs() < 1e-12);
        assert!((spike - 0.9).abs() < 1e-12);
        assert_eq!(scorer.predict_proba(&HashMap::new()), 0.0);
    }

    #[test]
    fn test_profit_consistency_scorer_bounds() {
        let scorer = ProfitConsistencyScorer;

        let winning = scorer.predict_proba(&HashMap::from([(
            FEATURE_PROFIT_PROXY.to_string(),
            0.7,
        )]));
        let losing = scorer.predict_proba(&HashMap::from([(
            FEATURE_PROFIT_PROXY.to_string(),
            -0.7,
        )]));

        assert!((winning - 0.85).abs() < 1e-12);
        assert!((losing - 0.15).abs() < 1e-12);
        assert_eq!(scorer.predict_proba(&HashMap::new()), 0.5);
    }
}
