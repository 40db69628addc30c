//! Model registry for heterogeneous predictive models.
//!
//! Models are held behind the [`PredictiveModel`] trait and wrapped with an
//! optional post-processing transform (e.g. calibration). The registry is
//! write-once at registration time and read-mostly during inference.

use crate::feature_store::FeatureVector;
use anyhow::{bail, Result};
use std::collections::HashMap;
use tracing::info;

/// Capability interface for predictive models: a scalar score over a
/// named-feature mapping.
pub trait PredictiveModel: Send + Sync {
    /// Stable model name used for registration and score breakdowns
    fn name(&self) -> &str;

    /// Raw score for one feature vector, nominally in [0, 1]
    fn predict_proba(&self, features: &HashMap<String, f64>) -> f64;
}

/// Post-processing transform applied to a raw model score
pub type Postprocess = Box<dyn Fn(f64) -> f64 + Send + Sync>;

/// One model's output for one entity
#[derive(Debug, Clone)]
pub struct ModelPrediction {
    pub model_name: String,
    pub entity_id: String,
    /// Final score after post-processing
    pub score: f64,
    /// Side-channel values kept for auditability (`raw_score` at minimum)
    pub metadata: HashMap<String, f64>,
}

/// Wraps a predictive model with standardized inference
pub struct ModelWrapper {
    name: String,
    model: Box<dyn PredictiveModel>,
    postprocess: Option<Postprocess>,
}

impl ModelWrapper {
    /// Wrap a model under its own name with no post-processing
    pub fn new(model: Box<dyn PredictiveModel>) -> Self {
        Self {
            name: model.name().to_string(),
            model,
            postprocess: None,
        }
    }

    /// Attach a post-processing transform (e.g. calibration)
    pub fn with_postprocess(mut self, postprocess: Postprocess) -> Self {
        self.postprocess = Some(postprocess);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Score a feature vector; the prediction carries both the final and the
    /// raw score.
    pub fn predict(&self, vector: &FeatureVector) -> ModelPrediction {
        let raw_score = self.model.predict_proba(&vector.features);
        let score = match &self.postprocess {
            Some(transform) => transform(raw_score),
            None => raw_score,
        };

        ModelPrediction {
            model_name: self.name.clone(),
            entity_id: vector.entity_id.clone(),
            score,
            metadata: HashMap::from([("raw_score".to_string(), raw_score)]),
        }
    }
}

/// Name-keyed collection of wrapped models
#[derive(Default)]
pub struct ModelRegistry {
    models: HashMap<String, ModelWrapper>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a wrapped model. Names are unique identifiers: a duplicate
    /// name is a fatal configuration error, not a latest-wins overwrite.
    pub fn register(&mut self, wrapper: ModelWrapper) -> Result<()> {
        let name = wrapper.name().to_string();
        if self.models.contains_key(&name) {
            bail!("model {} already registered", name);
        }
        info!(model = %name, "Registered model");
        self.models.insert(name, wrapper);
        Ok(())
    }

    /// Iterate registered models. Iteration order carries no meaning;
    /// ensembling downstream is commutative over model order.
    pub fn iter_models(&self) -> impl Iterator<Item = &ModelWrapper> {
        self.models.values()
    }

    pub fn get(&self, name: &str) -> Option<&ModelWrapper> {
        self.models.get(name)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    struct ConstantModel {
        name: String,
        score: f64,
    }

    impl PredictiveModel for ConstantModel {
        fn name(&self) -> &str {
            &self.name
        }

        fn predict_proba(&self, _features: &HashMap<String, f64>) -> f64 {
            self.score
        }
    }

    fn constant(name: &str, score: f64) -> ModelWrapper {
        ModelWrapper::new(Box::new(ConstantModel {
            name: name.to_string(),
            score,
        }))
    }

    fn vector(entity: &str) -> FeatureVector {
        FeatureVector {
            entity_id: entity.to_string(),
            features: HashMap::new(),
            as_of: Utc::now(),
        }
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = ModelRegistry::new();
        registry.register(constant("momentum", 0.5)).unwrap();

        let err = registry.register(constant("momentum", 0.9)).unwrap_err();
        assert!(err.to_string().contains("already registered"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_prediction_carries_raw_score() {
        let wrapper = constant("momentum", 0.4).with_postprocess(Box::new(|raw| raw * 2.0));
        let prediction = wrapper.predict(&vector("acct_1"));

        assert_eq!(prediction.score, 0.8);
        assert_eq!(prediction.metadata["raw_score"], 0.4);
        assert_eq!(prediction.entity_id, "acct_1");
        assert_eq!(prediction.model_name, "momentum");
    }

    #[test]
    fn test_prediction_without_postprocess() {
        let prediction = constant("momentum", 0.4).predict(&vector("acct_1"));
        assert_eq!(prediction.score, 0.4);
        assert_eq!(prediction.metadata["raw_score"], 0.4);
    }
}
