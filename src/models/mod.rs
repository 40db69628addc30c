//! Predictive models: registry, concrete scorers, and ensembling

pub mod aggregator;
pub mod registry;
pub mod scorers;

pub use aggregator::{EnsembleCombiner, EnsembleScore};
pub use registry::{ModelPrediction, ModelRegistry, ModelWrapper, PredictiveModel};
