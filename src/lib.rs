//! Insider Detection Pipeline Library
//!
//! Scores prediction-market trading accounts for signs of coordinated or
//! informed activity by fusing engineered behavioral features, temporal
//! sequence embeddings, multi-model predictions, anomaly scores, and a
//! wallet-coordination graph into severity-tiered alerts.

pub mod alerts;
pub mod anomaly;
pub mod config;
pub mod consumer;
pub mod evaluation;
pub mod explain;
pub mod feature_store;
pub mod graph;
pub mod ingestion;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod producer;
pub mod sequence;
pub mod types;

pub use alerts::AlertDispatcher;
pub use config::AppConfig;
pub use consumer::TradeConsumer;
pub use feature_store::FeatureStore;
pub use models::{EnsembleCombiner, ModelRegistry};
pub use pipeline::DetectionPipeline;
pub use producer::AlertProducer;
pub use types::{Alert, Severity, TradeRecord};
