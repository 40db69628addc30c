//! Configuration management for the detection pipeline

use crate::types::alert::SeverityThresholds;
use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    pub detection: DetectionConfig,
    pub ensemble: EnsembleConfig,
    pub sequence: SequenceConfig,
    pub graph: GraphConfig,
    pub anomaly: AnomalyConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject for incoming trade records
    pub trade_subject: String,
    /// Subject for outgoing alerts
    pub alert_subject: String,
}

/// Detection and alerting configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionConfig {
    /// Severity tier breakpoints
    pub severity: SeverityThresholds,
    /// Restrict inference to these markets; empty means all markets
    #[serde(default)]
    pub markets_of_interest: Vec<String>,
}

/// Ensemble configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EnsembleConfig {
    /// Model weights for the weighted average; empty means unweighted mean
    #[serde(default)]
    pub weights: HashMap<String, f64>,
}

/// Sequence encoder configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SequenceConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Embedding dimension for temporal encodings
    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,
}

/// Coordination graph configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Co-trading weight threshold for edge inclusion
    #[serde(default = "default_graph_threshold")]
    pub threshold: f64,
}

/// Anomaly engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AnomalyConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Baseline mean trade size for the z-score detector
    #[serde(default = "default_baseline_size")]
    pub baseline_trade_size: f64,
    /// Baseline standard deviation of trade size
    #[serde(default = "default_baseline_std")]
    pub baseline_trade_size_std: f64,
}

/// Processing loop configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Trades buffered before an inference run is triggered
    pub batch_size: usize,
    /// Maximum milliseconds between runs when trades trickle in
    pub flush_interval_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

fn default_true() -> bool {
    true
}

fn default_embedding_dim() -> usize {
    8
}

fn default_graph_threshold() -> f64 {
    0.7
}

fn default_baseline_size() -> f64 {
    100.0
}

fn default_baseline_std() -> f64 {
    50.0
}

impl AppConfig {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                trade_subject: "trades".to_string(),
                alert_subject: "insider.alerts".to_string(),
            },
            detection: DetectionConfig {
                severity: SeverityThresholds::default(),
                markets_of_interest: Vec::new(),
            },
            ensemble: EnsembleConfig {
                weights: HashMap::new(),
            },
            sequence: SequenceConfig {
                enabled: true,
                embedding_dim: default_embedding_dim(),
            },
            graph: GraphConfig {
                enabled: true,
                threshold: default_graph_threshold(),
            },
            anomaly: AnomalyConfig {
                enabled: true,
                baseline_trade_size: default_baseline_size(),
                baseline_trade_size_std: default_baseline_std(),
            },
            pipeline: PipelineConfig {
                batch_size: 256,
                flush_interval_ms: 1000,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "json".to_string(),
            },
        }
    }
}
