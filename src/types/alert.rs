//! Alert data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity tier for a combined risk score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Classify a combined score against the configured breakpoints,
    /// evaluated highest-first.
    pub fn from_score(score: f64, thresholds: &SeverityThresholds) -> Self {
        if score >= thresholds.critical {
            Severity::Critical
        } else if score >= thresholds.high {
            Severity::High
        } else if score >= thresholds.medium {
            Severity::Medium
        } else {
            Severity::Info
        }
    }

    /// Lowercase label used in alert messages and metrics keys
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

/// Configurable severity breakpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeverityThresholds {
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            medium: 0.5,
            high: 0.7,
            critical: 0.9,
        }
    }
}

/// Alert emitted for an account whose combined score cleared the medium tier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    /// Unique alert identifier
    pub alert_id: String,

    /// Flagged trading account
    pub entity_id: String,

    /// Combined score that triggered the alert
    pub score: f64,

    /// Severity tier; never `Info` for an emitted alert
    pub severity: Severity,

    /// Human-readable summary line
    pub message: String,

    /// Alert generation timestamp
    pub timestamp: DateTime<Utc>,
}

impl Alert {
    /// Create a new alert
    pub fn new(entity_id: String, score: f64, severity: Severity, message: String) -> Self {
        Self {
            alert_id: uuid::Uuid::new_v4().to_string(),
            entity_id,
            score,
            severity,
            message,
            timestamp: Utc::now(),
        }
    }
}
