//! Alert classification and dispatch.
//!
//! Maps combined ensemble scores to severity tiers and emits alert records.
//! Info is an internal tier, not an alert: entities classifying as info are
//! dropped before emission. Dispatch appends to the dispatcher's observable
//! sink; actual downstream delivery is a collaborator concern.

use crate::models::aggregator::EnsembleScore;
use crate::types::alert::{Alert, Severity, SeverityThresholds};
use tracing::info;

/// Creates and collects alerts from ensemble scores
#[derive(Debug, Default)]
pub struct AlertDispatcher {
    thresholds: SeverityThresholds,
    sent_alerts: Vec<Alert>,
}

impl AlertDispatcher {
    pub fn new(thresholds: SeverityThresholds) -> Self {
        Self {
            thresholds,
            sent_alerts: Vec::new(),
        }
    }

    /// Classify each score and build alert records, excluding the info tier
    pub fn create_alerts(&self, scores: &[EnsembleScore]) -> Vec<Alert> {
        scores
            .iter()
            .filter_map(|score| {
                let severity = Severity::from_score(score.score, &self.thresholds);
                if severity == Severity::Info {
                    return None;
                }
                let message = format!(
                    "Account {} flagged with severity {} (score={:.2}).",
                    score.entity_id,
                    severity.as_str(),
                    score.score
                );
                Some(Alert::new(
                    score.entity_id.clone(),
                    score.score,
                    severity,
                    message,
                ))
            })
            .collect()
    }

    /// Append alerts to the sent sink
    pub fn dispatch(&mut self, alerts: &[Alert]) {
        if !alerts.is_empty() {
            info!(count = alerts.len(), "Dispatched alerts");
        }
        self.sent_alerts.extend_from_slice(alerts);
    }

    /// All alerts dispatched through this dispatcher so far
    pub fn sent_alerts(&self) -> &[Alert] {
        &self.sent_alerts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn score(entity: &str, value: f64) -> EnsembleScore {
        EnsembleScore {
            entity_id: entity.to_string(),
            score: value,
            breakdown: HashMap::new(),
        }
    }

    #[test]
    fn test_info_tier_is_never_emitted() {
        let dispatcher = AlertDispatcher::default();
        let alerts = dispatcher.create_alerts(&[
            score("acct_critical", 0.95),
            score("acct_high", 0.75),
            score("acct_medium", 0.55),
            score("acct_info", 0.49999),
        ]);

        assert_eq!(alerts.len(), 3);
        assert!(alerts.iter().all(|a| a.entity_id != "acct_info"));
        assert!(alerts.iter().all(|a| a.severity != Severity::Info));
    }

    #[test]
    fn test_alert_message_formatting() {
        let dispatcher = AlertDispatcher::default();
        let alerts = dispatcher.create_alerts(&[score("acct_7", 0.914)]);

        assert_eq!(alerts[0].severity, Severity::Critical);
        assert_eq!(
            alerts[0].message,
            "Account acct_7 flagged with severity critical (score=0.91)."
        );
    }

    #[test]
    fn test_dispatch_accumulates_in_sink() {
        let mut dispatcher = AlertDispatcher::default();
        let first = dispatcher.create_alerts(&[score("acct_1", 0.8)]);
        dispatcher.dispatch(&first);
        let second = dispatcher.create_alerts(&[score("acct_2", 0.95)]);
        dispatcher.dispatch(&second);

        assert_eq!(dispatcher.sent_alerts().len(), 2);
        assert_eq!(dispatcher.sent_alerts()[0].entity_id, "acct_1");
        assert_eq!(dispatcher.sent_alerts()[1].entity_id, "acct_2");
    }
}
