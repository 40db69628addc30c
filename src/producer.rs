//! NATS message producer for alerts

use crate::types::alert::Alert;
use anyhow::Result;
use async_nats::Client;
use tracing::{debug, error};

/// Producer for publishing alerts to NATS
#[derive(Clone)]
pub struct AlertProducer {
    client: Client,
    subject: String,
}

impl AlertProducer {
    /// Create a new alert producer
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Publish a single alert
    pub async fn publish(&self, alert: &Alert) -> Result<()> {
        let payload = serde_json::to_vec(alert)?;

        self.client
            .publish(self.subject.clone(), payload.into())
            .await?;

        debug!(
            alert_id = %alert.alert_id,
            entity_id = %alert.entity_id,
            severity = %alert.severity.as_str(),
            score = alert.score,
            "Published alert"
        );

        Ok(())
    }

    /// Publish a batch of alerts, logging and continuing past individual
    /// failures
    pub async fn publish_batch(&self, alerts: &[Alert]) -> Result<()> {
        for alert in alerts {
            if let Err(e) = self.publish(alert).await {
                error!(
                    alert_id = %alert.alert_id,
                    error = %e,
                    "Failed to publish alert"
                );
            }
        }
        Ok(())
    }

    /// Get the subject name
    pub fn subject(&self) -> &str {
        &self.subject
    }
}

#[cfg(test)]
mod tests {
    // Integration tests would require a running NATS server
}
