//! Test Trade Producer
//!
//! Generates and publishes synthetic prediction-market trades to NATS for
//! pipeline testing. A configurable fraction of trades are emitted as
//! coordinated bursts: several accounts hitting the same market, outcome,
//! and size within seconds of each other.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Trade structure matching the pipeline's expected format
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TradeRecord {
    trade_id: String,
    account_id: String,
    market_id: String,
    timestamp: DateTime<Utc>,
    outcome: String,
    size: f64,
    price: f64,
}

/// Synthetic trade generator
struct TradeGenerator {
    rng: rand::rngs::ThreadRng,
    trade_counter: u64,
}

impl TradeGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            trade_counter: 0,
        }
    }

    /// Generate a single unremarkable trade
    fn generate_normal(&mut self) -> TradeRecord {
        self.trade_counter += 1;

        TradeRecord {
            trade_id: format!("t_{:012}", self.trade_counter),
            account_id: format!("acct_{}", self.rng.gen_range(1..500)),
            market_id: format!("mkt_{}", self.rng.gen_range(1..40)),
            timestamp: Utc::now(),
            outcome: self.random_choice(&["yes", "no"]).to_string(),
            size: self.rng.gen_range(5.0..300.0),
            price: self.rng.gen_range(0.05..0.95),
        }
    }

    /// Generate a burst of near-identical trades from a small account
    /// cluster, the pattern the coordination graph is built to catch
    fn generate_coordinated_burst(&mut self) -> Vec<TradeRecord> {
        let market_id = format!("mkt_{}", self.rng.gen_range(1..40));
        let outcome = self.random_choice(&["yes", "no"]).to_string();
        let size = self.rng.gen_range(500.0..2000.0);
        let price = self.rng.gen_range(0.05..0.3);
        let cluster_base = self.rng.gen_range(1000..2000);
        let accounts = self.rng.gen_range(2..5);

        (0..accounts)
            .map(|i| {
                self.trade_counter += 1;
                TradeRecord {
                    trade_id: format!("t_{:012}", self.trade_counter),
                    account_id: format!("acct_{}", cluster_base + i),
                    market_id: market_id.clone(),
                    timestamp: Utc::now(),
                    outcome: outcome.clone(),
                    size,
                    price,
                }
            })
            .collect()
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("trade_producer=info".parse()?),
        )
        .init();

    info!("Starting Test Trade Producer");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let nats_url = args
        .get(1)
        .map(|s| s.as_str())
        .unwrap_or("nats://localhost:4222");
    let subject = args.get(2).map(|s| s.as_str()).unwrap_or("trades");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(100);
    let burst_rate: f64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(0.1);
    let delay_ms: u64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        burst_rate = burst_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    // Connect to NATS
    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            return run_dry_mode(count, burst_rate, delay_ms).await;
        }
    };

    // Generate and publish trades
    let mut generator = TradeGenerator::new();
    let mut rng = rand::thread_rng();

    info!("Starting to publish {} trade batches...", count);

    let mut normal_count = 0u64;
    let mut coordinated_count = 0u64;

    for i in 0..count {
        let trades = if rng.gen_bool(burst_rate) {
            let burst = generator.generate_coordinated_burst();
            coordinated_count += burst.len() as u64;
            burst
        } else {
            normal_count += 1;
            vec![generator.generate_normal()]
        };

        for trade in &trades {
            let payload = serde_json::to_vec(trade)?;
            client.publish(subject.to_string(), payload.into()).await?;
        }

        if (i + 1) % 10 == 0 {
            info!(
                "Published {}/{} batches ({} normal, {} coordinated trades)",
                i + 1,
                count,
                normal_count,
                coordinated_count
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(
        "Completed! Published {} normal and {} coordinated trades",
        normal_count, coordinated_count
    );

    Ok(())
}

async fn run_dry_mode(count: u64, burst_rate: f64, delay_ms: u64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no NATS connection)");

    let mut generator = TradeGenerator::new();
    let mut rng = rand::thread_rng();

    for i in 0..count {
        let trades = if rng.gen_bool(burst_rate) {
            generator.generate_coordinated_burst()
        } else {
            vec![generator.generate_normal()]
        };

        if (i + 1) % 10 == 0 || i == 0 {
            let json = serde_json::to_string_pretty(&trades[0])?;
            info!("Sample trade {}:\n{}", i + 1, json);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
