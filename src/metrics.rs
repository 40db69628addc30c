//! Runtime statistics for the detection pipeline.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector shared across the processing loop
pub struct PipelineMetrics {
    /// Total trades scored
    pub trades_scored: AtomicU64,
    /// Total inference runs executed
    pub runs_executed: AtomicU64,
    /// Total alerts generated
    pub alerts_generated: AtomicU64,
    /// Alerts by severity tier
    alerts_by_severity: RwLock<HashMap<String, u64>>,
    /// Per-run wall times (microseconds)
    run_times: RwLock<Vec<u64>>,
    /// Combined-score distribution buckets [0.0-0.1) .. [0.9-1.0]
    score_buckets: RwLock<[u64; 10]>,
    /// Model agreement samples (1 - score std dev per entity)
    model_agreements: RwLock<Vec<f64>>,
    /// Start time for throughput calculation
    start_time: Instant,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            trades_scored: AtomicU64::new(0),
            runs_executed: AtomicU64::new(0),
            alerts_generated: AtomicU64::new(0),
            alerts_by_severity: RwLock::new(HashMap::new()),
            run_times: RwLock::new(Vec::with_capacity(1000)),
            score_buckets: RwLock::new([0; 10]),
            model_agreements: RwLock::new(Vec::with_capacity(1000)),
            start_time: Instant::now(),
        }
    }

    /// Record one completed inference run
    pub fn record_run(&self, trades: u64, wall_time: Duration) {
        self.runs_executed.fetch_add(1, Ordering::Relaxed);
        self.trades_scored.fetch_add(trades, Ordering::Relaxed);

        if let Ok(mut times) = self.run_times.write() {
            times.push(wall_time.as_micros() as u64);
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }
    }

    /// Record one entity's combined score
    pub fn record_score(&self, score: f64) {
        let bucket = ((score * 10.0).max(0.0)).min(9.0) as usize;
        if let Ok(mut buckets) = self.score_buckets.write() {
            buckets[bucket] += 1;
        }
    }

    /// Record an emitted alert
    pub fn record_alert(&self, severity: &str) {
        self.alerts_generated.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut by_severity) = self.alerts_by_severity.write() {
            *by_severity.entry(severity.to_string()).or_insert(0) += 1;
        }
    }

    /// Record how much the models agreed on one entity (1 - std dev of its
    /// score breakdown, floored at zero)
    pub fn record_model_agreement(&self, model_scores: &HashMap<String, f64>) {
        if model_scores.len() < 2 {
            return;
        }

        let scores: Vec<f64> = model_scores.values().copied().collect();
        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        let variance =
            scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / scores.len() as f64;
        let agreement = 1.0 - variance.sqrt().min(1.0);

        if let Ok(mut agreements) = self.model_agreements.write() {
            agreements.push(agreement);
            if agreements.len() > 1000 {
                agreements.drain(0..500);
            }
        }
    }

    /// Run wall-time statistics
    pub fn get_run_stats(&self) -> RunStats {
        let times = self.run_times.read().unwrap();
        if times.is_empty() {
            return RunStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort_unstable();

        let count = sorted.len();
        RunStats {
            count: count as u64,
            mean_us: sorted.iter().sum::<u64>() / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            max_us: *sorted.last().unwrap_or(&0),
        }
    }

    /// Average model agreement across recorded entities
    pub fn get_avg_agreement(&self) -> f64 {
        let agreements = self.model_agreements.read().unwrap();
        if agreements.is_empty() {
            return 0.0;
        }
        agreements.iter().sum::<f64>() / agreements.len() as f64
    }

    /// Trades scored per second since startup
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.trades_scored.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn get_score_distribution(&self) -> [u64; 10] {
        *self.score_buckets.read().unwrap()
    }

    pub fn get_alerts_by_severity(&self) -> HashMap<String, u64> {
        self.alerts_by_severity.read().unwrap().clone()
    }

    /// Log a summary of everything recorded so far
    pub fn print_summary(&self) {
        let trade_count = self.trades_scored.load(Ordering::Relaxed);
        let run_count = self.runs_executed.load(Ordering::Relaxed);
        let alert_count = self.alerts_generated.load(Ordering::Relaxed);
        let run_stats = self.get_run_stats();

        info!("================ detection pipeline summary ================");
        info!(
            "runs={} trades={} alerts={} throughput={:.1} trades/s",
            run_count,
            trade_count,
            alert_count,
            self.get_throughput()
        );
        info!(
            "run wall time (us): mean={} p50={} p95={} max={}",
            run_stats.mean_us, run_stats.p50_us, run_stats.p95_us, run_stats.max_us
        );
        info!(
            "model agreement: {:.1}%",
            self.get_avg_agreement() * 100.0
        );

        let by_severity = self.get_alerts_by_severity();
        for (severity, count) in &by_severity {
            let pct = if alert_count > 0 {
                (*count as f64 / alert_count as f64) * 100.0
            } else {
                0.0
            };
            info!("alerts[{}]: {} ({:.1}%)", severity, count, pct);
        }

        let distribution = self.get_score_distribution();
        let total: u64 = distribution.iter().sum();
        if total > 0 {
            for (i, &count) in distribution.iter().enumerate() {
                let pct = (count as f64 / total as f64) * 100.0;
                info!(
                    "scores[{:.1}-{:.1}): {} ({:.1}%)",
                    i as f64 / 10.0,
                    (i + 1) as f64 / 10.0,
                    count,
                    pct
                );
            }
        }
        info!("============================================================");
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Inference-run wall-time statistics
#[derive(Debug, Default)]
pub struct RunStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub max_us: u64,
}

/// Periodically logs the metrics summary
pub struct MetricsReporter {
    metrics: std::sync::Arc<PipelineMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: std::sync::Arc<PipelineMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_and_alert_recording() {
        let metrics = PipelineMetrics::new();

        metrics.record_run(50, Duration::from_micros(800));
        metrics.record_run(30, Duration::from_micros(1200));
        metrics.record_alert("high");
        metrics.record_alert("critical");
        metrics.record_alert("high");

        assert_eq!(metrics.trades_scored.load(Ordering::Relaxed), 80);
        assert_eq!(metrics.runs_executed.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.alerts_generated.load(Ordering::Relaxed), 3);
        assert_eq!(metrics.get_alerts_by_severity()["high"], 2);
        assert_eq!(metrics.get_run_stats().count, 2);
    }

    #[test]
    fn test_score_buckets() {
        let metrics = PipelineMetrics::new();

        metrics.record_score(0.05);
        metrics.record_score(0.95);
        metrics.record_score(1.0);

        let distribution = metrics.get_score_distribution();
        assert_eq!(distribution[0], 1);
        assert_eq!(distribution[9], 2);
    }

    #[test]
    fn test_model_agreement_high_when_scores_cluster() {
        let metrics = PipelineMetrics::new();

        let mut scores = HashMap::new();
        scores.insert("model_a".to_string(), 0.80);
        scores.insert("model_b".to_string(), 0.82);
        scores.insert("model_c".to_string(), 0.79);
        metrics.record_model_agreement(&scores);

        assert!(metrics.get_avg_agreement() > 0.9);
    }
}
