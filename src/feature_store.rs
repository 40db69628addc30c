//! Feature computation and storage.
//!
//! Turns raw trade records into per-trade feature vectors using rolling
//! per-account statistics. The store keeps a feature history per account, so
//! repeated calls are cumulative: the rolling average of trade size depends
//! on every earlier trade the store has seen for that account. Callers must
//! therefore feed an account's trades in chronological order.

use crate::types::trade::TradeRecord;
use chrono::{DateTime, Timelike, Utc};
use std::collections::HashMap;
use tracing::debug;

/// Feature name for the exponential moving average of trade size
pub const FEATURE_AVG_TRADE_SIZE: &str = "avg_trade_size";
/// Feature name for the signed profit proxy
pub const FEATURE_PROFIT_PROXY: &str = "profit_proxy";
/// Feature name for the time-to-resolution proxy
pub const FEATURE_TIME_TO_RESOLUTION: &str = "time_to_resolution_est";

/// Outcome labels treated as the winning direction, matched case-insensitively
const WINNING_OUTCOMES: [&str; 2] = ["yes", "win"];

/// Computed features for one entity at one point in time
#[derive(Debug, Clone)]
pub struct FeatureVector {
    /// Account the features describe
    pub entity_id: String,
    /// Named feature values
    pub features: HashMap<String, f64>,
    /// Timestamp the features are "as of"
    pub as_of: DateTime<Utc>,
}

/// In-memory feature store with a per-account history
#[derive(Debug, Default)]
pub struct FeatureStore {
    storage: HashMap<String, Vec<FeatureVector>>,
}

impl FeatureStore {
    /// Create an empty feature store
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute one feature vector per trade record, in input order.
    ///
    /// Each vector is appended to the account's history as it is computed, so
    /// the rolling average within a batch sees the earlier trades of the same
    /// batch as well as prior calls.
    pub fn compute_features(&mut self, trades: &[TradeRecord]) -> Vec<FeatureVector> {
        let mut computed = Vec::with_capacity(trades.len());

        for trade in trades {
            let mut features = HashMap::new();
            features.insert(
                FEATURE_AVG_TRADE_SIZE.to_string(),
                self.rolling_average(&trade.account_id, trade.size),
            );
            features.insert(FEATURE_PROFIT_PROXY.to_string(), profit_proxy(trade));
            features.insert(
                FEATURE_TIME_TO_RESOLUTION.to_string(),
                time_to_resolution_proxy(trade),
            );

            let vector = FeatureVector {
                entity_id: trade.account_id.clone(),
                features,
                as_of: trade.timestamp,
            };
            self.storage
                .entry(trade.account_id.clone())
                .or_default()
                .push(vector.clone());
            computed.push(vector);
        }

        debug!(
            trades = trades.len(),
            accounts = self.storage.len(),
            "Computed feature vectors"
        );
        computed
    }

    /// Most recent feature vector for an entity; read-only lookup
    pub fn latest_features(&self, entity_id: &str) -> Option<&FeatureVector> {
        self.storage.get(entity_id).and_then(|vectors| vectors.last())
    }

    /// Exponential moving average with smoothing factor 0.5.
    ///
    /// With no prior history the average is the current value itself.
    fn rolling_average(&self, account_id: &str, new_value: f64) -> f64 {
        let last = self
            .storage
            .get(account_id)
            .and_then(|history| history.last())
            .and_then(|vector| vector.features.get(FEATURE_AVG_TRADE_SIZE))
            .copied();

        match last {
            Some(previous) => 0.5 * previous + 0.5 * new_value,
            None => new_value,
        }
    }
}

/// Signed profitability proxy: +(1 - price) for winning-direction trades,
/// -(1 - price) otherwise.
fn profit_proxy(trade: &TradeRecord) -> f64 {
    let outcome = trade.outcome.to_lowercase();
    let direction = if WINNING_OUTCOMES.contains(&outcome.as_str()) {
        1.0
    } else {
        -1.0
    };
    direction * (1.0 - trade.price)
}

/// Crude stand-in for true time-to-resolution: seconds elapsed since midnight
/// of the trade's timestamp, floored at 1.0.
fn time_to_resolution_proxy(trade: &TradeRecord) -> f64 {
    let seconds = trade.timestamp.time().num_seconds_from_midnight() as f64;
    seconds.max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn trade(account: &str, size: f64, price: f64, outcome: &str) -> TradeRecord {
        TradeRecord::new(
            "t_1",
            account,
            "mkt_1",
            Utc.with_ymd_and_hms(2024, 3, 1, 14, 30, 0).unwrap(),
            outcome,
            size,
            price,
        )
    }

    #[test]
    fn test_rolling_average_first_trade_equals_size() {
        let mut store = FeatureStore::new();
        let vectors = store.compute_features(&[trade("acct_1", 100.0, 0.5, "yes")]);

        assert_eq!(vectors.len(), 1);
        assert_eq!(vectors[0].features[FEATURE_AVG_TRADE_SIZE], 100.0);
    }

    #[test]
    fn test_rolling_average_second_trade_blends() {
        let mut store = FeatureStore::new();
        store.compute_features(&[trade("acct_1", 100.0, 0.5, "yes")]);
        let vectors = store.compute_features(&[trade("acct_1", 300.0, 0.5, "yes")]);

        // 0.5 * 100 + 0.5 * 300
        assert_eq!(vectors[0].features[FEATURE_AVG_TRADE_SIZE], 200.0);
    }

    #[test]
    fn test_rolling_average_cumulative_within_batch() {
        let mut store = FeatureStore::new();
        let vectors = store.compute_features(&[
            trade("acct_1", 100.0, 0.5, "yes"),
            trade("acct_1", 300.0, 0.5, "yes"),
        ]);

        assert_eq!(vectors[1].features[FEATURE_AVG_TRADE_SIZE], 200.0);
    }

    #[test]
    fn test_profit_proxy_sign() {
        let mut store = FeatureStore::new();
        let vectors = store.compute_features(&[
            trade("acct_1", 10.0, 0.3, "YES"),
            trade("acct_2", 10.0, 0.3, "no"),
        ]);

        assert!((vectors[0].features[FEATURE_PROFIT_PROXY] - 0.7).abs() < 1e-12);
        assert!((vectors[1].features[FEATURE_PROFIT_PROXY] + 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_time_to_resolution_floor() {
        let mut store = FeatureStore::new();
        let midnight_trade = TradeRecord::new(
            "t_1",
            "acct_1",
            "mkt_1",
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            "yes",
            10.0,
            0.5,
        );
        let vectors = store.compute_features(&[midnight_trade]);

        assert_eq!(vectors[0].features[FEATURE_TIME_TO_RESOLUTION], 1.0);
    }

    #[test]
    fn test_latest_features_lookup() {
        let mut store = FeatureStore::new();
        store.compute_features(&[trade("acct_1", 100.0, 0.5, "yes")]);
        store.compute_features(&[trade("acct_1", 300.0, 0.5, "yes")]);

        let latest = store.latest_features("acct_1").unwrap();
        assert_eq!(latest.features[FEATURE_AVG_TRADE_SIZE], 200.0);
        assert!(store.latest_features("acct_unknown").is_none());
    }
}
