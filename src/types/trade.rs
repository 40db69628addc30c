//! Trade data structures for insider activity detection

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents a single trade on a prediction-market venue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Unique trade identifier
    pub trade_id: String,

    /// Trading account that placed the trade
    pub account_id: String,

    /// Market the trade was placed in
    pub market_id: String,

    /// Execution timestamp
    pub timestamp: DateTime<Utc>,

    /// Outcome label the trade was placed on (e.g. "yes", "no")
    pub outcome: String,

    /// Trade size in contracts; non-negative
    pub size: f64,

    /// Execution price in [0, 1]
    pub price: f64,
}

impl TradeRecord {
    /// Create a new trade record
    pub fn new(
        trade_id: impl Into<String>,
        account_id: impl Into<String>,
        market_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        outcome: impl Into<String>,
        size: f64,
        price: f64,
    ) -> Self {
        Self {
            trade_id: trade_id.into(),
            account_id: account_id.into(),
            market_id: market_id.into(),
            timestamp,
            outcome: outcome.into(),
            size,
            price,
        }
    }
}
