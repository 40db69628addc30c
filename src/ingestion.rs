//! Trade sourcing seam.
//!
//! The pipeline consumes trades through [`TradeSource`]; where they come
//! from (NATS, files, fixtures) is the collaborator's business. Sources are
//! fanned in by [`DataIngestion`].

use crate::types::trade::TradeRecord;
use std::sync::{Arc, Mutex};

/// Produces the batch of trades an inference run should process
pub trait TradeSource: Send + Sync {
    fn recent_trades(&self) -> Vec<TradeRecord>;
}

impl<T: TradeSource + ?Sized> TradeSource for Arc<T> {
    fn recent_trades(&self) -> Vec<TradeRecord> {
        (**self).recent_trades()
    }
}

/// Fans multiple trade sources into one batch
#[derive(Default)]
pub struct DataIngestion {
    sources: Vec<Box<dyn TradeSource>>,
}

impl DataIngestion {
    pub fn new(sources: Vec<Box<dyn TradeSource>>) -> Self {
        Self { sources }
    }

    /// Materialize the current batch across all sources, in source order
    pub fn snapshot_trades(&self) -> Vec<TradeRecord> {
        self.sources
            .iter()
            .flat_map(|source| source.recent_trades())
            .collect()
    }
}

/// Fixed batch of trades; every call returns the same records.
/// Useful for replays and tests.
pub struct StaticTradeSource {
    trades: Vec<TradeRecord>,
}

impl StaticTradeSource {
    pub fn new(trades: Vec<TradeRecord>) -> Self {
        Self { trades }
    }
}

impl TradeSource for StaticTradeSource {
    fn recent_trades(&self) -> Vec<TradeRecord> {
        self.trades.clone()
    }
}

/// Mutex-guarded queue a streaming collaborator appends to; each
/// `recent_trades` call drains the queue, so a trade is processed by exactly
/// one run.
#[derive(Default)]
pub struct BufferedTradeSource {
    buffer: Mutex<Vec<TradeRecord>>,
}

impl BufferedTradeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, trade: TradeRecord) {
        self.buffer.lock().expect("trade buffer poisoned").push(trade);
    }

    pub fn len(&self) -> usize {
        self.buffer.lock().expect("trade buffer poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TradeSource for BufferedTradeSource {
    fn recent_trades(&self) -> Vec<TradeRecord> {
        std::mem::take(&mut *self.buffer.lock().expect("trade buffer poisoned"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn trade(id: &str) -> TradeRecord {
        TradeRecord::new(id, "acct_1", "mkt_1", Utc::now(), "yes", 10.0, 0.5)
    }

    #[test]
    fn test_snapshot_fans_in_all_sources() {
        let ingestion = DataIngestion::new(vec![
            Box::new(StaticTradeSource::new(vec![trade("t1"), trade("t2")])),
            Box::new(StaticTradeSource::new(vec![trade("t3")])),
        ]);

        let trades = ingestion.snapshot_trades();
        assert_eq!(trades.len(), 3);
        assert_eq!(trades[2].trade_id, "t3");
    }

    #[test]
    fn test_buffered_source_drains_on_read() {
        let buffer = Arc::new(BufferedTradeSource::new());
        buffer.push(trade("t1"));
        buffer.push(trade("t2"));

        assert_eq!(buffer.recent_trades().len(), 2);
        assert!(buffer.recent_trades().is_empty());
        assert!(buffer.is_empty());
    }
}
