//! Temporal sequence embeddings.
//!
//! Summarizes each account's ordered trade history as a fixed-dimension
//! embedding built from a sinusoidal positional basis, then merges the
//! embedding into that account's feature vectors. Embeddings are not
//! normalized by sequence length: accounts with more trades accumulate
//! larger-magnitude embeddings.

use crate::feature_store::FeatureVector;
use crate::types::trade::TradeRecord;
use std::collections::HashMap;

/// Wavelength base for the positional basis
const POSITIONAL_BASE: f64 = 10000.0;

/// Fixed-dimension temporal embedding for one entity
#[derive(Debug, Clone)]
pub struct SequenceEmbedding {
    pub entity_id: String,
    pub values: Vec<f64>,
}

/// Encodes per-account trade sequences into positional embeddings
#[derive(Debug, Clone)]
pub struct SequenceEncoder {
    embedding_dim: usize,
}

impl SequenceEncoder {
    pub fn new(embedding_dim: usize) -> Self {
        Self { embedding_dim }
    }

    /// Group trades by account, sort each group by timestamp ascending, and
    /// sum the positional signal over each trade's position. Identical input
    /// sequences always produce identical embeddings.
    pub fn encode(&self, trades: &[TradeRecord]) -> Vec<SequenceEmbedding> {
        let mut sequences: HashMap<String, Vec<&TradeRecord>> = HashMap::new();
        for trade in trades {
            sequences
                .entry(trade.account_id.clone())
                .or_default()
                .push(trade);
        }

        sequences
            .into_iter()
            .map(|(entity_id, mut trade_seq)| {
                trade_seq.sort_by_key(|trade| trade.timestamp);
                SequenceEmbedding {
                    entity_id,
                    values: self.positional_encoding(trade_seq.len()),
                }
            })
            .collect()
    }

    /// Merge embeddings into feature vectors, one `seq_{i}` feature per
    /// embedding dimension. Vectors without a matching embedding pass
    /// through unchanged. Produces new vectors; inputs are not mutated.
    pub fn enrich(
        &self,
        features: Vec<FeatureVector>,
        embeddings: &[SequenceEmbedding],
    ) -> Vec<FeatureVector> {
        let lookup: HashMap<&str, &SequenceEmbedding> = embeddings
            .iter()
            .map(|embedding| (embedding.entity_id.as_str(), embedding))
            .collect();

        features
            .into_iter()
            .map(|vector| match lookup.get(vector.entity_id.as_str()) {
                Some(embedding) => {
                    let mut augmented = vector.features.clone();
                    for (idx, value) in embedding.values.iter().enumerate() {
                        augmented.insert(format!("seq_{}", idx), *value);
                    }
                    FeatureVector {
                        entity_id: vector.entity_id,
                        features: augmented,
                        as_of: vector.as_of,
                    }
                }
                None => vector,
            })
            .collect()
    }

    /// Standard alternating sine/cosine basis with wavelength scaling by
    /// dimension index, summed over sequence positions.
    fn positional_encoding(&self, sequence_len: usize) -> Vec<f64> {
        let mut values = vec![0.0; self.embedding_dim];
        for position in 0..sequence_len {
            for idx in 0..self.embedding_dim {
                let exponent = (2 * (idx / 2)) as f64 / self.embedding_dim as f64;
                let angle = position as f64 / POSITIONAL_BASE.powf(exponent);
                values[idx] += if idx % 2 == 0 { angle.sin() } else { angle.cos() };
            }
        }
        values
    }
}

impl Default for SequenceEncoder {
    fn default() -> Self {
        Self::new(8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn trade(id: &str, account: &str, minute: u32) -> TradeRecord {
        TradeRecord::new(
            id,
            account,
            "mkt_1",
            Utc.with_ymd_and_hms(2024, 3, 1, 10, minute, 0).unwrap(),
            "yes",
            10.0,
            0.5,
        )
    }

    #[test]
    fn test_embedding_dimension() {
        let encoder = SequenceEncoder::new(8);
        let embeddings = encoder.encode(&[trade("t1", "acct_1", 0), trade("t2", "acct_1", 1)]);

        assert_eq!(embeddings.len(), 1);
        assert_eq!(embeddings[0].values.len(), 8);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let encoder = SequenceEncoder::default();
        let trades = vec![
            trade("t1", "acct_1", 0),
            trade("t2", "acct_1", 5),
            trade("t3", "acct_1", 9),
        ];

        let first = encoder.encode(&trades);
        let second = encoder.encode(&trades);
        assert_eq!(first[0].values, second[0].values);
    }

    #[test]
    fn test_longer_sequences_accumulate_magnitude() {
        let encoder = SequenceEncoder::default();
        let short = encoder.encode(&[trade("t1", "acct_1", 0), trade("t2", "acct_1", 1)]);
        let long = encoder.encode(&[
            trade("t1", "acct_1", 0),
            trade("t2", "acct_1", 1),
            trade("t3", "acct_1", 2),
            trade("t4", "acct_1", 3),
        ]);

        // Odd (cosine) dimensions accumulate roughly one unit per position.
        assert!(long[0].values[1] > short[0].values[1]);
    }

    #[test]
    fn test_enrich_adds_sequence_features() {
        let encoder = SequenceEncoder::new(4);
        let trades = vec![trade("t1", "acct_1", 0)];
        let embeddings = encoder.encode(&trades);

        let vector = FeatureVector {
            entity_id: "acct_1".to_string(),
            features: HashMap::from([("avg_trade_size".to_string(), 10.0)]),
            as_of: trades[0].timestamp,
        };
        let enriched = encoder.enrich(vec![vector], &embeddings);

        assert_eq!(enriched[0].features.len(), 5);
        assert!(enriched[0].features.contains_key("seq_0"));
        assert!(enriched[0].features.contains_key("seq_3"));
    }

    #[test]
    fn test_enrich_passes_unmatched_vectors_through() {
        let encoder = SequenceEncoder::new(4);
        let vector = FeatureVector {
            entity_id: "acct_without_trades".to_string(),
            features: HashMap::from([("avg_trade_size".to_string(), 10.0)]),
            as_of: Utc::now(),
        };

        let enriched = encoder.enrich(vec![vector], &[]);
        assert_eq!(enriched[0].features.len(), 1);
    }
}
