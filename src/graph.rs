//! Wallet coordination graph.
//!
//! Builds a weighted, undirected account-relationship graph from co-trading
//! patterns within each market, then extracts connected components as proxy
//! communities. Pairwise weighting is quadratic per market; markets never
//! interact, so the partition is the natural unit of work.

use crate::types::trade::TradeRecord;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::debug;

/// Default inclusion threshold for co-trading weights
pub const DEFAULT_COORDINATION_THRESHOLD: f64 = 0.7;

/// Directed half of an undirected weighted edge; the graph stores both halves
#[derive(Debug, Clone, PartialEq)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub weight: f64,
}

/// Adjacency mapping from account to its outgoing edges, symmetric by
/// construction
pub type WalletGraph = HashMap<String, Vec<GraphEdge>>;

/// Builds and analyzes wallet relationship graphs
#[derive(Debug, Clone)]
pub struct CoordinationGraph {
    threshold: f64,
}

impl CoordinationGraph {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Accumulate co-trading weights for every unordered trade pair within
    /// each market. Pairs at or above the threshold contribute their weight
    /// symmetrically to both accounts; qualifying pairs across different
    /// markets sum rather than overwrite.
    pub fn build_wallet_graph(&self, trades: &[TradeRecord]) -> WalletGraph {
        let mut trades_by_market: HashMap<&str, Vec<&TradeRecord>> = HashMap::new();
        for trade in trades {
            trades_by_market
                .entry(trade.market_id.as_str())
                .or_default()
                .push(trade);
        }

        let mut adjacency: HashMap<String, HashMap<String, f64>> = HashMap::new();
        for market_trades in trades_by_market.values() {
            for (i, trade_i) in market_trades.iter().enumerate() {
                for trade_j in &market_trades[i + 1..] {
                    let weight = co_trading_weight(trade_i, trade_j);
                    if weight >= self.threshold {
                        *adjacency
                            .entry(trade_i.account_id.clone())
                            .or_default()
                            .entry(trade_j.account_id.clone())
                            .or_insert(0.0) += weight;
                        *adjacency
                            .entry(trade_j.account_id.clone())
                            .or_default()
                            .entry(trade_i.account_id.clone())
                            .or_insert(0.0) += weight;
                    }
                }
            }
        }

        debug!(
            markets = trades_by_market.len(),
            nodes = adjacency.len(),
            "Built wallet graph"
        );

        adjacency
            .into_iter()
            .map(|(node, edges)| {
                let edges = edges
                    .into_iter()
                    .map(|(target, weight)| GraphEdge {
                        source: node.clone(),
                        target,
                        weight,
                    })
                    .collect();
                (node, edges)
            })
            .collect()
    }

    /// Connected components via breadth-first traversal. Any edge present in
    /// the graph counts as connectivity regardless of its accumulated weight;
    /// weight only gated inclusion at build time. Accounts with no edges
    /// never appear in any community.
    pub fn detect_communities(&self, graph: &WalletGraph) -> Vec<HashSet<String>> {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut communities = Vec::new();

        for node in graph.keys() {
            if visited.contains(node.as_str()) {
                continue;
            }

            let mut community = HashSet::new();
            let mut queue: VecDeque<&str> = VecDeque::from([node.as_str()]);
            visited.insert(node.as_str());

            while let Some(current) = queue.pop_front() {
                community.insert(current.to_string());
                if let Some(edges) = graph.get(current) {
                    for edge in edges {
                        if visited.insert(edge.target.as_str()) {
                            queue.push_back(edge.target.as_str());
                        }
                    }
                }
            }
            communities.push(community);
        }

        communities
    }
}

impl Default for CoordinationGraph {
    fn default() -> Self {
        Self::new(DEFAULT_COORDINATION_THRESHOLD)
    }
}

/// Co-trading weight for one unordered trade pair:
/// direction match × size similarity, decayed by the time gap in seconds.
/// Size similarity normalizes by the larger size, clamped at 1.0 so a pair
/// of zero-size trades divides by one rather than zero.
fn co_trading_weight(a: &TradeRecord, b: &TradeRecord) -> f64 {
    let same_direction = if a.outcome == b.outcome { 1.0 } else { 0.5 };
    let size_similarity = 1.0 - (a.size - b.size).abs() / a.size.max(b.size).max(1.0);
    let time_gap = (a.timestamp - b.timestamp).num_seconds().abs() as f64 + 1.0;
    same_direction * size_similarity / time_gap
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn trade(id: &str, account: &str, market: &str, second: u32, outcome: &str, size: f64) -> TradeRecord {
        TradeRecord::new(
            id,
            account,
            market,
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, second).unwrap(),
            outcome,
            size,
            0.5,
        )
    }

    #[test]
    fn test_simultaneous_identical_trades_create_mutual_edge() {
        let graph_builder = CoordinationGraph::default();
        let trades = vec![
            trade("t1", "acct_a", "mkt_1", 0, "yes", 100.0),
            trade("t2", "acct_b", "mkt_1", 0, "yes", 100.0),
        ];

        let graph = graph_builder.build_wallet_graph(&trades);

        // weight = 1.0 * 1.0 / (0 + 1) = 1.0, above the 0.7 threshold
        let a_edges = &graph["acct_a"];
        assert_eq!(a_edges.len(), 1);
        assert_eq!(a_edges[0].target, "acct_b");
        assert!((a_edges[0].weight - 1.0).abs() < 1e-12);

        let b_edges = &graph["acct_b"];
        assert_eq!(b_edges[0].target, "acct_a");
        assert!((b_edges[0].weight - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_threshold_above_one_excludes_all_pairs() {
        let graph_builder = CoordinationGraph::new(1.1);
        let trades = vec![
            trade("t1", "acct_a", "mkt_1", 0, "yes", 100.0),
            trade("t2", "acct_b", "mkt_1", 0, "yes", 100.0),
        ];

        assert!(graph_builder.build_wallet_graph(&trades).is_empty());
    }

    #[test]
    fn test_repeat_pairs_accumulate_across_markets() {
        let graph_builder = CoordinationGraph::default();
        let trades = vec![
            trade("t1", "acct_a", "mkt_1", 0, "yes", 100.0),
            trade("t2", "acct_b", "mkt_1", 0, "yes", 100.0),
            trade("t3", "acct_a", "mkt_2", 0, "yes", 100.0),
            trade("t4", "acct_b", "mkt_2", 0, "yes", 100.0),
        ];

        let graph = graph_builder.build_wallet_graph(&trades);
        assert!((graph["acct_a"][0].weight - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_different_markets_never_pair() {
        let graph_builder = CoordinationGraph::default();
        let trades = vec![
            trade("t1", "acct_a", "mkt_1", 0, "yes", 100.0),
            trade("t2", "acct_b", "mkt_2", 0, "yes", 100.0),
        ];

        assert!(graph_builder.build_wallet_graph(&trades).is_empty());
    }

    #[test]
    fn test_zero_size_pair_clamps_denominator() {
        let graph_builder = CoordinationGraph::default();
        let trades = vec![
            trade("t1", "acct_a", "mkt_1", 0, "yes", 0.0),
            trade("t2", "acct_b", "mkt_1", 0, "yes", 0.0),
        ];

        // size_similarity = 1 - 0/1 = 1.0; weight stays finite at 1.0
        let graph = graph_builder.build_wallet_graph(&trades);
        assert!((graph["acct_a"][0].weight - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_isolated_accounts_are_not_singleton_communities() {
        let graph_builder = CoordinationGraph::default();
        let trades = vec![
            trade("t1", "acct_a", "mkt_1", 0, "yes", 100.0),
            trade("t2", "acct_b", "mkt_1", 0, "yes", 100.0),
            // Same market, but the gap and size mismatch decay the weight below threshold
            trade("t3", "acct_c", "mkt_1", 59, "no", 5000.0),
        ];

        let graph = graph_builder.build_wallet_graph(&trades);
        let communities = graph_builder.detect_communities(&graph);

        assert_eq!(communities.len(), 1);
        assert_eq!(communities[0].len(), 2);
        assert!(communities[0].contains("acct_a"));
        assert!(communities[0].contains("acct_b"));
        assert!(!communities.iter().any(|c| c.contains("acct_c")));
    }

    #[test]
    fn test_communities_are_disjoint() {
        let graph_builder = CoordinationGraph::default();
        let trades = vec![
            trade("t1", "acct_a", "mkt_1", 0, "yes", 100.0),
            trade("t2", "acct_b", "mkt_1", 0, "yes", 100.0),
            trade("t3", "acct_c", "mkt_2", 0, "no", 50.0),
            trade("t4", "acct_d", "mkt_2", 0, "no", 50.0),
        ];

        let graph = graph_builder.build_wallet_graph(&trades);
        let mut communities = graph_builder.detect_communities(&graph);
        communities.sort_by_key(|c| c.iter().min().cloned());

        assert_eq!(communities.len(), 2);
        assert!(communities[0].is_disjoint(&communities[1]));
    }

    #[test]
    fn test_empty_input_produces_empty_graph() {
        let graph_builder = CoordinationGraph::default();
        let graph = graph_builder.build_wallet_graph(&[]);
        assert!(graph.is_empty());
        assert!(graph_builder.detect_communities(&graph).is_empty());
    }
}
