//! End-to-end detection pipeline orchestration.
//!
//! Two entry points: an inference run that turns recent trades into
//! dispatched alerts, and a backtest run that turns a historical batch into
//! diagnostic metrics. The sequence encoder, coordination graph, anomaly
//! engine, and explainer are each independently optional; an absent
//! component skips its stage.

use crate::alerts::AlertDispatcher;
use crate::anomaly::{AnomalyEngine, AnomalyScore};
use crate::explain::{Explainer, Explanation};
use crate::feature_store::{FeatureStore, FeatureVector};
use crate::graph::CoordinationGraph;
use crate::ingestion::DataIngestion;
use crate::models::aggregator::{EnsembleCombiner, EnsembleScore};
use crate::models::registry::{ModelPrediction, ModelRegistry};
use crate::sequence::SequenceEncoder;
use crate::types::alert::Alert;
use crate::types::trade::TradeRecord;
use anyhow::Result;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Metrics key for the community count in backtest output
pub const METRIC_COMMUNITIES_DETECTED: &str = "communities_detected";
/// Metrics key for the mean anomaly score in backtest output
pub const METRIC_AVG_ANOMALY_SCORE: &str = "avg_anomaly_score";

/// Coordinates ingestion, feature computation, scoring, and alerting
pub struct DetectionPipeline {
    ingestion: DataIngestion,
    feature_store: FeatureStore,
    registry: ModelRegistry,
    ensemble: EnsembleCombiner,
    dispatcher: AlertDispatcher,
    sequence_encoder: Option<SequenceEncoder>,
    graph: Option<CoordinationGraph>,
    anomaly_engine: Option<AnomalyEngine>,
    explainer: Option<Explainer>,
    markets_of_interest: Option<HashSet<String>>,
    alerts: Vec<Alert>,
    scores: Vec<EnsembleScore>,
    explanations: Vec<Explanation>,
    anomaly_scores: Vec<AnomalyScore>,
}

impl DetectionPipeline {
    pub fn new(
        ingestion: DataIngestion,
        registry: ModelRegistry,
        ensemble: EnsembleCombiner,
        dispatcher: AlertDispatcher,
    ) -> Self {
        Self {
            ingestion,
            feature_store: FeatureStore::new(),
            registry,
            ensemble,
            dispatcher,
            sequence_encoder: None,
            graph: None,
            anomaly_engine: None,
            explainer: None,
            markets_of_interest: None,
            alerts: Vec::new(),
            scores: Vec::new(),
            explanations: Vec::new(),
            anomaly_scores: Vec::new(),
        }
    }

    pub fn with_sequence_encoder(mut self, encoder: SequenceEncoder) -> Self {
        self.sequence_encoder = Some(encoder);
        self
    }

    pub fn with_graph(mut self, graph: CoordinationGraph) -> Self {
        self.graph = Some(graph);
        self
    }

    pub fn with_anomaly_engine(mut self, engine: AnomalyEngine) -> Self {
        self.anomaly_engine = Some(engine);
        self
    }

    pub fn with_explainer(mut self, explainer: Explainer) -> Self {
        self.explainer = Some(explainer);
        self
    }

    /// Restrict inference to a set of markets; backtests are unaffected
    pub fn with_markets_of_interest(mut self, markets: HashSet<String>) -> Self {
        self.markets_of_interest = Some(markets);
        self
    }

    /// Execute one inference run over the ingestion sources and dispatch the
    /// resulting alerts. Alerts, explanations, and anomaly scores from the
    /// run stay inspectable until the next run replaces them.
    pub fn run_inference(&mut self) -> Result<Vec<Alert>> {
        let trades = self.load_trades();
        debug!(trades = trades.len(), "Loaded trades for inference");

        let vectors = self.feature_store.compute_features(&trades);
        let vectors = self.enrich_with_sequences(&trades, vectors);

        let predictions = self.generate_predictions(&vectors);
        self.anomaly_scores = match &self.anomaly_engine {
            Some(engine) => engine.run(&vectors),
            None => Vec::new(),
        };

        let combined = self.ensemble.combine(&predictions);
        self.explanations = self.build_explanations(&vectors, &combined);

        self.alerts = self.dispatcher.create_alerts(&combined);
        self.dispatcher.dispatch(&self.alerts);
        self.scores = combined;

        info!(
            trades = trades.len(),
            entities = self.scores.len(),
            alerts = self.alerts.len(),
            "Inference run complete"
        );
        Ok(self.alerts.clone())
    }

    /// Run the scoring pipeline over a historical batch and return
    /// diagnostic metrics instead of alerting. Keys: one mean score per
    /// model name, plus community and anomaly aggregates when those
    /// components are configured.
    pub fn run_backtest(&mut self, historical_trades: &[TradeRecord]) -> Result<HashMap<String, f64>> {
        let vectors = self.feature_store.compute_features(historical_trades);
        let vectors = self.enrich_with_sequences(historical_trades, vectors);

        let predictions = self.generate_predictions(&vectors);
        let mut metrics = self.ensemble.aggregate_statistics(&predictions);

        if let Some(graph_builder) = &self.graph {
            let graph = graph_builder.build_wallet_graph(historical_trades);
            let communities = graph_builder.detect_communities(&graph);
            metrics.insert(
                METRIC_COMMUNITIES_DETECTED.to_string(),
                communities.len() as f64,
            );
        }

        if let Some(engine) = &self.anomaly_engine {
            let anomaly_scores = engine.run(&vectors);
            if !anomaly_scores.is_empty() {
                let mean = anomaly_scores.iter().map(|s| s.score).sum::<f64>()
                    / anomaly_scores.len() as f64;
                metrics.insert(METRIC_AVG_ANOMALY_SCORE.to_string(), mean);
            }
        }

        info!(
            trades = historical_trades.len(),
            metrics = metrics.len(),
            "Backtest run complete"
        );
        Ok(metrics)
    }

    /// Alerts from the most recent inference run
    pub fn last_alerts(&self) -> &[Alert] {
        &self.alerts
    }

    /// Combined scores from the most recent inference run
    pub fn last_scores(&self) -> &[EnsembleScore] {
        &self.scores
    }

    /// Explanations from the most recent inference run
    pub fn last_explanations(&self) -> &[Explanation] {
        &self.explanations
    }

    /// Anomaly scores from the most recent inference run
    pub fn last_anomaly_scores(&self) -> &[AnomalyScore] {
        &self.anomaly_scores
    }

    /// Every alert dispatched across runs
    pub fn sent_alerts(&self) -> &[Alert] {
        self.dispatcher.sent_alerts()
    }

    fn load_trades(&self) -> Vec<TradeRecord> {
        let trades = self.ingestion.snapshot_trades();
        match &self.markets_of_interest {
            Some(markets) => trades
                .into_iter()
                .filter(|trade| markets.contains(&trade.market_id))
                .collect(),
            None => trades,
        }
    }

    fn enrich_with_sequences(
        &self,
        trades: &[TradeRecord],
        vectors: Vec<FeatureVector>,
    ) -> Vec<FeatureVector> {
        match &self.sequence_encoder {
            Some(encoder) => {
                let embeddings = encoder.encode(trades);
                encoder.enrich(vectors, &embeddings)
            }
            None => vectors,
        }
    }

    fn generate_predictions(&self, vectors: &[FeatureVector]) -> Vec<ModelPrediction> {
        let mut predictions = Vec::with_capacity(vectors.len() * self.registry.len());
        for vector in vectors {
            for model in self.registry.iter_models() {
                predictions.push(model.predict(vector));
            }
        }
        predictions
    }

    fn build_explanations(
        &self,
        vectors: &[FeatureVector],
        scores: &[EnsembleScore],
    ) -> Vec<Explanation> {
        let explainer = match &self.explainer {
            Some(explainer) => explainer,
            None => return Vec::new(),
        };

        // Later vectors win the lookup, matching the latest state per entity
        let mut lookup: HashMap<&str, &FeatureVector> = HashMap::new();
        for vector in vectors {
            lookup.insert(vector.entity_id.as_str(), vector);
        }

        scores
            .iter()
            .filter_map(|score| {
                lookup
                    .get(score.entity_id.as_str())
                    .map(|vector| explainer.build_explanation(vector, score))
            })
            .collect()
    }
}
