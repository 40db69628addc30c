//! Insider Detection Pipeline - Main Entry Point
//!
//! Consumes trade records from NATS, batches them through the detection
//! pipeline, and publishes severity-tiered alerts.

use anyhow::Result;
use futures::StreamExt;
use insider_detection_pipeline::{
    alerts::AlertDispatcher,
    anomaly::{AnomalyEngine, ZScoreDetector},
    config::AppConfig,
    consumer::TradeConsumer,
    explain::Explainer,
    feature_store::{FEATURE_AVG_TRADE_SIZE, FEATURE_PROFIT_PROXY},
    graph::CoordinationGraph,
    ingestion::{BufferedTradeSource, DataIngestion},
    metrics::{MetricsReporter, PipelineMetrics},
    models::registry::{ModelRegistry, ModelWrapper},
    models::scorers::{LogisticScorer, ProfitConsistencyScorer, VolumeSpikeScorer},
    models::EnsembleCombiner,
    pipeline::DetectionPipeline,
    producer::AlertProducer,
    sequence::SequenceEncoder,
    types::trade::TradeRecord,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

fn build_registry(config: &AppConfig) -> Result<ModelRegistry> {
    let mut registry = ModelRegistry::new();

    registry.register(ModelWrapper::new(Box::new(LogisticScorer::new(
        "logistic",
        HashMap::from([
            (FEATURE_PROFIT_PROXY.to_string(), 3.0),
            (FEATURE_AVG_TRADE_SIZE.to_string(), 0.002),
        ]),
        -1.0,
    ))))?;
    registry.register(ModelWrapper::new(Box::new(VolumeSpikeScorer::new(
        config.anomaly.baseline_trade_size,
    ))))?;
    registry.register(ModelWrapper::new(Box::new(ProfitConsistencyScorer)))?;

    Ok(registry)
}

fn build_pipeline(
    config: &AppConfig,
    buffer: Arc<BufferedTradeSource>,
) -> Result<DetectionPipeline> {
    let ingestion = DataIngestion::new(vec![Box::new(buffer)]);
    let registry = build_registry(config)?;
    let ensemble = if config.ensemble.weights.is_empty() {
        EnsembleCombiner::new()
    } else {
        EnsembleCombiner::with_weights(config.ensemble.weights.clone())
    };
    let dispatcher = AlertDispatcher::new(config.detection.severity.clone());

    let mut pipeline = DetectionPipeline::new(ingestion, registry, ensemble, dispatcher)
        .with_explainer(Explainer::default());

    if config.sequence.enabled {
        pipeline = pipeline.with_sequence_encoder(SequenceEncoder::new(config.sequence.embedding_dim));
    }
    if config.graph.enabled {
        pipeline = pipeline.with_graph(CoordinationGraph::new(config.graph.threshold));
    }
    if config.anomaly.enabled {
        pipeline = pipeline.with_anomaly_engine(AnomalyEngine::new(vec![Box::new(
            ZScoreDetector::new(
                "trade_size_z",
                FEATURE_AVG_TRADE_SIZE,
                config.anomaly.baseline_trade_size,
                config.anomaly.baseline_trade_size_std,
            ),
        )]));
    }
    if !config.detection.markets_of_interest.is_empty() {
        let markets: HashSet<String> = config
            .detection
            .markets_of_interest
            .iter()
            .cloned()
            .collect();
        pipeline = pipeline.with_markets_of_interest(markets);
    }

    Ok(pipeline)
}

async fn run_batch(
    pipeline: &mut DetectionPipeline,
    producer: &AlertProducer,
    metrics: &PipelineMetrics,
    batch_size: u64,
) {
    let start_time = Instant::now();

    match pipeline.run_inference() {
        Ok(alerts) => {
            metrics.record_run(batch_size, start_time.elapsed());

            for score in pipeline.last_scores() {
                metrics.record_score(score.score);
                metrics.record_model_agreement(&score.breakdown);
            }
            for alert in &alerts {
                metrics.record_alert(alert.severity.as_str());
            }

            if let Err(e) = producer.publish_batch(&alerts).await {
                error!(error = %e, "Failed to publish alert batch");
            } else if !alerts.is_empty() {
                info!(
                    alerts = alerts.len(),
                    processing_time_us = start_time.elapsed().as_micros(),
                    "Alerts published"
                );
            }
        }
        Err(e) => {
            error!(error = %e, "Inference run failed");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("insider_detection_pipeline=info".parse()?),
        )
        .init();

    info!("Starting Insider Detection Pipeline");

    // Load configuration, falling back to built-in defaults
    let config = match AppConfig::load() {
        Ok(config) => {
            info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            warn!(error = %e, "Failed to load config file, using defaults");
            AppConfig::default()
        }
    };
    info!(
        "Severity breakpoints: medium>={:.2}, high>={:.2}, critical>={:.2}",
        config.detection.severity.medium,
        config.detection.severity.high,
        config.detection.severity.critical
    );

    // Initialize metrics
    let metrics = Arc::new(PipelineMetrics::new());

    // Build the pipeline around a buffered trade source the NATS loop feeds
    let buffer = Arc::new(BufferedTradeSource::new());
    let mut pipeline = build_pipeline(&config, buffer.clone())?;
    info!(
        sequence = config.sequence.enabled,
        graph = config.graph.enabled,
        anomaly = config.anomaly.enabled,
        "Detection pipeline initialized"
    );

    // Connect to NATS
    let client = async_nats::connect(&config.nats.url).await?;
    info!("Connected to NATS at {}", config.nats.url);

    let consumer = TradeConsumer::new(client.clone(), &config.nats.trade_subject);
    let producer = AlertProducer::new(client.clone(), &config.nats.alert_subject);

    info!("Listening on subject: {}", config.nats.trade_subject);
    info!("Publishing alerts to: {}", config.nats.alert_subject);

    // Start metrics reporter (prints summary every 30 seconds)
    let metrics_clone = metrics.clone();
    tokio::spawn(async move {
        let reporter = MetricsReporter::new(metrics_clone, 30);
        reporter.start().await;
    });

    // Batch trades into inference runs: run when the buffer fills, or on the
    // flush interval when trades trickle in
    let mut subscription = consumer.subscribe().await?;
    let mut flush_interval =
        tokio::time::interval(Duration::from_millis(config.pipeline.flush_interval_ms));

    loop {
        tokio::select! {
            message = subscription.next() => {
                let Some(message) = message else {
                    info!("Trade subscription closed");
                    break;
                };

                match serde_json::from_slice::<TradeRecord>(&message.payload) {
                    Ok(trade) => {
                        debug!(trade_id = %trade.trade_id, account_id = %trade.account_id, "Buffered trade");
                        buffer.push(trade);
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to deserialize trade record");
                    }
                }

                if buffer.len() >= config.pipeline.batch_size {
                    let batch_size = buffer.len() as u64;
                    run_batch(&mut pipeline, &producer, &metrics, batch_size).await;
                }
            }
            _ = flush_interval.tick() => {
                if !buffer.is_empty() {
                    let batch_size = buffer.len() as u64;
                    run_batch(&mut pipeline, &producer, &metrics, batch_size).await;
                }
            }
        }
    }

    info!("Pipeline shutting down...");
    metrics.print_summary();

    Ok(())
}
