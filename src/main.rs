//! Vessel tracking service

use std::sync::Arc;

use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use vessel_tracker::adapters::{
    self, feed::FeedClient, provider::ProviderAdapter, simulator::SimulatorAdapter, webhook,
};
use vessel_tracker::channel;
use vessel_tracker::config::{AppConfig, IngestionMode};
use vessel_tracker::errors::TrackerError;
use vessel_tracker::models::{PositionMessage, PositionUpdateEvent};
use vessel_tracker::monitor::StaleVesselMonitor;
use vessel_tracker::processor::PositionProcessor;
use vessel_tracker::sinks::analytics;
use vessel_tracker::sinks::events::ChannelEventBus;
use vessel_tracker::sinks::graph::HttpGraphSink;
use vessel_tracker::sinks::search::HttpSearchIndex;
use vessel_tracker::store::postgres::PgVesselStore;

#[tokio::main]
async fn main() -> Result<(), TrackerError> {
    #[cfg(feature = "dotenv")]
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = AppConfig::load()?;

    let store = Arc::new(PgVesselStore::from_url(&config.database.url).await?);

    let (positions_tx, positions_rx) =
        channel::sub_channel::<PositionMessage>("positions", config.channel.capacity);
    let (events_tx, mut events_rx) =
        channel::sub_channel::<PositionUpdateEvent>("position-events", config.channel.capacity);

    let mut processor = PositionProcessor::new(store.clone())
        .with_event_bus(Arc::new(ChannelEventBus::new(events_tx)))
        .with_analytics(analytics::from_config(&config.sinks));
    if let Some(url) = &config.sinks.search_url {
        processor = processor.with_search_sink(Arc::new(HttpSearchIndex::new(url.clone())?));
    }
    if let Some(url) = &config.sinks.graph_url {
        processor = processor.with_graph_sink(Arc::new(HttpGraphSink::new(url.clone())?));
    }
    let processor = Arc::new(processor);

    let shared_rx = positions_rx.into_shared();
    let mut workers: Vec<JoinHandle<()>> = Vec::with_capacity(config.processor.workers);
    for _ in 0..config.processor.workers {
        workers.push(tokio::spawn(
            Arc::clone(&processor).run(shared_rx.clone()),
        ));
    }

    // Derived-events consumer; stands in for the UI push bridge.
    tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            debug!(
                "Position update for {}: {:?}",
                event.vessel_id, event.tracking_status
            );
        }
    });

    let mut producers: Vec<JoinHandle<()>> = Vec::new();
    let mut _feed_client = None;

    match config.ingestion.mode {
        IngestionMode::Simulation => {
            producers.push(tokio::spawn(adapters::run_poll_loop(
                SimulatorAdapter::new(),
                config.ingestion.poll_interval,
                positions_tx.clone(),
            )));
        }
        IngestionMode::ProviderApi => {
            let provider_config =
                config
                    .ingestion
                    .provider
                    .as_ref()
                    .ok_or(TrackerError::ConfigurationError {
                        message: "Provider ingestion requires provider settings".to_string(),
                    })?;
            producers.push(tokio::spawn(adapters::run_poll_loop(
                ProviderAdapter::new(provider_config)?,
                config.ingestion.poll_interval,
                positions_tx.clone(),
            )));
        }
        IngestionMode::OpenFeed => {
            let feed_config =
                config
                    .ingestion
                    .feed
                    .as_ref()
                    .ok_or(TrackerError::ConfigurationError {
                        message: "Open-feed ingestion requires feed settings".to_string(),
                    })?;
            _feed_client = Some(FeedClient::connect(feed_config, positions_tx.clone()));
        }
    }

    if config.webhook.enabled {
        let publisher = positions_tx.clone();
        let bind = config.webhook.bind.clone();
        producers.push(tokio::spawn(async move {
            if let Err(e) = webhook::serve(publisher, bind).await {
                error!("Webhook receiver failed: {}", e);
            }
        }));
    }

    let monitor = StaleVesselMonitor::new(store.clone(), &config.monitor);
    producers.push(tokio::spawn(monitor.run()));

    info!(
        "Vessel tracking pipeline running (mode: {:?}, workers: {})",
        config.ingestion.mode, config.processor.workers
    );

    signal::ctrl_c().await?;
    info!("Received shutdown signal");

    // Stop producers first, then let the workers drain what was already
    // delivered; no message is cancelled mid-write.
    for producer in &producers {
        producer.abort();
    }
    drop(_feed_client);
    drop(positions_tx);
    for worker in workers {
        let _ = worker.await;
    }

    Ok(())
}
