//! End-to-end pipeline behavior against the in-memory store.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use vessel_tracker::adapters::{self, PullAdapter};
use vessel_tracker::config::MonitorConfig;
use vessel_tracker::errors::TrackerError;
use vessel_tracker::models::{
    PositionMessage, PositionUpdateEvent, SignalQuality, TrackingStatus,
};
use vessel_tracker::monitor::StaleVesselMonitor;
use vessel_tracker::processor::PositionProcessor;
use vessel_tracker::sinks::{EventBus, GraphSink, SearchIndexSink};
use vessel_tracker::store::memory::MemoryVesselStore;
use vessel_tracker::validator;

struct FailingSearchIndex;

#[async_trait]
impl SearchIndexSink for FailingSearchIndex {
    async fn index_position(
        &self,
        _message: &PositionMessage,
        _recorded_at: DateTime<Utc>,
    ) -> Result<(), TrackerError> {
        Err(TrackerError::InvalidPayload(
            "search index unreachable".to_string(),
        ))
    }
}

#[derive(Default)]
struct RecordingGraphSink {
    subjects: Mutex<Vec<String>>,
}

#[async_trait]
impl GraphSink for RecordingGraphSink {
    async fn record_position(
        &self,
        message: &PositionMessage,
        _recorded_at: DateTime<Utc>,
    ) -> Result<(), TrackerError> {
        self.subjects
            .lock()
            .unwrap()
            .push(message.vessel_id.clone());
        Ok(())
    }
}

#[derive(Default)]
struct RecordingEventBus {
    events: Mutex<Vec<PositionUpdateEvent>>,
}

impl EventBus for RecordingEventBus {
    fn publish(&self, event: PositionUpdateEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn message_at(vessel_id: &str, lat: f64, lon: f64, timestamp: DateTime<Utc>) -> PositionMessage {
    PositionMessage {
        latitude: Some(lat),
        longitude: Some(lon),
        timestamp: Some(timestamp),
        speed: Some(12.0),
        course: Some(180.0),
        ..PositionMessage::new(vessel_id)
    }
}

fn monitor_config() -> MonitorConfig {
    MonitorConfig {
        stale_after: Duration::from_secs(3600),
        sweep_interval: Duration::from_secs(300),
    }
}

#[tokio::test]
async fn first_message_creates_vessel_with_history() {
    let store = Arc::new(MemoryVesselStore::new());
    let processor = PositionProcessor::new(store.clone());

    let now = Utc::now();
    processor
        .process(message_at("FI-1", 60.1, 24.9, now))
        .await
        .unwrap();

    let vessel = store.vessel("FI-1").await.unwrap();
    assert_eq!(vessel.vessel_id, "FI-1");
    assert_eq!(vessel.tracking_status, TrackingStatus::Tracked);
    assert_eq!(vessel.current_latitude, Some(60.1));
    assert_eq!(vessel.current_longitude, Some(24.9));
    assert_eq!(vessel.last_update_at, Some(now));
    assert_eq!(store.history_len().await, 1);
}

#[tokio::test]
async fn duplicate_message_is_idempotent() {
    let store = Arc::new(MemoryVesselStore::new());
    let bus = Arc::new(RecordingEventBus::default());
    let processor = PositionProcessor::new(store.clone()).with_event_bus(bus.clone());

    let message = message_at("FI-1", 60.1, 24.9, Utc::now());
    processor.process(message.clone()).await.unwrap();
    let before = store.vessel("FI-1").await.unwrap();

    processor.process(message).await.unwrap();
    let after = store.vessel("FI-1").await.unwrap();

    assert_eq!(store.vessel_count().await, 1);
    assert_eq!(store.history_len().await, 1);
    assert_eq!(before, after);
    // Each successfully processed delivery still emits its event.
    assert_eq!(bus.events.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn newest_timestamp_wins_in_either_order() {
    let t1 = Utc.with_ymd_and_hms(2025, 4, 1, 8, 0, 0).unwrap();
    let t2 = Utc.with_ymd_and_hms(2025, 4, 1, 9, 0, 0).unwrap();

    for (first, second) in [((60.0, 24.0, t1), (61.0, 25.0, t2)), ((61.0, 25.0, t2), (60.0, 24.0, t1))] {
        let store = Arc::new(MemoryVesselStore::new());
        let processor = PositionProcessor::new(store.clone());

        processor
            .process(message_at("FI-1", first.0, first.1, first.2))
            .await
            .unwrap();
        processor
            .process(message_at("FI-1", second.0, second.1, second.2))
            .await
            .unwrap();

        let vessel = store.vessel("FI-1").await.unwrap();
        assert_eq!(vessel.current_latitude, Some(61.0));
        assert_eq!(vessel.current_longitude, Some(25.0));
        assert_eq!(vessel.last_update_at, Some(t2));
        // The late arrival still lands in history.
        assert_eq!(store.history_len().await, 2);
    }
}

#[tokio::test]
async fn tracking_status_follows_message_quality() {
    let store = Arc::new(MemoryVesselStore::new());
    let processor = PositionProcessor::new(store.clone());
    let base = Utc.with_ymd_and_hms(2025, 4, 1, 8, 0, 0).unwrap();

    let cases = [
        (Some(SignalQuality::None), Some(75.0), TrackingStatus::NoSignal),
        (Some(SignalQuality::Good), Some(75.0), TrackingStatus::OutOfRange),
        (Some(SignalQuality::Good), Some(10.0), TrackingStatus::Tracked),
    ];

    for (i, (signal_quality, station_range, expected)) in cases.into_iter().enumerate() {
        let message = PositionMessage {
            signal_quality,
            station_range,
            ..message_at("FI-1", 60.0, 24.0, base + chrono::Duration::minutes(i as i64))
        };
        processor.process(message).await.unwrap();

        let vessel = store.vessel("FI-1").await.unwrap();
        assert_eq!(vessel.tracking_status, expected);
    }
}

#[tokio::test]
async fn stale_sweep_demotes_only_non_offline_vessels() {
    let store = Arc::new(MemoryVesselStore::new());
    let processor = PositionProcessor::new(store.clone());

    let stale = Utc::now() - chrono::Duration::hours(2);
    processor
        .process(message_at("STALE-1", 60.0, 24.0, stale))
        .await
        .unwrap();
    processor
        .process(message_at("GONE-1", 60.5, 24.5, stale))
        .await
        .unwrap();
    processor
        .process(message_at("FRESH-1", 61.0, 25.0, Utc::now()))
        .await
        .unwrap();
    store
        .set_tracking_status("GONE-1", TrackingStatus::Offline)
        .await;

    let monitor = StaleVesselMonitor::new(store.clone(), &monitor_config());
    let demoted = monitor.sweep().await.unwrap();

    assert_eq!(demoted, 1);
    assert_eq!(
        store.vessel("STALE-1").await.unwrap().tracking_status,
        TrackingStatus::NoSignal
    );
    assert_eq!(
        store.vessel("GONE-1").await.unwrap().tracking_status,
        TrackingStatus::Offline
    );
    assert_eq!(
        store.vessel("FRESH-1").await.unwrap().tracking_status,
        TrackingStatus::Tracked
    );
}

#[tokio::test]
async fn sweep_is_idempotent_once_demoted() {
    let store = Arc::new(MemoryVesselStore::new());
    let processor = PositionProcessor::new(store.clone());

    processor
        .process(message_at(
            "STALE-1",
            60.0,
            24.0,
            Utc::now() - chrono::Duration::hours(2),
        ))
        .await
        .unwrap();

    let monitor = StaleVesselMonitor::new(store.clone(), &monitor_config());
    assert_eq!(monitor.sweep().await.unwrap(), 1);
    // Second pass still counts it as stale but the status is unchanged.
    monitor.sweep().await.unwrap();
    assert_eq!(
        store.vessel("STALE-1").await.unwrap().tracking_status,
        TrackingStatus::NoSignal
    );
}

#[tokio::test]
async fn simulated_fleet_ingests_despite_unreachable_search_index() {
    let store = Arc::new(MemoryVesselStore::new());
    let bus = Arc::new(RecordingEventBus::default());
    let processor = PositionProcessor::new(store.clone())
        .with_search_sink(Arc::new(FailingSearchIndex))
        .with_event_bus(bus.clone());

    let mut adapter = adapters::simulator::SimulatorAdapter::new();
    let payloads = adapter.fetch().await.unwrap();
    let count = payloads.len();

    for payload in &payloads {
        let message = validator::validate(adapter.to_position_message(payload)).unwrap();
        processor.process(message).await.unwrap();
    }

    assert_eq!(store.vessel_count().await, count);
    assert_eq!(store.history_len().await, count);
    for event in bus.events.lock().unwrap().iter() {
        assert_eq!(event.tracking_status, TrackingStatus::Tracked);
    }
    assert_eq!(bus.events.lock().unwrap().len(), count);
}

#[tokio::test]
async fn graph_sink_receives_forwarded_positions() {
    let store = Arc::new(MemoryVesselStore::new());
    let graph = Arc::new(RecordingGraphSink::default());
    let processor = PositionProcessor::new(store).with_graph_sink(graph.clone());

    processor
        .process(message_at("FI-1", 60.0, 24.0, Utc::now()))
        .await
        .unwrap();

    // The graph forward is spawned off the processing path.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(*graph.subjects.lock().unwrap(), vec!["FI-1".to_string()]);
}
