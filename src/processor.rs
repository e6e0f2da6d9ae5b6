//! Position processor: the channel consumer.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, warn};

use crate::channel::SharedReceiver;
use crate::errors::TrackerError;
use crate::models::{LiveStateUpdate, PositionMessage, PositionUpdateEvent, VesselRecord};
use crate::sinks::{analytics::DisabledAnalytics, AnalyticsProvider, EventBus, GraphSink, SearchIndexSink};
use crate::store::VesselStore;
use crate::tracking;

/// Consumes validated position messages.
///
/// One processor serves the whole pipeline regardless of which optional
/// sinks are configured; an unconfigured sink is simply skipped during
/// fan-out.
pub struct PositionProcessor {
    store: Arc<dyn VesselStore>,
    search: Option<Arc<dyn SearchIndexSink>>,
    graph: Option<Arc<dyn GraphSink>>,
    events: Option<Arc<dyn EventBus>>,
    analytics: Arc<dyn AnalyticsProvider>,
}

impl PositionProcessor {
    pub fn new(store: Arc<dyn VesselStore>) -> Self {
        Self {
            store,
            search: None,
            graph: None,
            events: None,
            analytics: Arc::new(DisabledAnalytics),
        }
    }

    pub fn with_search_sink(mut self, sink: Arc<dyn SearchIndexSink>) -> Self {
        self.search = Some(sink);
        self
    }

    pub fn with_graph_sink(mut self, sink: Arc<dyn GraphSink>) -> Self {
        self.graph = Some(sink);
        self
    }

    pub fn with_event_bus(mut self, bus: Arc<dyn EventBus>) -> Self {
        self.events = Some(bus);
        self
    }

    pub fn with_analytics(mut self, analytics: Arc<dyn AnalyticsProvider>) -> Self {
        self.analytics = analytics;
        self
    }

    /// Process one delivered message.
    ///
    /// Idempotent with respect to duplicate message content: redelivery
    /// collapses in the history table and the guarded live-state update
    /// rewrites identical values.
    ///
    /// The history insert is the transaction boundary; a primary-store
    /// failure aborts processing of this message, while fan-out failures
    /// never do.
    pub async fn process(&self, message: PositionMessage) -> Result<(), TrackerError> {
        let recorded_at = message.timestamp.unwrap_or_else(Utc::now);

        let vessel = self.store.find_or_create(&message).await?;
        self.store
            .append_history(&vessel, &message, recorded_at)
            .await?;

        let update = LiveStateUpdate {
            latitude: message.latitude,
            longitude: message.longitude,
            speed: message.speed,
            course: message.course,
            timestamp: recorded_at,
            tracking_status: tracking::status_for_message(&message),
        };
        let vessel = self.store.apply_live_update(vessel.id, &update).await?;

        self.fan_out(&message, &vessel, recorded_at).await;
        Ok(())
    }

    /// Best-effort mirror to the configured sinks.
    async fn fan_out(
        &self,
        message: &PositionMessage,
        vessel: &VesselRecord,
        recorded_at: DateTime<Utc>,
    ) {
        if let Some(search) = &self.search {
            if let Err(e) = search.index_position(message, recorded_at).await {
                warn!("Search index update failed for {}: {}", message.vessel_id, e);
            }
        }

        if let Some(graph) = &self.graph {
            let graph = Arc::clone(graph);
            let message = message.clone();
            tokio::spawn(async move {
                if let Err(e) = graph.record_position(&message, recorded_at).await {
                    debug!(
                        "Knowledge graph update failed for {}: {}",
                        message.vessel_id, e
                    );
                }
            });
        }

        if self.analytics.is_enabled() {
            if let Err(e) = self.analytics.record_position(message).await {
                debug!("Analytics record failed for {}: {}", message.vessel_id, e);
            }
        }

        if let Some(events) = &self.events {
            events.publish(PositionUpdateEvent {
                vessel_id: vessel.vessel_id.clone(),
                name: vessel.name.clone(),
                latitude: vessel.current_latitude,
                longitude: vessel.current_longitude,
                speed: vessel.current_speed,
                course: vessel.current_course,
                timestamp: recorded_at,
                tracking_status: vessel.tracking_status,
            });
        }
    }

    /// Drain the positions sub-channel until it closes.
    ///
    /// Run as many copies as the worker pool is configured for; per-vessel
    /// ordering is handled by the live-state timestamp guard, not here.
    pub async fn run(self: Arc<Self>, receiver: SharedReceiver<PositionMessage>) {
        while let Some(message) = receiver.recv().await {
            let vessel_id = message.vessel_id.clone();
            if let Err(e) = self.process(message).await {
                error!("Message processing error for {}: {}", vessel_id, e);
            }
        }
    }
}
