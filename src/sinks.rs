//! Fan-out sinks.
//!
//! Downstream stores updated best-effort after primary persistence
//! succeeds. Every sink failure is caught and logged by the processor;
//! none can roll back the primary write or fail a processing call.

pub mod analytics;
pub mod events;
pub mod graph;
pub mod search;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::TrackerError;
use crate::models::{PositionMessage, PositionUpdateEvent};

/// Full-text/geo search index fed one document per history entry.
#[async_trait]
pub trait SearchIndexSink: Send + Sync {
    async fn index_position(
        &self,
        message: &PositionMessage,
        recorded_at: DateTime<Utc>,
    ) -> Result<(), TrackerError>;
}

/// Knowledge-graph sink keyed by vessel id, timestamp and coordinates.
#[async_trait]
pub trait GraphSink: Send + Sync {
    async fn record_position(
        &self,
        message: &PositionMessage,
        recorded_at: DateTime<Utc>,
    ) -> Result<(), TrackerError>;
}

/// Event bus carrying position-update events toward UI push consumers.
pub trait EventBus: Send + Sync {
    /// Fire-and-forget publish.
    fn publish(&self, event: PositionUpdateEvent);
}

/// Optional batch analytics capability.
///
/// The heavy engine is an optional deployment; when it is absent the
/// disabled implementation is selected at startup.
#[async_trait]
pub trait AnalyticsProvider: Send + Sync {
    fn is_enabled(&self) -> bool;

    async fn record_position(&self, message: &PositionMessage) -> Result<(), TrackerError>;
}
