//! Relational store seam.
//!
//! The pipeline coordinates exclusively through per-row atomicity in this
//! store: unique-key upsert for vessel creation and a timestamp-guarded
//! overwrite for live state. No caller holds a lock across these calls.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::TrackerError;
use crate::models::{LiveStateUpdate, PositionMessage, VesselRecord};

#[async_trait]
pub trait VesselStore: Send + Sync {
    /// Resolve the owning vessel record, creating it on first sight.
    ///
    /// Concurrent first-sight of the same `vessel_id` resolves to exactly
    /// one record.
    async fn find_or_create(&self, message: &PositionMessage)
        -> Result<VesselRecord, TrackerError>;

    /// Append one immutable history entry.
    ///
    /// Redelivery of the same message content collapses onto the existing
    /// row; entries are never mutated after insert.
    async fn append_history(
        &self,
        vessel: &VesselRecord,
        message: &PositionMessage,
        recorded_at: DateTime<Utc>,
    ) -> Result<(), TrackerError>;

    /// Overwrite live state if the update is not older than the stored
    /// `last_update_at`, then return the vessel's current row.
    async fn apply_live_update(
        &self,
        id: i64,
        update: &LiveStateUpdate,
    ) -> Result<VesselRecord, TrackerError>;

    /// Vessels whose last update predates `cutoff`, excluding OFFLINE ones.
    async fn stale_vessels(&self, cutoff: DateTime<Utc>)
        -> Result<Vec<VesselRecord>, TrackerError>;

    /// Demote one vessel to NO_SIGNAL, rechecking staleness in the write
    /// so a concurrently refreshed vessel is left alone.
    async fn demote_if_stale(&self, id: i64, cutoff: DateTime<Utc>)
        -> Result<bool, TrackerError>;
}
