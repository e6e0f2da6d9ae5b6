//! In-memory vessel store.
//!
//! Mirrors the Postgres store's semantics (unique business key, guarded
//! live-state overwrite, history dedup on redelivery) without a database.
//! Used by the test suite and for running the pipeline offline.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::VesselStore;
use crate::errors::TrackerError;
use crate::models::{LiveStateUpdate, PositionMessage, TrackingStatus, VesselRecord};

/// One stored history row.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub vessel_ref: i64,
    pub recorded_at: DateTime<Utc>,
    pub message: PositionMessage,
}

#[derive(Default)]
struct Inner {
    next_id: i64,
    vessels: HashMap<String, VesselRecord>,
    history: Vec<HistoryEntry>,
}

#[derive(Default)]
pub struct MemoryVesselStore {
    inner: Mutex<Inner>,
}

impl MemoryVesselStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn vessel(&self, vessel_id: &str) -> Option<VesselRecord> {
        self.inner.lock().await.vessels.get(vessel_id).cloned()
    }

    pub async fn vessel_count(&self) -> usize {
        self.inner.lock().await.vessels.len()
    }

    pub async fn history_len(&self) -> usize {
        self.inner.lock().await.history.len()
    }

    pub async fn history_for(&self, vessel_id: &str) -> Vec<HistoryEntry> {
        let inner = self.inner.lock().await;
        let Some(vessel) = inner.vessels.get(vessel_id) else {
            return Vec::new();
        };
        inner
            .history
            .iter()
            .filter(|entry| entry.vessel_ref == vessel.id)
            .cloned()
            .collect()
    }

    /// Force a status, standing in for paths outside the pipeline.
    pub async fn set_tracking_status(&self, vessel_id: &str, status: TrackingStatus) {
        if let Some(vessel) = self.inner.lock().await.vessels.get_mut(vessel_id) {
            vessel.tracking_status = status;
        }
    }
}

#[async_trait]
impl VesselStore for MemoryVesselStore {
    async fn find_or_create(
        &self,
        message: &PositionMessage,
    ) -> Result<VesselRecord, TrackerError> {
        let mut inner = self.inner.lock().await;
        if let Some(vessel) = inner.vessels.get(&message.vessel_id) {
            return Ok(vessel.clone());
        }

        inner.next_id += 1;
        let vessel = VesselRecord {
            id: inner.next_id,
            vessel_id: message.vessel_id.clone(),
            name: message.name.clone(),
            operator: None,
            capacity: None,
            secondary_id: message.secondary_id.clone(),
            call_sign: message.call_sign.clone(),
            tracking_enabled: true,
            current_latitude: None,
            current_longitude: None,
            current_speed: None,
            current_course: None,
            last_update_at: None,
            tracking_status: TrackingStatus::Tracked,
        };
        inner
            .vessels
            .insert(message.vessel_id.clone(), vessel.clone());
        Ok(vessel)
    }

    async fn append_history(
        &self,
        vessel: &VesselRecord,
        message: &PositionMessage,
        recorded_at: DateTime<Utc>,
    ) -> Result<(), TrackerError> {
        let mut inner = self.inner.lock().await;
        let duplicate = inner
            .history
            .iter()
            .any(|entry| entry.vessel_ref == vessel.id && entry.recorded_at == recorded_at);
        if !duplicate {
            inner.history.push(HistoryEntry {
                vessel_ref: vessel.id,
                recorded_at,
                message: message.clone(),
            });
        }
        Ok(())
    }

    async fn apply_live_update(
        &self,
        id: i64,
        update: &LiveStateUpdate,
    ) -> Result<VesselRecord, TrackerError> {
        let mut inner = self.inner.lock().await;
        let vessel = inner
            .vessels
            .values_mut()
            .find(|vessel| vessel.id == id)
            .ok_or_else(|| TrackerError::InvalidPayload(format!("unknown vessel id {id}")))?;

        let fresh = match vessel.last_update_at {
            Some(stored) => stored <= update.timestamp,
            None => true,
        };
        if fresh {
            vessel.current_latitude = update.latitude;
            vessel.current_longitude = update.longitude;
            vessel.current_speed = update.speed;
            vessel.current_course = update.course;
            vessel.last_update_at = Some(update.timestamp);
            vessel.tracking_status = update.tracking_status;
        }
        Ok(vessel.clone())
    }

    async fn stale_vessels(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<VesselRecord>, TrackerError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .vessels
            .values()
            .filter(|vessel| {
                vessel.tracking_status != TrackingStatus::Offline
                    && vessel
                        .last_update_at
                        .map(|at| at < cutoff)
                        .unwrap_or(false)
            })
            .cloned()
            .collect())
    }

    async fn demote_if_stale(&self, id: i64, cutoff: DateTime<Utc>) -> Result<bool, TrackerError> {
        let mut inner = self.inner.lock().await;
        let Some(vessel) = inner.vessels.values_mut().find(|vessel| vessel.id == id) else {
            return Ok(false);
        };

        let still_stale = vessel.tracking_status != TrackingStatus::Offline
            && vessel
                .last_update_at
                .map(|at| at < cutoff)
                .unwrap_or(false);
        if still_stale {
            vessel.tracking_status = TrackingStatus::NoSignal;
        }
        Ok(still_stale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn find_or_create_is_keyed_by_business_id() {
        let store = MemoryVesselStore::new();
        let first = store
            .find_or_create(&PositionMessage::new("FI-1"))
            .await
            .unwrap();
        let second = store
            .find_or_create(&PositionMessage::new("FI-1"))
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(store.vessel_count().await, 1);
    }

    #[tokio::test]
    async fn redelivered_history_collapses() {
        let store = MemoryVesselStore::new();
        let message = PositionMessage::new("FI-1");
        let vessel = store.find_or_create(&message).await.unwrap();
        let at = Utc::now();

        store.append_history(&vessel, &message, at).await.unwrap();
        store.append_history(&vessel, &message, at).await.unwrap();
        assert_eq!(store.history_len().await, 1);
    }
}
