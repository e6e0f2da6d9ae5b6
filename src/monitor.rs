//! Stale vessel monitor.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info};

use crate::config::MonitorConfig;
use crate::errors::TrackerError;
use crate::store::VesselStore;

/// Periodic sweep demoting vessels without recent updates.
///
/// Vessels whose last update is older than the freshness threshold drop
/// to NO_SIGNAL; escalation onward to OFFLINE is left to a future sweep
/// stage and OFFLINE vessels are never touched here.
pub struct StaleVesselMonitor {
    store: Arc<dyn VesselStore>,
    stale_after: Duration,
    sweep_interval: Duration,
}

impl StaleVesselMonitor {
    pub fn new(store: Arc<dyn VesselStore>, config: &MonitorConfig) -> Self {
        Self {
            store,
            stale_after: config.stale_after,
            sweep_interval: config.sweep_interval,
        }
    }

    /// Sweep on a fixed period until the process shuts down.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.sweep_interval);
        loop {
            ticker.tick().await;
            match self.sweep().await {
                Ok(0) => debug!("Stale sweep found nothing to demote"),
                Ok(demoted) => info!("Stale sweep demoted {} vessels to NO_SIGNAL", demoted),
                Err(e) => error!("Stale vessel sweep failed: {}", e),
            }
        }
    }

    /// One sweep pass; returns how many vessels were demoted.
    ///
    /// Read-then-write per vessel: the store rechecks staleness inside the
    /// conditional write, so a vessel refreshed concurrently with the
    /// sweep keeps its fresh status.
    pub async fn sweep(&self) -> Result<u64, TrackerError> {
        let cutoff = Utc::now() - self.stale_after;

        let mut demoted = 0;
        for vessel in self.store.stale_vessels(cutoff).await? {
            if self.store.demote_if_stale(vessel.id, cutoff).await? {
                info!(
                    "Vessel {} has had no update since {:?}, marking NO_SIGNAL",
                    vessel.vessel_id, vessel.last_update_at
                );
                demoted += 1;
            }
        }
        Ok(demoted)
    }
}
