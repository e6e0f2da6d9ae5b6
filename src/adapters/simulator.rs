//! Synthetic fleet simulator.
//!
//! Emits plausible position reports for a small fixed fleet anchored near
//! Baltic reference harbours, with bounded jitter on position, speed and
//! course. Useful for running the full pipeline without any upstream
//! credentials.

use async_trait::async_trait;
use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::Value;
use tracing::debug;

use super::{PullAdapter, RawPayload};
use crate::errors::TrackerError;
use crate::models::{DataSource, PositionMessage, SignalQuality};

/// Synthetic fleet: identifier, display name, anchor coordinates.
const FLEET: &[(&str, &str, (f64, f64))] = &[
    ("SIM-AURORA", "Aurora", (60.1699, 24.9384)),
    ("SIM-BALTICA", "Baltica", (59.4370, 24.7536)),
    ("SIM-CELESTE", "Celeste", (59.3293, 18.0686)),
    ("SIM-DELPHINUS", "Delphinus", (60.4518, 22.2666)),
    ("SIM-EQUINOX", "Equinox", (59.8586, 17.6389)),
];

/// Maximum positional jitter around an anchor, in degrees.
const JITTER_DEGREES: f64 = 0.05;
const MAX_SPEED_KNOTS: f32 = 25.0;

pub struct SimulatorAdapter;

impl SimulatorAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SimulatorAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PullAdapter for SimulatorAdapter {
    fn name(&self) -> &'static str {
        "simulator"
    }

    /// Generate one cycle of 3-5 vessel reports.
    ///
    /// A degenerate draw (blank identifier) is skipped, not retried.
    async fn fetch(&mut self) -> Result<Vec<RawPayload>, TrackerError> {
        let mut rng = rand::thread_rng();
        let count = rng.gen_range(3..=5);
        let mut payloads = Vec::with_capacity(count);

        for (id, name, anchor) in FLEET.choose_multiple(&mut rng, count) {
            if id.trim().is_empty() {
                debug!("Skipping degenerate simulator draw");
                continue;
            }

            let course = rng.gen_range(0.0..360.0f32);
            let message = PositionMessage {
                vessel_id: (*id).to_string(),
                name: Some((*name).to_string()),
                latitude: Some(anchor.0 + rng.gen_range(-JITTER_DEGREES..=JITTER_DEGREES)),
                longitude: Some(anchor.1 + rng.gen_range(-JITTER_DEGREES..=JITTER_DEGREES)),
                timestamp: Some(Utc::now()),
                speed: Some(rng.gen_range(0.0..MAX_SPEED_KNOTS)),
                course: Some(course),
                heading: Some((course + rng.gen_range(-5.0..=5.0f32)).rem_euclid(360.0)),
                station_range: Some(rng.gen_range(5.0..45.0f32)),
                signal_quality: Some(SignalQuality::Good),
                data_source: Some(DataSource::Simulation),
                ..Default::default()
            };

            // Emit vendor-shaped payloads so the simulator exercises the
            // same conversion path as every other adapter.
            if let Ok(Value::Object(payload)) = serde_json::to_value(&message) {
                payloads.push(payload);
            }
        }

        Ok(payloads)
    }
}
