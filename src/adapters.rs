//! Source adapters for heterogeneous position feeds.
//!
//! Each adapter turns vendor-specific payloads into canonical
//! [`PositionMessage`]s. Upstream vendors disagree on field naming, so
//! conversion tries an ordered list of candidate keys per field.

pub mod feed;
pub mod provider;
pub mod simulator;
pub mod webhook;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::warn;

use crate::channel::SubChannel;
use crate::errors::TrackerError;
use crate::models::{DataSource, PositionMessage, SignalQuality};
use crate::tracking::STATION_RANGE_LIMIT;
use crate::validator;

/// One raw vendor payload, as delivered.
pub type RawPayload = serde_json::Map<String, Value>;

const VESSEL_ID_KEYS: &[&str] = &[
    "vesselId",
    "vessel_id",
    "VESSEL_ID",
    "registry_id",
    "mmsi",
    "id",
];
const NAME_KEYS: &[&str] = &["name", "vessel_name", "shipName"];
const LATITUDE_KEYS: &[&str] = &["latitude", "lat", "LATITUDE"];
const LONGITUDE_KEYS: &[&str] = &["longitude", "lon", "lng", "LONGITUDE"];
const TIMESTAMP_KEYS: &[&str] = &["timestamp", "time", "updated_at", "positionTime"];
const SPEED_KEYS: &[&str] = &["speed", "sog", "speedOverGround"];
const COURSE_KEYS: &[&str] = &["course", "cog", "courseOverGround"];
const HEADING_KEYS: &[&str] = &["heading", "hdg"];
const VESSEL_TYPE_KEYS: &[&str] = &["vesselType", "vessel_type", "type", "shipType"];
const DESTINATION_KEYS: &[&str] = &["destination", "dest"];
const ETA_KEYS: &[&str] = &["eta", "estimatedArrival"];
const SECONDARY_ID_KEYS: &[&str] = &["secondaryId", "secondary_id", "imo", "registryNumber"];
const CALL_SIGN_KEYS: &[&str] = &["callSign", "call_sign", "callsign"];
const STATION_RANGE_KEYS: &[&str] = &["stationRange", "station_range", "range"];
const SIGNAL_QUALITY_KEYS: &[&str] = &["signalQuality", "signal_quality", "signal"];
const DATA_SOURCE_KEYS: &[&str] = &["dataSource", "data_source", "source"];

/// First non-blank string value among the candidate keys.
///
/// Numeric values are accepted and rendered, since some vendors send
/// identifiers as bare numbers.
pub fn string_field(payload: &RawPayload, keys: &[&str]) -> Option<String> {
    for key in keys {
        match payload.get(*key) {
            Some(Value::String(s)) => {
                let trimmed = s.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

/// First numeric value among the candidate keys; numeric strings count.
pub fn f64_field(payload: &RawPayload, keys: &[&str]) -> Option<f64> {
    for key in keys {
        match payload.get(*key) {
            Some(Value::Number(n)) => return n.as_f64(),
            Some(Value::String(s)) => {
                if let Ok(parsed) = s.trim().parse::<f64>() {
                    return Some(parsed);
                }
            }
            _ => {}
        }
    }
    None
}

pub fn f32_field(payload: &RawPayload, keys: &[&str]) -> Option<f32> {
    f64_field(payload, keys).map(|v| v as f32)
}

/// First timestamp among the candidate keys.
///
/// Accepts RFC 3339 strings and epoch numbers; epoch values at or above
/// 10^12 are taken as milliseconds, below as seconds.
pub fn timestamp_field(payload: &RawPayload, keys: &[&str]) -> Option<DateTime<Utc>> {
    for key in keys {
        match payload.get(*key) {
            Some(Value::String(s)) => {
                if let Ok(parsed) = DateTime::parse_from_rfc3339(s.trim()) {
                    return Some(parsed.with_timezone(&Utc));
                }
                if let Ok(epoch) = s.trim().parse::<i64>() {
                    if let Some(parsed) = epoch_to_datetime(epoch) {
                        return Some(parsed);
                    }
                }
            }
            Some(Value::Number(n)) => {
                if let Some(parsed) = n.as_i64().and_then(epoch_to_datetime) {
                    return Some(parsed);
                }
            }
            _ => {}
        }
    }
    None
}

fn epoch_to_datetime(epoch: i64) -> Option<DateTime<Utc>> {
    if epoch >= 1_000_000_000_000 {
        DateTime::from_timestamp_millis(epoch)
    } else {
        DateTime::from_timestamp(epoch, 0)
    }
}

/// Classify the transport when the vendor omits an explicit source.
///
/// An explicit source field outranks the station-range inference. With no
/// hints at all the field stays unset.
pub fn classify_data_source(
    explicit: Option<DataSource>,
    station_range: Option<f32>,
) -> Option<DataSource> {
    explicit.or(match station_range {
        Some(range) if range > STATION_RANGE_LIMIT => Some(DataSource::Satellite),
        Some(_) => Some(DataSource::Terrestrial),
        None => None,
    })
}

/// Map a vendor payload onto the canonical message.
///
/// A payload with no recognizable vessel id yields a message with a blank
/// id; the validator is the single place that rejects those.
pub fn position_from_payload(payload: &RawPayload) -> PositionMessage {
    let explicit_source =
        string_field(payload, DATA_SOURCE_KEYS).and_then(|s| DataSource::parse(&s));
    let station_range = f32_field(payload, STATION_RANGE_KEYS);

    PositionMessage {
        vessel_id: string_field(payload, VESSEL_ID_KEYS).unwrap_or_default(),
        name: string_field(payload, NAME_KEYS),
        latitude: f64_field(payload, LATITUDE_KEYS),
        longitude: f64_field(payload, LONGITUDE_KEYS),
        timestamp: timestamp_field(payload, TIMESTAMP_KEYS),
        speed: f32_field(payload, SPEED_KEYS),
        course: f32_field(payload, COURSE_KEYS),
        heading: f32_field(payload, HEADING_KEYS),
        vessel_type: string_field(payload, VESSEL_TYPE_KEYS),
        destination: string_field(payload, DESTINATION_KEYS),
        eta: string_field(payload, ETA_KEYS),
        secondary_id: string_field(payload, SECONDARY_ID_KEYS),
        call_sign: string_field(payload, CALL_SIGN_KEYS),
        station_range,
        signal_quality: string_field(payload, SIGNAL_QUALITY_KEYS)
            .and_then(|s| SignalQuality::parse(&s)),
        data_source: classify_data_source(explicit_source, station_range),
    }
}

/// A pull adapter produces one batch of vendor payloads per cycle.
#[async_trait]
pub trait PullAdapter: Send {
    fn name(&self) -> &'static str;

    async fn fetch(&mut self) -> Result<Vec<RawPayload>, TrackerError>;

    fn to_position_message(&self, payload: &RawPayload) -> PositionMessage {
        position_from_payload(payload)
    }
}

/// Drive a pull adapter on a fixed cadence.
///
/// A failed fetch cycle is logged and yields zero messages; the next tick
/// retries by schedule. Conversion and validation happen here so every
/// pull adapter shares the same ingest path.
pub async fn run_poll_loop<A: PullAdapter>(
    mut adapter: A,
    interval: Duration,
    publisher: SubChannel<PositionMessage>,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        match adapter.fetch().await {
            Ok(payloads) => {
                for payload in &payloads {
                    validator::ingest(&publisher, adapter.to_position_message(payload));
                }
            }
            Err(e) => {
                warn!("{} fetch cycle failed: {}", adapter.name(), e);
            }
        }
    }
}
