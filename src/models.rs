//! Data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::TrackerError;
use serde_helpers::*;

/// Reported quality of the radio signal a position fix arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalQuality {
    Good,
    Fair,
    Poor,
    None,
}

impl SignalQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "GOOD",
            Self::Fair => "FAIR",
            Self::Poor => "POOR",
            Self::None => "NONE",
        }
    }

    /// Parse a vendor-supplied quality string, tolerating any casing.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "GOOD" => Some(Self::Good),
            "FAIR" => Some(Self::Fair),
            "POOR" => Some(Self::Poor),
            "NONE" => Some(Self::None),
            _ => Option::None,
        }
    }
}

/// Where a position report originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataSource {
    Satellite,
    Terrestrial,
    Both,
    Simulation,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Satellite => "SATELLITE",
            Self::Terrestrial => "TERRESTRIAL",
            Self::Both => "BOTH",
            Self::Simulation => "SIMULATION",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "SATELLITE" => Some(Self::Satellite),
            "TERRESTRIAL" => Some(Self::Terrestrial),
            "BOTH" => Some(Self::Both),
            "SIMULATION" => Some(Self::Simulation),
            _ => None,
        }
    }
}

/// The pipeline's belief about data freshness/quality for a vessel.
///
/// `Offline` is never derived from a message; it is reserved for the
/// escalation path beyond the stale sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackingStatus {
    Tracked,
    OutOfRange,
    NoSignal,
    Offline,
}

impl TrackingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tracked => "TRACKED",
            Self::OutOfRange => "OUT_OF_RANGE",
            Self::NoSignal => "NO_SIGNAL",
            Self::Offline => "OFFLINE",
        }
    }
}

impl std::str::FromStr for TrackingStatus {
    type Err = TrackerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "TRACKED" => Ok(Self::Tracked),
            "OUT_OF_RANGE" => Ok(Self::OutOfRange),
            "NO_SIGNAL" => Ok(Self::NoSignal),
            "OFFLINE" => Ok(Self::Offline),
            other => Err(TrackerError::UnknownTrackingStatus(other.to_string())),
        }
    }
}

/// Canonical normalized position report produced by every source adapter.
///
/// `vessel_id` is guaranteed non-blank once a message has passed the
/// validator; every other field is optional and simply absent when the
/// upstream vendor did not supply it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PositionMessage {
    pub vessel_id: String,
    #[serde(default, deserialize_with = "deserialize_trimmed_string")]
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
    /// Speed over ground in knots.
    pub speed: Option<f32>,
    /// Course over ground in degrees.
    pub course: Option<f32>,
    /// Heading in degrees (0-359).
    pub heading: Option<f32>,
    pub vessel_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_trimmed_string")]
    pub destination: Option<String>,
    /// Estimated time of arrival as reported by the vendor, unparsed.
    pub eta: Option<String>,
    /// Secondary identifier, e.g. a registry number.
    pub secondary_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_trimmed_string")]
    pub call_sign: Option<String>,
    /// Distance to the receiving station, in the vendor's distance units.
    pub station_range: Option<f32>,
    pub signal_quality: Option<SignalQuality>,
    pub data_source: Option<DataSource>,
}

impl PositionMessage {
    /// Create a message carrying only the mandatory identifier.
    pub fn new(vessel_id: impl Into<String>) -> Self {
        Self {
            vessel_id: vessel_id.into(),
            ..Default::default()
        }
    }
}

/// Durable vessel record owned by the relational store.
///
/// Created on first-seen `vessel_id`, updated on every accepted position
/// message and by the stale sweep, never deleted by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct VesselRecord {
    /// Store-assigned surrogate key.
    pub id: i64,
    /// Unique business key.
    pub vessel_id: String,
    pub name: Option<String>,
    /// Operating line.
    pub operator: Option<String>,
    pub capacity: Option<i32>,
    pub secondary_id: Option<String>,
    pub call_sign: Option<String>,
    pub tracking_enabled: bool,
    pub current_latitude: Option<f64>,
    pub current_longitude: Option<f64>,
    pub current_speed: Option<f32>,
    pub current_course: Option<f32>,
    pub last_update_at: Option<DateTime<Utc>>,
    pub tracking_status: TrackingStatus,
}

/// Guarded live-state overwrite applied by the processor.
///
/// The store only applies it when `timestamp` is not older than the
/// vessel's stored `last_update_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveStateUpdate {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub speed: Option<f32>,
    pub course: Option<f32>,
    pub timestamp: DateTime<Utc>,
    pub tracking_status: TrackingStatus,
}

/// Event published to the event bus after a message is fully processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionUpdateEvent {
    pub vessel_id: String,
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub speed: Option<f32>,
    pub course: Option<f32>,
    pub timestamp: DateTime<Utc>,
    pub tracking_status: TrackingStatus,
}

/// Custom deserializers
mod serde_helpers {
    use serde::{self, Deserialize, Deserializer};

    pub fn deserialize_trimmed_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: Option<String> = Option::deserialize(deserializer)?;
        Ok(s.and_then(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parse_position_message() {
        let s = r#"{
          "vesselId" : "FI-230123456",
          "name" : "  SUULA ",
          "latitude" : 61.866617,
          "longitude" : 28.886522,
          "timestamp" : "2024-12-16T14:58:36Z",
          "speed" : 10.7,
          "course" : 326.6,
          "heading" : 325.0,
          "destination" : "SEPIT",
          "callSign" : "LAUY8",
          "stationRange" : 12.5,
          "signalQuality" : "GOOD",
          "dataSource" : "TERRESTRIAL"
        }"#;
        let msg: PositionMessage = serde_json::from_str(s).unwrap();

        assert_eq!(msg.vessel_id, "FI-230123456");
        assert_eq!(msg.name.as_deref(), Some("SUULA"));
        assert_eq!(msg.latitude, Some(61.866617));
        assert_eq!(
            msg.timestamp,
            Some(Utc.with_ymd_and_hms(2024, 12, 16, 14, 58, 36).unwrap())
        );
        assert_eq!(msg.signal_quality, Some(SignalQuality::Good));
        assert_eq!(msg.data_source, Some(DataSource::Terrestrial));
        assert_eq!(msg.eta, None);
    }

    #[test]
    fn signal_quality_parse_is_case_insensitive() {
        assert_eq!(SignalQuality::parse("good"), Some(SignalQuality::Good));
        assert_eq!(SignalQuality::parse(" NONE "), Some(SignalQuality::None));
        assert_eq!(SignalQuality::parse("excellent"), None);
    }

    #[test]
    fn data_source_parse() {
        assert_eq!(DataSource::parse("satellite"), Some(DataSource::Satellite));
        assert_eq!(DataSource::parse("BOTH"), Some(DataSource::Both));
        assert_eq!(DataSource::parse(""), None);
    }

    #[test]
    fn tracking_status_round_trip() {
        for status in [
            TrackingStatus::Tracked,
            TrackingStatus::OutOfRange,
            TrackingStatus::NoSignal,
            TrackingStatus::Offline,
        ] {
            assert_eq!(status.as_str().parse::<TrackingStatus>().unwrap(), status);
        }
        assert!("LOST".parse::<TrackingStatus>().is_err());
    }
}
