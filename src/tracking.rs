//! Vessel tracking state machine.

use crate::models::{PositionMessage, SignalQuality, TrackingStatus};

/// Station range beyond which a vessel is considered outside receiver range.
pub const STATION_RANGE_LIMIT: f32 = 50.0;

/// Derive the tracking status from one accepted message.
///
/// Priority order, first match wins: no signal, out of range, tracked.
/// `Offline` is reachable only through the stale sweep escalation, never
/// from a message.
pub fn status_for_message(message: &PositionMessage) -> TrackingStatus {
    if message.signal_quality == Some(SignalQuality::None) {
        return TrackingStatus::NoSignal;
    }
    match message.station_range {
        Some(range) if range > STATION_RANGE_LIMIT => TrackingStatus::OutOfRange,
        _ => TrackingStatus::Tracked,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(signal_quality: Option<SignalQuality>, station_range: Option<f32>) -> PositionMessage {
        PositionMessage {
            signal_quality,
            station_range,
            ..PositionMessage::new("FI-1")
        }
    }

    #[test]
    fn no_signal_outranks_station_range() {
        let status = status_for_message(&message(Some(SignalQuality::None), Some(75.0)));
        assert_eq!(status, TrackingStatus::NoSignal);
    }

    #[test]
    fn long_range_is_out_of_range() {
        let status = status_for_message(&message(Some(SignalQuality::Good), Some(75.0)));
        assert_eq!(status, TrackingStatus::OutOfRange);
    }

    #[test]
    fn short_range_good_signal_is_tracked() {
        let status = status_for_message(&message(Some(SignalQuality::Good), Some(10.0)));
        assert_eq!(status, TrackingStatus::Tracked);
    }

    #[test]
    fn limit_itself_is_still_in_range() {
        let status = status_for_message(&message(None, Some(STATION_RANGE_LIMIT)));
        assert_eq!(status, TrackingStatus::Tracked);
    }

    #[test]
    fn no_hints_default_to_tracked() {
        assert_eq!(
            status_for_message(&message(None, None)),
            TrackingStatus::Tracked
        );
    }
}
