//! Message validation and normalization.
//!
//! Every message passes through here before it may enter the channel.
//! Rejection is silent to the producer: the message is logged and dropped,
//! with no retry and no backpressure signal.

use std::fmt;

use tracing::debug;

use crate::channel::SubChannel;
use crate::models::PositionMessage;

/// Why a raw message was refused entry to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    BlankVesselId,
    NullVesselId,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BlankVesselId => write!(f, "vessel id is missing or blank"),
            Self::NullVesselId => write!(f, "vessel id is the literal string \"null\""),
        }
    }
}

/// Validate a candidate message and normalize its identifier.
///
/// The vessel id is trimmed but case-preserving. A blank id or the literal
/// "null" (any case) is rejected.
pub fn validate(mut message: PositionMessage) -> Result<PositionMessage, Rejection> {
    let trimmed = message.vessel_id.trim();
    if trimmed.is_empty() {
        return Err(Rejection::BlankVesselId);
    }
    if trimmed.eq_ignore_ascii_case("null") {
        return Err(Rejection::NullVesselId);
    }
    if trimmed.len() != message.vessel_id.len() {
        message.vessel_id = trimmed.to_string();
    }
    Ok(message)
}

/// Validate and publish in one step; the shared ingest path for adapters.
pub fn ingest(publisher: &SubChannel<PositionMessage>, message: PositionMessage) {
    match validate(message) {
        Ok(message) => publisher.publish(message),
        Err(reason) => debug!("Dropping position report: {}", reason),
    }
}
