//! Event bus backed by the derived-events sub-channel.

use super::EventBus;
use crate::channel::SubChannel;
use crate::models::PositionUpdateEvent;

/// Publishes position-update events onto the `position-events`
/// sub-channel, from which the UI push bridge consumes.
pub struct ChannelEventBus {
    publisher: SubChannel<PositionUpdateEvent>,
}

impl ChannelEventBus {
    pub fn new(publisher: SubChannel<PositionUpdateEvent>) -> Self {
        Self { publisher }
    }
}

impl EventBus for ChannelEventBus {
    fn publish(&self, event: PositionUpdateEvent) {
        self.publisher.publish(event);
    }
}
