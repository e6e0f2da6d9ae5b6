//! Open-data feed client.
//!
//! Subscribes to a public vessel position feed over MQTT/websocket. The
//! broker reconnects automatically, but topic subscriptions must be
//! re-established on every new session, so subscription is handled inside
//! the event loop.

use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS, Transport};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::{position_from_payload, RawPayload};
use crate::channel::SubChannel;
use crate::config::FeedConfig;
use crate::errors::TrackerError;
use crate::models::PositionMessage;
use crate::validator;

/// Push adapter for the open-data position feed.
///
/// Parsed reports go straight through the shared validate-and-publish
/// path; the handle only exists to keep the client and its event loop
/// alive.
pub struct FeedClient {
    _client: AsyncClient,
    _handle: JoinHandle<()>,
}

impl FeedClient {
    /// Connect and start forwarding reports into the channel.
    pub fn connect(config: &FeedConfig, publisher: SubChannel<PositionMessage>) -> Self {
        let mut options = MqttOptions::new(&config.client_id, &config.host, 443);
        options.set_transport(Transport::wss_with_default_config());
        options.set_keep_alive(Duration::from_secs(5));

        let (client, event_loop) = AsyncClient::new(options, 100);

        let handle = tokio::spawn(Self::process_events(
            event_loop,
            client.clone(),
            config.topics.clone(),
            publisher,
        ));

        Self {
            _client: client,
            _handle: handle,
        }
    }

    async fn subscribe(client: &AsyncClient, topics: &[String]) -> Result<(), TrackerError> {
        for topic in topics {
            info!("Subscribing to topic: {}", topic);
            client.subscribe(topic, QoS::AtLeastOnce).await?;
        }
        Ok(())
    }

    async fn process_events(
        mut event_loop: EventLoop,
        client: AsyncClient,
        topics: Vec<String>,
        publisher: SubChannel<PositionMessage>,
    ) {
        loop {
            match event_loop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    info!("Connected to feed broker, subscribing to topics");
                    if let Err(e) = Self::subscribe(&client, &topics).await {
                        error!("Failed to subscribe: {}", e);
                        break;
                    }
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    match Self::parse_message(&publish.topic, &publish.payload) {
                        Ok(message) => validator::ingest(&publisher, message),
                        Err(e) => warn!("Failed to parse feed message: {}", e),
                    }
                }
                Err(e) => {
                    error!("Feed connection error: {}", e);
                    continue;
                }
                _ => continue,
            }
        }
    }

    /// Parse one feed report.
    ///
    /// Topic layout is `vessels/{vesselId}/position`; the topic segment is
    /// the authoritative identifier regardless of what the payload claims.
    fn parse_message(topic: &str, payload: &[u8]) -> Result<PositionMessage, TrackerError> {
        let parts: Vec<&str> = topic.split('/').collect();

        if parts.len() < 3 || parts[0] != "vessels" || parts[2] != "position" {
            return Err(TrackerError::InvalidTopic(topic.to_string()));
        }

        let payload: RawPayload = serde_json::from_slice(payload)?;
        let mut message = position_from_payload(&payload);
        message.vessel_id = parts[1].to_string();
        Ok(message)
    }
}
