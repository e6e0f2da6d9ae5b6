//! HTTP knowledge-graph sink.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use super::GraphSink;
use crate::errors::TrackerError;
use crate::models::PositionMessage;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Forwards positions to the knowledge graph as triple-shaped statements.
pub struct HttpGraphSink {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpGraphSink {
    pub fn new(endpoint: String) -> Result<Self, TrackerError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http, endpoint })
    }

    fn statements(message: &PositionMessage, recorded_at: DateTime<Utc>) -> Value {
        let subject = format!("vessel:{}", message.vessel_id);
        json!({
            "subject": subject,
            "statements": [
                {"predicate": "observedAt", "object": recorded_at},
                {"predicate": "latitude", "object": message.latitude},
                {"predicate": "longitude", "object": message.longitude},
            ]
        })
    }
}

#[async_trait]
impl GraphSink for HttpGraphSink {
    async fn record_position(
        &self,
        message: &PositionMessage,
        recorded_at: DateTime<Utc>,
    ) -> Result<(), TrackerError> {
        self.http
            .post(&self.endpoint)
            .json(&Self::statements(message, recorded_at))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statements_are_keyed_by_vessel_and_time() {
        let message = PositionMessage {
            latitude: Some(60.1),
            longitude: Some(24.9),
            ..PositionMessage::new("FI-1")
        };
        let body = HttpGraphSink::statements(&message, Utc::now());

        assert_eq!(body["subject"], "vessel:FI-1");
        assert_eq!(body["statements"].as_array().unwrap().len(), 3);
    }
}
