//! HTTP search index sink.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use super::SearchIndexSink;
use crate::errors::TrackerError;
use crate::models::PositionMessage;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Mirrors history entries into a search index over its document API.
pub struct HttpSearchIndex {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpSearchIndex {
    pub fn new(endpoint: String) -> Result<Self, TrackerError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http, endpoint })
    }

    fn document(message: &PositionMessage, recorded_at: DateTime<Utc>) -> Result<Value, TrackerError> {
        let mut document = serde_json::to_value(message)?;
        if let Value::Object(map) = &mut document {
            map.insert("recordedAt".to_string(), json!(recorded_at));
        }
        Ok(document)
    }
}

#[async_trait]
impl SearchIndexSink for HttpSearchIndex {
    async fn index_position(
        &self,
        message: &PositionMessage,
        recorded_at: DateTime<Utc>,
    ) -> Result<(), TrackerError> {
        let document = Self::document(message, recorded_at)?;
        self.http
            .post(&self.endpoint)
            .json(&document)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
