//! Polling client for a commercial position provider API.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{PullAdapter, RawPayload};
use crate::config::ProviderConfig;
use crate::errors::TrackerError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct ProviderAdapter {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl ProviderAdapter {
    pub fn new(config: &ProviderConfig) -> Result<Self, TrackerError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Providers answer either with a bare array of reports or with a
    /// `{"positions": [...]}` envelope.
    fn extract_payloads(body: Value) -> Vec<RawPayload> {
        match body {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(map) => Some(map),
                    _ => None,
                })
                .collect(),
            Value::Object(mut map) => match map.remove("positions") {
                Some(Value::Array(items)) => Self::extract_payloads(Value::Array(items)),
                _ => vec![map],
            },
            _ => vec![],
        }
    }
}

#[async_trait]
impl PullAdapter for ProviderAdapter {
    fn name(&self) -> &'static str {
        "provider"
    }

    async fn fetch(&mut self) -> Result<Vec<RawPayload>, TrackerError> {
        let url = format!("{}/positions", self.base_url);
        let mut request = self.http.get(&url);
        if let Some(api_key) = &self.api_key {
            request = request.header("x-api-key", api_key);
        }

        let response = request.send().await?.error_for_status()?;
        let body: Value = response.json().await?;
        let payloads = Self::extract_payloads(body);
        debug!("Provider returned {} position reports", payloads.len());
        Ok(payloads)
    }
}
