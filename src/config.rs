//! Application configuration

use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;
use serde_with::serde_as;

use crate::errors::TrackerError;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub ingestion: IngestionConfig,
    pub channel: ChannelConfig,
    pub processor: ProcessorConfig,
    pub webhook: WebhookConfig,
    pub database: DatabaseConfig,
    pub sinks: SinkConfig,
    pub monitor: MonitorConfig,
}

/// Which source adapter feeds the pipeline.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum IngestionMode {
    Simulation,
    OpenFeed,
    ProviderApi,
}

#[serde_as]
#[derive(Debug, Deserialize, Clone)]
pub struct IngestionConfig {
    pub mode: IngestionMode,
    /// Cycle interval for the active pull adapter.
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub poll_interval: Duration,
    pub provider: Option<ProviderConfig>,
    pub feed: Option<FeedConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    pub host: String,
    pub client_id: String,
    pub topics: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChannelConfig {
    pub capacity: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProcessorConfig {
    pub workers: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebhookConfig {
    pub enabled: bool,
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SinkConfig {
    pub search_url: Option<String>,
    pub graph_url: Option<String>,
    pub analytics_enabled: bool,
}

#[serde_as]
#[derive(Debug, Deserialize, Clone)]
pub struct MonitorConfig {
    /// A vessel is stale once its last update is older than this.
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub stale_after: Duration,
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub sweep_interval: Duration,
}

impl AppConfig {
    pub fn load() -> Result<Self, TrackerError> {
        let config = Config::builder()
            .set_default("ingestion.mode", "simulation")?
            .set_default("ingestion.poll_interval", 15)?
            .set_default("channel.capacity", 256)?
            .set_default("processor.workers", 4)?
            .set_default("webhook.enabled", true)?
            .set_default("webhook.bind", "127.0.0.1:8085")?
            .set_default("sinks.analytics_enabled", false)?
            .set_default("monitor.stale_after", 3600)?
            .set_default("monitor.sweep_interval", 300)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(
                Environment::with_prefix("VESSELTRACKER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("ingestion.feed.topics"),
            )
            .build()?;

        let config: AppConfig = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), TrackerError> {
        if self.database.url.trim().is_empty() {
            return Err(TrackerError::ConfigurationError {
                message: "Database URL cannot be empty".to_string(),
            });
        }
        if self.channel.capacity == 0 {
            return Err(TrackerError::ConfigurationError {
                message: "Channel capacity must be greater than zero".to_string(),
            });
        }
        if self.processor.workers == 0 {
            return Err(TrackerError::ConfigurationError {
                message: "Processor worker count must be greater than zero".to_string(),
            });
        }
        if self.ingestion.poll_interval.is_zero() {
            return Err(TrackerError::ConfigurationError {
                message: "Poll interval must be greater than zero".to_string(),
            });
        }
        if self.monitor.sweep_interval.is_zero() || self.monitor.stale_after.is_zero() {
            return Err(TrackerError::ConfigurationError {
                message: "Monitor intervals must be greater than zero".to_string(),
            });
        }
        match self.ingestion.mode {
            IngestionMode::ProviderApi if self.ingestion.provider.is_none() => {
                Err(TrackerError::ConfigurationError {
                    message: "Provider ingestion requires ingestion.provider settings".to_string(),
                })
            }
            IngestionMode::OpenFeed if self.ingestion.feed.is_none() => {
                Err(TrackerError::ConfigurationError {
                    message: "Open-feed ingestion requires ingestion.feed settings".to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_load_config() {
        env::set_var("VESSELTRACKER__DATABASE__URL", "postgres://localhost/vessels");
        env::set_var("VESSELTRACKER__INGESTION__MODE", "provider-api");
        env::set_var(
            "VESSELTRACKER__INGESTION__PROVIDER__BASE_URL",
            "https://api.example.com",
        );
        env::set_var("VESSELTRACKER__INGESTION__POLL_INTERVAL", "30");
        env::set_var("VESSELTRACKER__MONITOR__STALE_AFTER", "1800");

        let config = AppConfig::load().unwrap();
        assert_eq!(config.database.url, "postgres://localhost/vessels");
        assert_eq!(config.ingestion.mode, IngestionMode::ProviderApi);
        assert_eq!(
            config.ingestion.provider.unwrap().base_url,
            "https://api.example.com"
        );
        assert_eq!(config.ingestion.poll_interval, Duration::from_secs(30));
        assert_eq!(config.monitor.stale_after, Duration::from_secs(1800));
        // Defaults survive alongside the overrides
        assert_eq!(config.channel.capacity, 256);
        assert_eq!(config.monitor.sweep_interval, Duration::from_secs(300));

        env::remove_var("VESSELTRACKER__DATABASE__URL");
        env::remove_var("VESSELTRACKER__INGESTION__MODE");
        env::remove_var("VESSELTRACKER__INGESTION__PROVIDER__BASE_URL");
        env::remove_var("VESSELTRACKER__INGESTION__POLL_INTERVAL");
        env::remove_var("VESSELTRACKER__MONITOR__STALE_AFTER");
    }

    #[test]
    fn test_validate_rejects_empty_database_url() {
        let mut config = test_config();
        config.database.url = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_requires_provider_settings() {
        let mut config = test_config();
        config.ingestion.mode = IngestionMode::ProviderApi;
        config.ingestion.provider = None;
        assert!(config.validate().is_err());
    }

    fn test_config() -> AppConfig {
        AppConfig {
            ingestion: IngestionConfig {
                mode: IngestionMode::Simulation,
                poll_interval: Duration::from_secs(15),
                provider: None,
                feed: None,
            },
            channel: ChannelConfig { capacity: 256 },
            processor: ProcessorConfig { workers: 4 },
            webhook: WebhookConfig {
                enabled: true,
                bind: "127.0.0.1:8085".to_string(),
            },
            database: DatabaseConfig {
                url: "postgres://localhost/vessels".to_string(),
            },
            sinks: SinkConfig {
                search_url: None,
                graph_url: None,
                analytics_enabled: false,
            },
            monitor: MonitorConfig {
                stale_after: Duration::from_secs(3600),
                sweep_interval: Duration::from_secs(300),
            },
        }
    }
}
