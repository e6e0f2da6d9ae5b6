//! Optional batch analytics capability.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use super::AnalyticsProvider;
use crate::config::SinkConfig;
use crate::errors::TrackerError;
use crate::models::PositionMessage;

/// Stand-in used when no analytics engine is deployed.
pub struct DisabledAnalytics;

#[async_trait]
impl AnalyticsProvider for DisabledAnalytics {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn record_position(&self, _message: &PositionMessage) -> Result<(), TrackerError> {
        Ok(())
    }
}

/// Select the analytics capability at startup.
///
/// The batch engine is a separate, optional deployment; this build only
/// ships the disabled implementation.
pub fn from_config(config: &SinkConfig) -> Arc<dyn AnalyticsProvider> {
    if config.analytics_enabled {
        warn!("Analytics requested but no engine is available, running disabled");
    } else {
        info!("Analytics disabled");
    }
    Arc::new(DisabledAnalytics)
}
