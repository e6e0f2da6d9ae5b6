//! Errors for the vessel tracking pipeline
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("MQTT connection failed")]
    MqttConnectionError(#[from] rumqttc::ConnectionError),

    #[error("MQTT client error")]
    MqttClientError(#[from] rumqttc::ClientError),

    #[error("Serialization error")]
    SerdeError(#[from] serde_json::Error),

    #[error("Configuration error")]
    ConfigError(#[from] config::ConfigError),

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("HTTP request error")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error")]
    IoError(#[from] std::io::Error),

    #[error("Invalid topic")]
    InvalidTopic(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Unknown tracking status: {0}")]
    UnknownTrackingStatus(String),

    #[error("Database error")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Database migration error")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
}
