//! Webhook receiver for pushed position reports.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::info;

use super::{position_from_payload, RawPayload};
use crate::channel::SubChannel;
use crate::errors::TrackerError;
use crate::models::PositionMessage;
use crate::validator;

/// Build the receiver router.
pub fn router(publisher: SubChannel<PositionMessage>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/positions", post(receive))
        .with_state(publisher)
}

/// Bind and serve the receiver until the process shuts down.
pub async fn serve(publisher: SubChannel<PositionMessage>, bind: String) -> Result<(), TrackerError> {
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!("Webhook receiver listening on {}", bind);
    axum::serve(listener, router(publisher)).await?;
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

/// Accept one raw payload map.
///
/// Ingestion is fire-and-forget: the payload is converted and validated,
/// and the call is acknowledged whether or not the report survived
/// validation. Rejects are only visible in the server log.
async fn receive(
    State(publisher): State<SubChannel<PositionMessage>>,
    Json(payload): Json<RawPayload>,
) -> StatusCode {
    validator::ingest(&publisher, position_from_payload(&payload));
    StatusCode::ACCEPTED
}
