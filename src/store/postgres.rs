//! Postgres-backed vessel store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use super::VesselStore;
use crate::errors::TrackerError;
use crate::models::{LiveStateUpdate, PositionMessage, TrackingStatus, VesselRecord};

const VESSEL_COLUMNS: &str = "id, vessel_id, name, operator, capacity, secondary_id, call_sign, \
     tracking_enabled, current_latitude, current_longitude, current_speed, current_course, \
     last_update_at, tracking_status";

pub struct PgVesselStore {
    pool: PgPool,
}

impl PgVesselStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and bring the schema up to date.
    pub async fn from_url(url: &str) -> Result<Self, TrackerError> {
        info!("Connecting to database");
        let pool = PgPoolOptions::new().max_connections(5).connect(url).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Row shape shared by every vessel query.
#[derive(Debug, sqlx::FromRow)]
struct VesselRow {
    id: i64,
    vessel_id: String,
    name: Option<String>,
    operator: Option<String>,
    capacity: Option<i32>,
    secondary_id: Option<String>,
    call_sign: Option<String>,
    tracking_enabled: bool,
    current_latitude: Option<f64>,
    current_longitude: Option<f64>,
    current_speed: Option<f32>,
    current_course: Option<f32>,
    last_update_at: Option<DateTime<Utc>>,
    tracking_status: String,
}

impl TryFrom<VesselRow> for VesselRecord {
    type Error = TrackerError;

    fn try_from(row: VesselRow) -> Result<Self, Self::Error> {
        let tracking_status: TrackingStatus = row.tracking_status.parse()?;
        Ok(VesselRecord {
            id: row.id,
            vessel_id: row.vessel_id,
            name: row.name,
            operator: row.operator,
            capacity: row.capacity,
            secondary_id: row.secondary_id,
            call_sign: row.call_sign,
            tracking_enabled: row.tracking_enabled,
            current_latitude: row.current_latitude,
            current_longitude: row.current_longitude,
            current_speed: row.current_speed,
            current_course: row.current_course,
            last_update_at: row.last_update_at,
            tracking_status,
        })
    }
}

#[async_trait]
impl VesselStore for PgVesselStore {
    async fn find_or_create(
        &self,
        message: &PositionMessage,
    ) -> Result<VesselRecord, TrackerError> {
        // The no-op conflict update makes the insert return the surviving
        // row either way, so concurrent first-sight resolves to one record.
        let sql = format!(
            "INSERT INTO vessels (vessel_id, name, secondary_id, call_sign)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (vessel_id) DO UPDATE SET vessel_id = EXCLUDED.vessel_id
             RETURNING {VESSEL_COLUMNS}"
        );
        let row: VesselRow = sqlx::query_as(&sql)
            .bind(&message.vessel_id)
            .bind(&message.name)
            .bind(&message.secondary_id)
            .bind(&message.call_sign)
            .fetch_one(&self.pool)
            .await?;

        row.try_into()
    }

    async fn append_history(
        &self,
        vessel: &VesselRecord,
        message: &PositionMessage,
        recorded_at: DateTime<Utc>,
    ) -> Result<(), TrackerError> {
        sqlx::query(
            "INSERT INTO positions (
                vessel_ref, vessel_id, recorded_at, latitude, longitude,
                speed, course, heading, vessel_type, destination, eta,
                secondary_id, call_sign, station_range, signal_quality, data_source
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            ON CONFLICT (vessel_ref, recorded_at) DO NOTHING",
        )
        .bind(vessel.id)
        .bind(&message.vessel_id)
        .bind(recorded_at)
        .bind(message.latitude)
        .bind(message.longitude)
        .bind(message.speed)
        .bind(message.course)
        .bind(message.heading)
        .bind(&message.vessel_type)
        .bind(&message.destination)
        .bind(&message.eta)
        .bind(&message.secondary_id)
        .bind(&message.call_sign)
        .bind(message.station_range)
        .bind(message.signal_quality.map(|q| q.as_str()))
        .bind(message.data_source.map(|s| s.as_str()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn apply_live_update(
        &self,
        id: i64,
        update: &LiveStateUpdate,
    ) -> Result<VesselRecord, TrackerError> {
        // The timestamp guard is the correctness mechanism for out-of-order
        // delivery; channel ordering is not relied upon.
        sqlx::query(
            "UPDATE vessels
             SET current_latitude = $2, current_longitude = $3,
                 current_speed = $4, current_course = $5,
                 last_update_at = $6, tracking_status = $7
             WHERE id = $1
               AND (last_update_at IS NULL OR last_update_at <= $6)",
        )
        .bind(id)
        .bind(update.latitude)
        .bind(update.longitude)
        .bind(update.speed)
        .bind(update.course)
        .bind(update.timestamp)
        .bind(update.tracking_status.as_str())
        .execute(&self.pool)
        .await?;

        let sql = format!("SELECT {VESSEL_COLUMNS} FROM vessels WHERE id = $1");
        let row: VesselRow = sqlx::query_as(&sql).bind(id).fetch_one(&self.pool).await?;
        row.try_into()
    }

    async fn stale_vessels(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<VesselRecord>, TrackerError> {
        let sql = format!(
            "SELECT {VESSEL_COLUMNS} FROM vessels
             WHERE last_update_at < $1 AND tracking_status <> 'OFFLINE'"
        );
        let rows: Vec<VesselRow> = sqlx::query_as(&sql).bind(cutoff).fetch_all(&self.pool).await?;

        rows.into_iter().map(VesselRecord::try_from).collect()
    }

    async fn demote_if_stale(&self, id: i64, cutoff: DateTime<Utc>) -> Result<bool, TrackerError> {
        let result = sqlx::query(
            "UPDATE vessels SET tracking_status = 'NO_SIGNAL'
             WHERE id = $1 AND last_update_at < $2 AND tracking_status <> 'OFFLINE'",
        )
        .bind(id)
        .bind(cutoff)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
