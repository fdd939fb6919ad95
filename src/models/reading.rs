//! Sensor reading model

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::ValidationError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SensorReading {
    pub id: Uuid,
    pub sensor_id: String,
    pub sensor_type: String,
    pub location_x: f64,
    pub location_y: f64,
    pub value: f64,
    pub unit: String,
    #[serde(rename = "timestamp")]
    pub captured_at: DateTime<Utc>,
    pub received_at: DateTime<Utc>,
}

/// Submit-reading payload. Every field is optional on the wire so that a
/// missing one surfaces as a validation error rather than a decode failure.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SubmitReading {
    #[validate(required, length(min = 1, max = 50))]
    pub sensor_id: Option<String>,
    #[validate(required, length(min = 1, max = 50))]
    pub sensor_type: Option<String>,
    #[validate(required)]
    pub location_x: Option<f64>,
    #[validate(required)]
    pub location_y: Option<f64>,
    #[validate(required)]
    pub value: Option<f64>,
    #[validate(required, length(min = 1, max = 20))]
    pub unit: Option<String>,
    #[validate(required)]
    pub timestamp: Option<String>,
}

/// A reading that passed validation and is ready to be appended
#[derive(Debug, Clone, PartialEq)]
pub struct NewReading {
    pub sensor_id: String,
    pub sensor_type: String,
    pub location_x: f64,
    pub location_y: f64,
    pub value: f64,
    pub unit: String,
    pub captured_at: DateTime<Utc>,
}

impl SubmitReading {
    pub fn into_new_reading(self) -> Result<NewReading, ValidationError> {
        self.validate()?;

        let captured_at = parse_timestamp(&required(self.timestamp, "timestamp")?)?;

        Ok(NewReading {
            sensor_id: required(self.sensor_id, "sensor_id")?,
            sensor_type: required(self.sensor_type, "sensor_type")?,
            location_x: finite(required(self.location_x, "location_x")?, "location_x")?,
            location_y: finite(required(self.location_y, "location_y")?, "location_y")?,
            value: finite(required(self.value, "value")?, "value")?,
            unit: required(self.unit, "unit")?,
            captured_at,
        })
    }
}

fn required<T>(field: Option<T>, name: &'static str) -> Result<T, ValidationError> {
    field.ok_or_else(|| ValidationError::MissingField(name.to_string()))
}

fn finite(v: f64, name: &'static str) -> Result<f64, ValidationError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(ValidationError::InvalidField {
            field: name.to_string(),
            reason: "must be a finite number".to_string(),
        })
    }
}

/// RFC 3339, or a naive ISO-8601 date-time taken as UTC
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ValidationError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(naive.and_utc());
        }
    }

    Err(ValidationError::InvalidTimestamp(raw.to_string()))
}

impl SensorReading {
    pub async fn insert(pool: &PgPool, data: &NewReading) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, SensorReading>(
            r#"
            INSERT INTO sensor_readings (sensor_id, sensor_type, location_x, location_y, value, unit, captured_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#
        )
        .bind(&data.sensor_id)
        .bind(&data.sensor_type)
        .bind(data.location_x)
        .bind(data.location_y)
        .bind(data.value)
        .bind(&data.unit)
        .bind(data.captured_at)
        .fetch_one(pool)
        .await
    }

    /// Readings captured in `[since, until]`
    pub async fn count_between(
        pool: &PgPool,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sensor_readings WHERE captured_at >= $1 AND captured_at <= $2"
        )
        .bind(since)
        .bind(until)
        .fetch_one(pool)
        .await
    }

    /// Readings captured in `[since, until]`, oldest first
    pub async fn list_between(
        pool: &PgPool,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, SensorReading>(
            r#"
            SELECT * FROM sensor_readings
            WHERE captured_at >= $1 AND captured_at <= $2
            ORDER BY captured_at ASC, received_at ASC
            "#
        )
        .bind(since)
        .bind(until)
        .fetch_all(pool)
        .await
    }
}
