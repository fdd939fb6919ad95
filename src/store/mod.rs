//! Store contracts for readings, assessments and alerts
//!
//! The pipeline only sees these traits. `PgStore` backs them with Postgres,
//! `MemoryStore` keeps everything in process.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::PersistenceError;
use crate::models::{
    Alert, AlertDraft, AlertStatus, NewReading, NewRiskAssessment, RiskAssessment, SensorReading,
    StatusChange,
};

/// Append-only reading repository
#[async_trait]
pub trait ReadingStore: Send + Sync {
    async fn append(&self, reading: NewReading) -> Result<SensorReading, PersistenceError>;

    /// Readings captured in `[since, until]`
    async fn count_since(&self, since: DateTime<Utc>, until: DateTime<Utc>) -> Result<i64, PersistenceError>;

    /// Readings captured in `[since, until]`, oldest first
    async fn list_since(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<SensorReading>, PersistenceError>;
}

#[async_trait]
pub trait AssessmentStore: Send + Sync {
    async fn append(&self, assessment: NewRiskAssessment) -> Result<Uuid, PersistenceError>;

    async fn latest(&self) -> Result<Option<RiskAssessment>, PersistenceError>;
}

#[async_trait]
pub trait AlertStore: Send + Sync {
    async fn append(&self, assessment_id: Uuid, alert: AlertDraft) -> Result<Uuid, PersistenceError>;

    /// Alerts created at or after `since`, most recent first
    async fn list_since(&self, since: DateTime<Utc>) -> Result<Vec<Alert>, PersistenceError>;

    async fn update_status(&self, id: Uuid, status: AlertStatus) -> Result<StatusChange, PersistenceError>;
}

/// What one committed pipeline run wrote
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedRun {
    pub assessment: RiskAssessment,
    pub alert: Option<Alert>,
}

/// All-or-nothing commit of one pipeline run
#[async_trait]
pub trait RunRecorder: Send + Sync {
    async fn record_run(
        &self,
        assessment: NewRiskAssessment,
        alert: Option<AlertDraft>,
    ) -> Result<RecordedRun, PersistenceError>;
}
