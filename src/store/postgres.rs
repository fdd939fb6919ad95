//! Postgres-backed stores

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::PersistenceError;
use crate::models::{
    Alert, AlertDraft, AlertStatus, NewReading, NewRiskAssessment, RiskAssessment, SensorReading,
    StatusChange,
};
use super::{AlertStore, AssessmentStore, ReadingStore, RecordedRun, RunRecorder};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReadingStore for PgStore {
    async fn append(&self, reading: NewReading) -> Result<SensorReading, PersistenceError> {
        Ok(SensorReading::insert(&self.pool, &reading).await?)
    }

    async fn count_since(&self, since: DateTime<Utc>, until: DateTime<Utc>) -> Result<i64, PersistenceError> {
        Ok(SensorReading::count_between(&self.pool, since, until).await?)
    }

    async fn list_since(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<SensorReading>, PersistenceError> {
        Ok(SensorReading::list_between(&self.pool, since, until).await?)
    }
}

#[async_trait]
impl AssessmentStore for PgStore {
    async fn append(&self, assessment: NewRiskAssessment) -> Result<Uuid, PersistenceError> {
        let stored = RiskAssessment::insert(&self.pool, &assessment).await?;
        Ok(stored.id)
    }

    async fn latest(&self) -> Result<Option<RiskAssessment>, PersistenceError> {
        RiskAssessment::latest(&self.pool).await
    }
}

#[async_trait]
impl AlertStore for PgStore {
    async fn append(&self, assessment_id: Uuid, alert: AlertDraft) -> Result<Uuid, PersistenceError> {
        let stored = Alert::insert(&self.pool, assessment_id, &alert).await?;
        Ok(stored.id)
    }

    async fn list_since(&self, since: DateTime<Utc>) -> Result<Vec<Alert>, PersistenceError> {
        Alert::list_since(&self.pool, since).await
    }

    async fn update_status(&self, id: Uuid, status: AlertStatus) -> Result<StatusChange, PersistenceError> {
        Alert::update_status(&self.pool, id, status).await
    }
}

#[async_trait]
impl RunRecorder for PgStore {
    async fn record_run(
        &self,
        assessment: NewRiskAssessment,
        alert: Option<AlertDraft>,
    ) -> Result<RecordedRun, PersistenceError> {
        // Dropping the transaction on any early return rolls it back
        let mut tx = self.pool.begin().await?;

        let assessment = RiskAssessment::insert(&mut *tx, &assessment).await?;
        let alert = match alert {
            Some(draft) => Some(Alert::insert(&mut *tx, assessment.id, &draft).await?),
            None => None,
        };

        tx.commit().await?;

        Ok(RecordedRun { assessment, alert })
    }
}
