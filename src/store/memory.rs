//! In-process stores

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::PersistenceError;
use crate::models::{
    Alert, AlertDraft, AlertStatus, NewReading, NewRiskAssessment, RiskAssessment, SensorReading,
    StatusChange,
};
use super::{AlertStore, AssessmentStore, ReadingStore, RecordedRun, RunRecorder};

#[derive(Default)]
struct Tables {
    readings: Vec<SensorReading>,
    assessments: Vec<RiskAssessment>,
    alerts: Vec<Alert>,
    faults: Faults,
}

/// Injected write failures
#[derive(Default, Clone, Copy)]
struct Faults {
    readings: bool,
    alerts: bool,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn fail_reading_writes(&self, fail: bool) {
        self.tables.write().await.faults.readings = fail;
    }

    #[cfg(test)]
    pub async fn fail_alert_writes(&self, fail: bool) {
        self.tables.write().await.faults.alerts = fail;
    }

    #[cfg(test)]
    pub async fn assessment_count(&self) -> usize {
        self.tables.read().await.assessments.len()
    }

    #[cfg(test)]
    pub async fn alert_count(&self) -> usize {
        self.tables.read().await.alerts.len()
    }
}

fn push_alert(tables: &mut Tables, assessment_id: Uuid, draft: AlertDraft) -> Result<Alert, PersistenceError> {
    if tables.faults.alerts {
        return Err(PersistenceError::Unavailable("alert store rejected write".to_string()));
    }
    let alert = draft.into_alert(Uuid::new_v4(), assessment_id);
    tables.alerts.push(alert.clone());
    Ok(alert)
}

#[async_trait]
impl ReadingStore for MemoryStore {
    async fn append(&self, reading: NewReading) -> Result<SensorReading, PersistenceError> {
        let mut tables = self.tables.write().await;
        if tables.faults.readings {
            return Err(PersistenceError::Unavailable("reading store rejected write".to_string()));
        }

        let stored = SensorReading {
            id: Uuid::new_v4(),
            sensor_id: reading.sensor_id,
            sensor_type: reading.sensor_type,
            location_x: reading.location_x,
            location_y: reading.location_y,
            value: reading.value,
            unit: reading.unit,
            captured_at: reading.captured_at,
            received_at: Utc::now(),
        };
        tables.readings.push(stored.clone());
        Ok(stored)
    }

    async fn count_since(&self, since: DateTime<Utc>, until: DateTime<Utc>) -> Result<i64, PersistenceError> {
        let tables = self.tables.read().await;
        let count = tables
            .readings
            .iter()
            .filter(|r| r.captured_at >= since && r.captured_at <= until)
            .count();
        Ok(count as i64)
    }

    async fn list_since(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<SensorReading>, PersistenceError> {
        let tables = self.tables.read().await;
        let mut window: Vec<SensorReading> = tables
            .readings
            .iter()
            .filter(|r| r.captured_at >= since && r.captured_at <= until)
            .cloned()
            .collect();
        window.sort_by_key(|r| r.captured_at);
        Ok(window)
    }
}

#[async_trait]
impl AssessmentStore for MemoryStore {
    async fn append(&self, assessment: NewRiskAssessment) -> Result<Uuid, PersistenceError> {
        let id = Uuid::new_v4();
        self.tables.write().await.assessments.push(assessment.into_assessment(id));
        Ok(id)
    }

    async fn latest(&self) -> Result<Option<RiskAssessment>, PersistenceError> {
        let tables = self.tables.read().await;
        // max_by_key keeps the last of equal keys, i.e. the newest insert
        Ok(tables.assessments.iter().max_by_key(|a| a.created_at).cloned())
    }
}

#[async_trait]
impl AlertStore for MemoryStore {
    async fn append(&self, assessment_id: Uuid, alert: AlertDraft) -> Result<Uuid, PersistenceError> {
        let mut tables = self.tables.write().await;
        push_alert(&mut tables, assessment_id, alert).map(|a| a.id)
    }

    async fn list_since(&self, since: DateTime<Utc>) -> Result<Vec<Alert>, PersistenceError> {
        let tables = self.tables.read().await;
        let mut alerts: Vec<Alert> = tables
            .alerts
            .iter()
            .rev()
            .filter(|a| a.created_at >= since)
            .cloned()
            .collect();
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(alerts)
    }

    async fn update_status(&self, id: Uuid, status: AlertStatus) -> Result<StatusChange, PersistenceError> {
        let mut tables = self.tables.write().await;
        let Some(alert) = tables.alerts.iter_mut().find(|a| a.id == id) else {
            return Ok(StatusChange::NotFound);
        };

        if !alert.status.can_transition_to(status) {
            return Ok(StatusChange::Rejected { current: alert.status });
        }
        alert.status = status;
        alert.updated_at = Utc::now();
        Ok(StatusChange::Updated(alert.clone()))
    }
}

#[async_trait]
impl RunRecorder for MemoryStore {
    async fn record_run(
        &self,
        assessment: NewRiskAssessment,
        alert: Option<AlertDraft>,
    ) -> Result<RecordedRun, PersistenceError> {
        let mut tables = self.tables.write().await;

        let assessment = assessment.into_assessment(Uuid::new_v4());
        tables.assessments.push(assessment.clone());

        let alert = match alert {
            Some(draft) => match push_alert(&mut tables, assessment.id, draft) {
                Ok(alert) => Some(alert),
                Err(e) => {
                    tables.assessments.pop();
                    return Err(e);
                }
            },
            None => None,
        };

        Ok(RecordedRun { assessment, alert })
    }
}
