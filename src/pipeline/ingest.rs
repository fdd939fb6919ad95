//! Reading ingestion
//!
//! Persist, consult the trigger, and run one gated assessment before the
//! caller is acknowledged. Only the reading write can fail an ingestion.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::PersistenceError;
use crate::models::{NewReading, SensorReading};
use crate::risk::RiskLevel;
use super::AssessmentPipeline;

/// What happened to the assessment side of an ingestion
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AssessmentStatus {
    NotTriggered,
    Completed {
        assessment_id: Uuid,
        risk_level: RiskLevel,
        alert_id: Option<Uuid>,
    },
    Skipped,
    Failed { reason: String },
}

#[derive(Debug, Clone)]
pub struct IngestReceipt {
    pub reading: SensorReading,
    pub assessment: AssessmentStatus,
}

pub struct Ingestor {
    pipeline: Arc<AssessmentPipeline>,
}

impl Ingestor {
    pub fn new(pipeline: Arc<AssessmentPipeline>) -> Self {
        Self { pipeline }
    }

    pub async fn ingest(&self, reading: NewReading) -> Result<IngestReceipt, PersistenceError> {
        self.ingest_at(reading, Utc::now()).await
    }

    pub async fn ingest_at(
        &self,
        reading: NewReading,
        now: DateTime<Utc>,
    ) -> Result<IngestReceipt, PersistenceError> {
        let reading = self.pipeline.readings().append(reading).await?;
        tracing::debug!(reading_id = %reading.id, sensor = %reading.sensor_id, "reading stored");

        let assessment = self.assess_after_ingest(now).await;

        Ok(IngestReceipt { reading, assessment })
    }

    async fn assess_after_ingest(&self, now: DateTime<Utc>) -> AssessmentStatus {
        let triggered = self
            .pipeline
            .trigger()
            .should_evaluate(self.pipeline.readings(), now)
            .await;

        match triggered {
            Ok(false) => AssessmentStatus::NotTriggered,
            Ok(true) => match self.pipeline.run_gated(now).await {
                None => AssessmentStatus::Skipped,
                Some(Ok(run)) => AssessmentStatus::Completed {
                    assessment_id: run.assessment.id,
                    risk_level: run.assessment.risk_level,
                    alert_id: run.alert.map(|a| a.id),
                },
                Some(Err(e)) => {
                    tracing::error!("Prediction error: {}", e);
                    AssessmentStatus::Failed { reason: e.to_string() }
                }
            },
            Err(e) => {
                tracing::warn!("Trigger evaluation failed: {}", e);
                AssessmentStatus::Failed { reason: e.to_string() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PipelineSettings;
    use crate::store::{AlertStore, AssessmentStore, MemoryStore, ReadingStore};
    use crate::testing::{pipeline_with, FailingRiskModel, FixedRiskModel, RecordingNotifier, SlowRiskModel};
    use chrono::Duration;
    use tokio_test::{assert_err, assert_ok};

    fn reading(at: DateTime<Utc>) -> NewReading {
        NewReading {
            sensor_id: "EXT-02".to_string(),
            sensor_type: "extensometer".to_string(),
            location_x: -23.5505,
            location_y: -46.6333,
            value: 3.1,
            unit: "mm".to_string(),
            captured_at: at,
        }
    }

    fn ingestor(store: Arc<MemoryStore>, probability: f64) -> Ingestor {
        Ingestor::new(Arc::new(pipeline_with(store, Arc::new(FixedRiskModel::new(probability)))))
    }

    #[tokio::test]
    async fn test_ten_readings_raise_one_critical_alert() {
        let store = Arc::new(MemoryStore::new());
        let ingestor = ingestor(store.clone(), 0.75);
        let now = Utc::now();

        let mut statuses = Vec::new();
        for i in 0..10 {
            // ten readings spread over five minutes
            let at = now - Duration::seconds(300 - i * 30);
            let receipt = ingestor.ingest_at(reading(at), now).await.unwrap();
            statuses.push(receipt.assessment);
        }

        assert!(statuses[..9].iter().all(|s| *s == AssessmentStatus::NotTriggered));
        assert!(matches!(
            statuses[9],
            AssessmentStatus::Completed { risk_level: RiskLevel::Critical, alert_id: Some(_), .. }
        ));

        assert_eq!(store.assessment_count().await, 1);
        let assessment = store.latest().await.unwrap().unwrap();
        assert_eq!(assessment.risk_level, RiskLevel::Critical);

        let alerts = AlertStore::list_since(store.as_ref(), now - Duration::days(7)).await.unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, RiskLevel::Critical);
        assert_eq!(alerts[0].location, assessment.affected_zones);
        assert_eq!(alerts[0].assessment_id, assessment.id);
    }

    #[tokio::test]
    async fn test_nine_readings_assess_nothing() {
        let store = Arc::new(MemoryStore::new());
        let ingestor = ingestor(store.clone(), 0.75);
        let now = Utc::now();

        for i in 0..9 {
            let receipt = ingestor.ingest_at(reading(now - Duration::minutes(i)), now).await.unwrap();
            assert_eq!(receipt.assessment, AssessmentStatus::NotTriggered);
        }

        assert_eq!(store.assessment_count().await, 0);
        assert_eq!(store.alert_count().await, 0);
    }

    #[tokio::test]
    async fn test_model_failure_does_not_fail_ingestion() {
        let store = Arc::new(MemoryStore::new());
        let ingestor = Ingestor::new(Arc::new(pipeline_with(store.clone(), Arc::new(FailingRiskModel))));
        let now = Utc::now();

        for i in 0..9 {
            assert_ok!(ingestor.ingest_at(reading(now - Duration::minutes(i)), now).await);
        }
        let receipt = ingestor.ingest_at(reading(now), now).await.unwrap();

        assert!(matches!(receipt.assessment, AssessmentStatus::Failed { .. }));
        assert_eq!(
            store.count_since(now - Duration::minutes(30), now).await.unwrap(),
            10
        );
        assert_eq!(store.assessment_count().await, 0);
        assert_eq!(store.alert_count().await, 0);
    }

    #[tokio::test]
    async fn test_reading_write_failure_fails_ingestion() {
        let store = Arc::new(MemoryStore::new());
        store.fail_reading_writes(true).await;
        let ingestor = ingestor(store.clone(), 0.75);

        assert_err!(ingestor.ingest(reading(Utc::now())).await);
    }

    #[tokio::test]
    async fn test_overlapping_trigger_is_skipped() {
        let store = Arc::new(MemoryStore::new());
        let pipeline = Arc::new(AssessmentPipeline::new(
            store.clone(),
            store.clone(),
            Arc::new(SlowRiskModel::new(std::time::Duration::from_millis(200), 0.6)),
            Arc::new(RecordingNotifier::new().0),
            PipelineSettings::default(),
        ));
        let ingestor = Arc::new(Ingestor::new(pipeline));
        let now = Utc::now();

        for i in 0..10 {
            ingestor.ingest_at(reading(now - Duration::minutes(i)), now).await.unwrap();
        }
        // the tenth reading ran one assessment; with it finished the gate is open again
        assert_eq!(store.assessment_count().await, 1);

        let first = {
            let ingestor = ingestor.clone();
            tokio::spawn(async move { ingestor.ingest_at(reading(now), now).await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        let second = ingestor.ingest_at(reading(now), now).await.unwrap();

        assert_eq!(second.assessment, AssessmentStatus::Skipped);
        let first = first.await.unwrap().unwrap();
        assert!(matches!(first.assessment, AssessmentStatus::Completed { .. }));
        assert_eq!(store.assessment_count().await, 2);
    }

    #[test]
    fn test_status_wire_format() {
        let json = serde_json::to_value(AssessmentStatus::NotTriggered).unwrap();
        assert_eq!(json, serde_json::json!({ "state": "not_triggered" }));

        let json = serde_json::to_value(AssessmentStatus::Failed { reason: "x".into() }).unwrap();
        assert_eq!(json["state"], "failed");
    }
}
