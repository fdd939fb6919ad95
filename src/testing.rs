//! Test doubles shared by unit tests

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::error::{ModelError, NotificationError, PersistenceError};
use crate::models::{Alert, AlertDraft, NewRiskAssessment, SensorReading};
use crate::pipeline::{AssessmentPipeline, Notifier, PipelineSettings};
use crate::risk::{AffectedZone, Forecast, RiskMapCell, RiskModel, RiskOutcome, RiskThresholds};
use crate::store::{MemoryStore, RecordedRun, RunRecorder};

fn zones(probability: f64) -> Vec<AffectedZone> {
    vec![
        AffectedZone { lat: -23.5505, lng: -46.6333, radius: 50.0, risk_score: (probability * 10.0) as i32 },
        AffectedZone { lat: -23.5515, lng: -46.6343, radius: 75.0, risk_score: (probability * 8.0) as i32 },
    ]
}

/// Always returns the same probability
pub struct FixedRiskModel {
    probability: f64,
    last_window: Mutex<Option<usize>>,
}

impl FixedRiskModel {
    pub fn new(probability: f64) -> Self {
        Self {
            probability,
            last_window: Mutex::new(None),
        }
    }

    pub fn last_window_len(&self) -> Option<usize> {
        *self.last_window.lock().unwrap()
    }
}

#[async_trait]
impl RiskModel for FixedRiskModel {
    async fn classify(&self, window: Option<&[SensorReading]>) -> Result<RiskOutcome, ModelError> {
        *self.last_window.lock().unwrap() = window.map(|w| w.len());
        Ok(RiskOutcome {
            probability: self.probability,
            affected_zones: zones(self.probability),
            recommendations: vec![],
        })
    }

    async fn risk_map(&self, readings: &[SensorReading]) -> Result<Vec<RiskMapCell>, ModelError> {
        let thresholds = RiskThresholds::default();
        Ok(readings
            .iter()
            .map(|r| RiskMapCell {
                lat: r.location_x,
                lng: r.location_y,
                risk_value: self.probability,
                risk_level: thresholds.classify(self.probability),
            })
            .collect())
    }

    async fn forecast(&self, days: u32, from: DateTime<Utc>) -> Result<Forecast, ModelError> {
        let p = self.probability;
        Ok(Forecast {
            dates: (0..days).map(|d| from + ChronoDuration::days(d as i64)).collect(),
            probabilities: vec![p; days as usize],
            confidence_intervals: vec![[(p - 0.1).max(0.0), (p + 0.1).min(1.0)]; days as usize],
        })
    }
}

pub struct FailingRiskModel;

#[async_trait]
impl RiskModel for FailingRiskModel {
    async fn classify(&self, _window: Option<&[SensorReading]>) -> Result<RiskOutcome, ModelError> {
        Err(ModelError::Failed("model backend unavailable".to_string()))
    }

    async fn risk_map(&self, _readings: &[SensorReading]) -> Result<Vec<RiskMapCell>, ModelError> {
        Err(ModelError::Failed("model backend unavailable".to_string()))
    }

    async fn forecast(&self, _days: u32, _from: DateTime<Utc>) -> Result<Forecast, ModelError> {
        Err(ModelError::Failed("model backend unavailable".to_string()))
    }
}

/// Sleeps before answering like `FixedRiskModel`
pub struct SlowRiskModel {
    delay: Duration,
    inner: FixedRiskModel,
}

impl SlowRiskModel {
    pub fn new(delay: Duration, probability: f64) -> Self {
        Self {
            delay,
            inner: FixedRiskModel::new(probability),
        }
    }
}

#[async_trait]
impl RiskModel for SlowRiskModel {
    async fn classify(&self, window: Option<&[SensorReading]>) -> Result<RiskOutcome, ModelError> {
        tokio::time::sleep(self.delay).await;
        self.inner.classify(window).await
    }

    async fn risk_map(&self, readings: &[SensorReading]) -> Result<Vec<RiskMapCell>, ModelError> {
        self.inner.risk_map(readings).await
    }

    async fn forecast(&self, days: u32, from: DateTime<Utc>) -> Result<Forecast, ModelError> {
        self.inner.forecast(days, from).await
    }
}

/// Forwards every alert to a channel
pub struct RecordingNotifier {
    tx: mpsc::UnboundedSender<Alert>,
}

impl RecordingNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Alert>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, alert: &Alert) -> Result<(), NotificationError> {
        // receiver may be gone when the test does not care about delivery
        let _ = self.tx.send(alert.clone());
        Ok(())
    }
}

pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _alert: &Alert) -> Result<(), NotificationError> {
        Err(NotificationError::Delivery("smtp relay refused".to_string()))
    }
}

/// Commits to a memory store after a delay
pub struct SlowRecorder {
    delay: Duration,
    inner: Arc<MemoryStore>,
}

impl SlowRecorder {
    pub fn new(delay: Duration, inner: Arc<MemoryStore>) -> Self {
        Self { delay, inner }
    }
}

#[async_trait]
impl RunRecorder for SlowRecorder {
    async fn record_run(
        &self,
        assessment: NewRiskAssessment,
        alert: Option<AlertDraft>,
    ) -> Result<RecordedRun, PersistenceError> {
        tokio::time::sleep(self.delay).await;
        self.inner.record_run(assessment, alert).await
    }
}

/// Pipeline over one memory store with default settings
pub fn pipeline_with(store: Arc<MemoryStore>, model: Arc<dyn RiskModel>) -> AssessmentPipeline {
    AssessmentPipeline::new(
        store.clone(),
        store,
        model,
        Arc::new(RecordingNotifier::new().0),
        PipelineSettings::default(),
    )
}
