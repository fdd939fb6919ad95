//! Assessment pipeline
//!
//! One run: risk model -> level from thresholds -> assessment (+ alert for
//! HIGH/CRITICAL) committed together -> notification hook. Runs share no
//! state, so two runs always append two assessments.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::PipelineError;
use crate::models::{Alert, AlertDraft, NewRiskAssessment};
use crate::risk::{format_percentage, RiskModel, RiskThresholds};
use crate::store::{ReadingStore, RecordedRun, RunRecorder};
use super::{Notifier, RunGate, TriggerPolicy};

pub type AssessmentOutcome = RecordedRun;

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub thresholds: RiskThresholds,
    pub trigger: TriggerPolicy,
    pub timeout: Duration,
    pub cooldown: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            thresholds: RiskThresholds::default(),
            trigger: TriggerPolicy::default(),
            timeout: Duration::from_secs(5),
            cooldown: Duration::ZERO,
        }
    }
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Result<Self, String> {
        Ok(Self {
            thresholds: config.thresholds()?,
            trigger: TriggerPolicy::new(
                chrono::Duration::try_minutes(config.trigger_window_minutes)
                    .ok_or_else(|| "TRIGGER_WINDOW_MINUTES is out of range".to_string())?,
                config.trigger_min_readings,
            ),
            timeout: Duration::from_millis(config.assessment_timeout_ms),
            cooldown: Duration::from_secs(config.assessment_cooldown_secs),
        })
    }
}

pub struct AssessmentPipeline {
    readings: Arc<dyn ReadingStore>,
    recorder: Arc<dyn RunRecorder>,
    model: Arc<dyn RiskModel>,
    notifier: Arc<dyn Notifier>,
    thresholds: RiskThresholds,
    trigger: TriggerPolicy,
    timeout: Duration,
    gate: RunGate,
}

impl AssessmentPipeline {
    pub fn new(
        readings: Arc<dyn ReadingStore>,
        recorder: Arc<dyn RunRecorder>,
        model: Arc<dyn RiskModel>,
        notifier: Arc<dyn Notifier>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            readings,
            recorder,
            model,
            notifier,
            thresholds: settings.thresholds,
            trigger: settings.trigger,
            timeout: settings.timeout,
            gate: RunGate::new(settings.cooldown),
        }
    }

    pub fn trigger(&self) -> &TriggerPolicy {
        &self.trigger
    }

    pub fn readings(&self) -> &dyn ReadingStore {
        self.readings.as_ref()
    }

    /// Run once. Reading the window and the model call are abandoned after
    /// the configured timeout. A commit that has started is never cancelled,
    /// so the reported outcome always matches what was stored.
    pub async fn run_assessment(&self, now: DateTime<Utc>) -> Result<AssessmentOutcome, PipelineError> {
        let (assessment, readings) = match tokio::time::timeout(self.timeout, self.evaluate(now)).await {
            Ok(result) => result?,
            Err(_) => return Err(PipelineError::TimedOut(self.timeout)),
        };
        self.commit(assessment, readings).await
    }

    /// Run through the gate. `None` when another gated run holds it or the
    /// cool-down has not elapsed.
    pub async fn run_gated(&self, now: DateTime<Utc>) -> Option<Result<AssessmentOutcome, PipelineError>> {
        let Some(_permit) = self.gate.try_enter() else {
            tracing::debug!("assessment skipped, gate closed");
            return None;
        };
        Some(self.run_assessment(now).await)
    }

    /// Window read and model call. Returns the assessment to store and the
    /// number of readings it was built from.
    async fn evaluate(&self, now: DateTime<Utc>) -> Result<(NewRiskAssessment, usize), PipelineError> {
        let window = self
            .readings
            .list_since(self.trigger.window_start(now), now)
            .await?;

        let outcome = self.model.classify(Some(window.as_slice())).await?;
        let assessment = NewRiskAssessment::from_outcome(outcome, &self.thresholds, now)?;
        Ok((assessment, window.len()))
    }

    async fn commit(
        &self,
        assessment: NewRiskAssessment,
        readings: usize,
    ) -> Result<AssessmentOutcome, PipelineError> {
        let alert = AlertDraft::for_assessment(&assessment);
        let recorded = self.recorder.record_run(assessment, alert).await?;

        tracing::info!(
            assessment_id = %recorded.assessment.id,
            readings,
            "✅ Risk assessment stored: {} ({})",
            recorded.assessment.risk_level,
            format_percentage(recorded.assessment.probability)
        );

        if let Some(alert) = &recorded.alert {
            self.dispatch_notification(alert.clone());
        }

        Ok(recorded)
    }

    /// Fire and forget. Delivery errors are logged and never reach the run.
    fn dispatch_notification(&self, alert: Alert) {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let Err(e) = notifier.notify(&alert).await {
                tracing::warn!(alert_id = %alert.id, "Notification failed: {}", e);
            }
        });
    }
}
