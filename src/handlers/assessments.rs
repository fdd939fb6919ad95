//! Risk assessment handlers

use axum::{extract::State, Json};
use chrono::Utc;

use crate::{AppState, AppResult};
use crate::models::RiskAssessment;
use crate::pipeline::AssessmentOutcome;

/// Latest assessment, `null` before the first run
pub async fn latest(
    State(state): State<AppState>,
) -> AppResult<Json<Option<RiskAssessment>>> {
    let assessment = state.assessments.latest().await?;
    Ok(Json(assessment))
}

/// Forced run, bypassing the trigger and the gate
pub async fn run(
    State(state): State<AppState>,
) -> AppResult<Json<AssessmentOutcome>> {
    let outcome = state.pipeline.run_assessment(Utc::now()).await?;
    tracing::info!(assessment_id = %outcome.assessment.id, "Forced assessment completed");
    Ok(Json(outcome))
}
