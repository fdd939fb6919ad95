//! Sensor data handlers

use axum::{extract::{rejection::JsonRejection, State}, Json};
use serde::Serialize;
use uuid::Uuid;

use crate::{AppState, AppResult};
use crate::models::SubmitReading;
use crate::pipeline::AssessmentStatus;

#[derive(Debug, Serialize)]
pub struct SubmitReadingResponse {
    pub status: &'static str,
    pub id: Uuid,
    pub assessment: AssessmentStatus,
}

/// Store a reading and run a triggered assessment before replying.
/// The reply is a success whenever the reading was stored.
pub async fn submit(
    State(state): State<AppState>,
    payload: Result<Json<SubmitReading>, JsonRejection>,
) -> AppResult<Json<SubmitReadingResponse>> {
    let Json(req) = payload?;
    let reading = req.into_new_reading()?;

    let receipt = state.ingestor.ingest(reading).await?;

    Ok(Json(SubmitReadingResponse {
        status: "success",
        id: receipt.reading.id,
        assessment: receipt.assessment,
    }))
}
