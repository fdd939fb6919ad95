//! Risk map handler

use axum::{extract::State, Json};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::{AppState, AppResult};
use crate::risk::RiskMapCell;

#[derive(Debug, Serialize)]
pub struct RiskMapResponse {
    pub risk_zones: Vec<RiskMapCell>,
    pub timestamp: DateTime<Utc>,
}

pub async fn get(
    State(state): State<AppState>,
) -> AppResult<Json<RiskMapResponse>> {
    let now = Utc::now();
    let since = now - Duration::hours(state.config.risk_map_window_hours);

    let recent = state.pipeline.readings().list_since(since, now).await?;
    let risk_zones = state.model.risk_map(&recent).await?;

    Ok(Json(RiskMapResponse {
        risk_zones,
        timestamp: now,
    }))
}
