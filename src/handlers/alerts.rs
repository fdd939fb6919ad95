//! Alert handlers

use axum::{extract::{rejection::JsonRejection, Path, Query, State}, Json};
use chrono::{Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{AppState, AppResult, AppError};
use crate::config::MAX_LOOKBACK_DAYS;
use crate::models::{Alert, AlertFilter, StatusChange, UpdateAlertStatus};

#[derive(Debug, Serialize)]
pub struct AlertsResponse {
    pub alerts: Vec<Alert>,
}

/// Recent alerts, most recent first. Empty list when there are none.
pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<AlertFilter>,
) -> AppResult<Json<AlertsResponse>> {
    let days = filter.days.unwrap_or(state.config.alert_lookback_days);
    if !(1..=MAX_LOOKBACK_DAYS).contains(&days) {
        return Err(AppError::ValidationError(format!(
            "days must be between 1 and {}",
            MAX_LOOKBACK_DAYS
        )));
    }

    let alerts = state.alerts.list_since(Utc::now() - Duration::days(days)).await?;
    Ok(Json(AlertsResponse { alerts }))
}

/// Operator lifecycle transition
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateAlertStatus>, JsonRejection>,
) -> AppResult<Json<Alert>> {
    let Json(req) = payload?;
    match state.alerts.update_status(id, req.status).await? {
        StatusChange::Updated(alert) => {
            tracing::info!(alert_id = %alert.id, status = %alert.status, "Alert status changed");
            Ok(Json(alert))
        }
        StatusChange::Rejected { current } => Err(AppError::InvalidTransition(format!(
            "Cannot move alert from {} to {}",
            current, req.status
        ))),
        StatusChange::NotFound => Err(AppError::NotFound("Alert not found".to_string())),
    }
}
