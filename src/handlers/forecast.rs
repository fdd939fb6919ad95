//! Forecast handler

use axum::{extract::{Query, State}, Json};
use chrono::Utc;
use serde::Deserialize;

use crate::{AppState, AppResult, AppError};
use crate::risk::Forecast;

const DEFAULT_DAYS: u32 = 7;
const MAX_DAYS: u32 = 30;

#[derive(Debug, Deserialize, Default)]
pub struct ForecastQuery {
    pub days: Option<u32>,
}

pub async fn get(
    State(state): State<AppState>,
    Query(query): Query<ForecastQuery>,
) -> AppResult<Json<Forecast>> {
    let days = query.days.unwrap_or(DEFAULT_DAYS);
    if !(1..=MAX_DAYS).contains(&days) {
        return Err(AppError::ValidationError(format!("days must be between 1 and {}", MAX_DAYS)));
    }

    let forecast = state.model.forecast(days, Utc::now()).await?;
    Ok(Json(forecast))
}
