//! Risk model contract

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::models::SensorReading;
use super::RiskLevel;

/// Spatial region annotated with a local risk score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffectedZone {
    pub lat: f64,
    pub lng: f64,
    pub radius: f64,
    pub risk_score: i32,
}

/// Raw model output. The level is derived by the caller from `probability`.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskOutcome {
    pub probability: f64,
    pub affected_zones: Vec<AffectedZone>,
    /// Model-specific advice, appended after the standard recommendations
    pub recommendations: Vec<String>,
}

impl RiskOutcome {
    pub fn checked_probability(&self) -> Result<f64, ModelError> {
        if (0.0..=1.0).contains(&self.probability) {
            Ok(self.probability)
        } else {
            Err(ModelError::InvalidProbability(self.probability))
        }
    }
}

/// One cell of the spatial risk map
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskMapCell {
    pub lat: f64,
    pub lng: f64,
    pub risk_value: f64,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    pub dates: Vec<DateTime<Utc>>,
    pub probabilities: Vec<f64>,
    pub confidence_intervals: Vec<[f64; 2]>,
}

/// Pluggable mapping from a window of readings to a risk outcome.
/// `None` means the caller has no window to offer.
#[async_trait]
pub trait RiskModel: Send + Sync {
    async fn classify(&self, window: Option<&[SensorReading]>) -> Result<RiskOutcome, ModelError>;

    async fn risk_map(&self, readings: &[SensorReading]) -> Result<Vec<RiskMapCell>, ModelError>;

    async fn forecast(&self, days: u32, from: DateTime<Utc>) -> Result<Forecast, ModelError>;
}
