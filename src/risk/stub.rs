//! Stochastic placeholder model
//!
//! Draws probabilities at random around a fixed site origin. It stands in
//! for a real geophysical model and ignores the readings it is given.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::error::ModelError;
use crate::models::SensorReading;
use super::{AffectedZone, Forecast, RiskMapCell, RiskModel, RiskOutcome, RiskThresholds};

const MAP_CELLS: usize = 8;
const MAP_STEP_DEG: f64 = 0.001;

pub struct StochasticRiskModel {
    origin_lat: f64,
    origin_lng: f64,
    thresholds: RiskThresholds,
}

impl StochasticRiskModel {
    pub fn new(origin_lat: f64, origin_lng: f64, thresholds: RiskThresholds) -> Self {
        Self {
            origin_lat,
            origin_lng,
            thresholds,
        }
    }

    fn draw_outcome(&self) -> RiskOutcome {
        let probability = rand::thread_rng().gen_range(0.2..0.8);
        RiskOutcome {
            probability,
            affected_zones: vec![
                AffectedZone {
                    lat: self.origin_lat,
                    lng: self.origin_lng,
                    radius: 50.0,
                    risk_score: (probability * 10.0) as i32,
                },
                AffectedZone {
                    lat: self.origin_lat - 0.001,
                    lng: self.origin_lng - 0.001,
                    radius: 75.0,
                    risk_score: (probability * 8.0) as i32,
                },
            ],
            recommendations: Vec::new(),
        }
    }

    fn draw_map(&self) -> Vec<RiskMapCell> {
        let mut rng = rand::thread_rng();
        (0..MAP_CELLS)
            .map(|i| {
                let risk_value: f64 = rng.gen_range(0.0..1.0);
                RiskMapCell {
                    lat: self.origin_lat + i as f64 * MAP_STEP_DEG,
                    lng: self.origin_lng + i as f64 * MAP_STEP_DEG,
                    risk_value,
                    risk_level: self.thresholds.classify(risk_value),
                }
            })
            .collect()
    }

    fn draw_forecast(&self, days: u32, from: DateTime<Utc>) -> Forecast {
        let mut rng = rand::thread_rng();
        let base: f64 = rng.gen_range(0.3..0.6);

        let mut forecast = Forecast {
            dates: Vec::with_capacity(days as usize),
            probabilities: Vec::with_capacity(days as usize),
            confidence_intervals: Vec::with_capacity(days as usize),
        };

        for day in 0..days {
            let noise: f64 = rng.gen_range(-0.05..0.05);
            let p = (base + day as f64 * 0.02 + noise).clamp(0.0, 1.0);

            forecast.dates.push(from + Duration::days(day as i64));
            forecast.probabilities.push(p);
            forecast.confidence_intervals.push([(p - 0.1).max(0.0), (p + 0.1).min(1.0)]);
        }
        forecast
    }
}

#[async_trait]
impl RiskModel for StochasticRiskModel {
    async fn classify(&self, window: Option<&[SensorReading]>) -> Result<RiskOutcome, ModelError> {
        tracing::debug!(readings = window.map_or(0, |w| w.len()), "stochastic model invoked");
        Ok(self.draw_outcome())
    }

    async fn risk_map(&self, _readings: &[SensorReading]) -> Result<Vec<RiskMapCell>, ModelError> {
        Ok(self.draw_map())
    }

    async fn forecast(&self, days: u32, from: DateTime<Utc>) -> Result<Forecast, ModelError> {
        Ok(self.draw_forecast(days, from))
    }
}
