//! Risk assessment model

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{types::Json, FromRow, PgExecutor, PgPool};
use uuid::Uuid;

use crate::error::{ModelError, PersistenceError};
use crate::risk::{compose_recommendations, AffectedZone, RiskLevel, RiskOutcome, RiskThresholds};

/// Immutable snapshot produced by one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub id: Uuid,
    pub risk_level: RiskLevel,
    pub probability: f64,
    pub affected_zones: Vec<AffectedZone>,
    pub recommendations: Vec<String>,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Assessment content before it is appended. Only built from a model
/// outcome, so level and probability always agree.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRiskAssessment {
    risk_level: RiskLevel,
    probability: f64,
    affected_zones: Vec<AffectedZone>,
    recommendations: Vec<String>,
    created_at: DateTime<Utc>,
}

impl NewRiskAssessment {
    pub fn from_outcome(
        outcome: RiskOutcome,
        thresholds: &RiskThresholds,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ModelError> {
        let probability = outcome.checked_probability()?;
        let risk_level = thresholds.classify(probability);

        Ok(Self {
            risk_level,
            probability,
            recommendations: compose_recommendations(risk_level, &outcome.recommendations),
            affected_zones: outcome.affected_zones,
            created_at,
        })
    }

    pub fn risk_level(&self) -> RiskLevel {
        self.risk_level
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    pub fn affected_zones(&self) -> &[AffectedZone] {
        &self.affected_zones
    }

    pub fn recommendations(&self) -> &[String] {
        &self.recommendations
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn into_assessment(self, id: Uuid) -> RiskAssessment {
        RiskAssessment {
            id,
            risk_level: self.risk_level,
            probability: self.probability,
            affected_zones: self.affected_zones,
            recommendations: self.recommendations,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct AssessmentRow {
    id: Uuid,
    risk_level: String,
    probability: f64,
    affected_zones: Json<Vec<AffectedZone>>,
    recommendations: Json<Vec<String>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AssessmentRow> for RiskAssessment {
    type Error = PersistenceError;

    fn try_from(row: AssessmentRow) -> Result<Self, Self::Error> {
        Ok(RiskAssessment {
            id: row.id,
            risk_level: row.risk_level.parse().map_err(PersistenceError::Corrupt)?,
            probability: row.probability,
            affected_zones: row.affected_zones.0,
            recommendations: row.recommendations.0,
            created_at: row.created_at,
        })
    }
}

impl RiskAssessment {
    pub async fn insert<'e, E: PgExecutor<'e>>(
        executor: E,
        data: &NewRiskAssessment,
    ) -> Result<Self, PersistenceError> {
        let row = sqlx::query_as::<_, AssessmentRow>(
            r#"
            INSERT INTO risk_assessments (risk_level, probability, affected_zones, recommendations, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#
        )
        .bind(data.risk_level.as_str())
        .bind(data.probability)
        .bind(Json(&data.affected_zones))
        .bind(Json(&data.recommendations))
        .bind(data.created_at)
        .fetch_one(executor)
        .await?;

        row.try_into()
    }

    pub async fn latest(pool: &PgPool) -> Result<Option<Self>, PersistenceError> {
        let row = sqlx::query_as::<_, AssessmentRow>(
            "SELECT * FROM risk_assessments ORDER BY created_at DESC, seq DESC LIMIT 1"
        )
        .fetch_optional(pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(probability: f64) -> RiskOutcome {
        RiskOutcome {
            probability,
            affected_zones: vec![AffectedZone {
                lat: -23.5505,
                lng: -46.6333,
                radius: 50.0,
                risk_score: 6,
            }],
            recommendations: vec![],
        }
    }

    #[test]
    fn test_level_derived_from_probability() {
        let now = Utc::now();
        let t = RiskThresholds::default();

        let medium = NewRiskAssessment::from_outcome(outcome(0.42), &t, now).unwrap();
        assert_eq!(medium.risk_level(), RiskLevel::Medium);
        assert_eq!(medium.recommendations().len(), 3);

        let high = NewRiskAssessment::from_outcome(outcome(0.5), &t, now).unwrap();
        assert_eq!(high.risk_level(), RiskLevel::High);
        assert_eq!(high.recommendations().len(), 5);
        assert_eq!(high.affected_zones()[0].risk_score, 6);
    }

    #[test]
    fn test_out_of_range_probability_rejected() {
        let err = NewRiskAssessment::from_outcome(outcome(1.5), &RiskThresholds::default(), Utc::now());
        assert_eq!(err, Err(ModelError::InvalidProbability(1.5)));
    }
}
