//! Alert model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, PgExecutor, PgPool};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::PersistenceError;
use crate::risk::{format_percentage, AffectedZone, RiskLevel};
use super::NewRiskAssessment;

pub const ROCKFALL_WARNING: &str = "ROCKFALL_WARNING";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertStatus {
    Active,
    Acknowledged,
    Resolved,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Active => "ACTIVE",
            AlertStatus::Acknowledged => "ACKNOWLEDGED",
            AlertStatus::Resolved => "RESOLVED",
        }
    }

    /// States an alert may be in when moved to `self`
    pub fn allowed_predecessors(&self) -> &'static [AlertStatus] {
        match self {
            AlertStatus::Active => &[],
            AlertStatus::Acknowledged => &[AlertStatus::Active],
            AlertStatus::Resolved => &[AlertStatus::Active, AlertStatus::Acknowledged],
        }
    }

    pub fn can_transition_to(&self, next: AlertStatus) -> bool {
        next.allowed_predecessors().contains(self)
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(AlertStatus::Active),
            "ACKNOWLEDGED" => Ok(AlertStatus::Acknowledged),
            "RESOLVED" => Ok(AlertStatus::Resolved),
            other => Err(format!("unknown alert status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub id: Uuid,
    pub assessment_id: Uuid,
    pub alert_type: String,
    pub severity: RiskLevel,
    pub message: String,
    /// Zones of the triggering assessment, copied at creation
    pub location: Vec<AffectedZone>,
    pub status: AlertStatus,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Alert content derived from an assessment, before it has an id
#[derive(Debug, Clone, PartialEq)]
pub struct AlertDraft {
    pub alert_type: String,
    pub severity: RiskLevel,
    pub message: String,
    pub location: Vec<AffectedZone>,
    pub created_at: DateTime<Utc>,
}

impl AlertDraft {
    /// `None` unless the assessment is HIGH or CRITICAL
    pub fn for_assessment(assessment: &NewRiskAssessment) -> Option<Self> {
        let severity = assessment.risk_level();
        if !severity.is_alerting() {
            return None;
        }

        Some(Self {
            alert_type: ROCKFALL_WARNING.to_string(),
            severity,
            message: format!(
                "{} rockfall risk detected. Probability: {}",
                severity,
                format_percentage(assessment.probability())
            ),
            location: assessment.affected_zones().to_vec(),
            created_at: assessment.created_at(),
        })
    }

    pub fn into_alert(self, id: Uuid, assessment_id: Uuid) -> Alert {
        Alert {
            id,
            assessment_id,
            alert_type: self.alert_type,
            severity: self.severity,
            message: self.message,
            location: self.location,
            status: AlertStatus::Active,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateAlertStatus {
    pub status: AlertStatus,
}

#[derive(Debug, Deserialize, Default)]
pub struct AlertFilter {
    pub days: Option<i64>,
}

/// Result of an operator status change
#[derive(Debug, Clone, PartialEq)]
pub enum StatusChange {
    Updated(Alert),
    Rejected { current: AlertStatus },
    NotFound,
}

#[derive(FromRow)]
struct AlertRow {
    id: Uuid,
    assessment_id: Uuid,
    alert_type: String,
    severity: String,
    message: String,
    location: Json<Vec<AffectedZone>>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AlertRow> for Alert {
    type Error = PersistenceError;

    fn try_from(row: AlertRow) -> Result<Self, Self::Error> {
        Ok(Alert {
            id: row.id,
            assessment_id: row.assessment_id,
            alert_type: row.alert_type,
            severity: row.severity.parse().map_err(PersistenceError::Corrupt)?,
            message: row.message,
            location: row.location.0,
            status: row.status.parse().map_err(PersistenceError::Corrupt)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl Alert {
    pub async fn insert<'e, E: PgExecutor<'e>>(
        executor: E,
        assessment_id: Uuid,
        data: &AlertDraft,
    ) -> Result<Self, PersistenceError> {
        let row = sqlx::query_as::<_, AlertRow>(
            r#"
            INSERT INTO alerts (assessment_id, alert_type, severity, message, location, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, 'ACTIVE', $6, $6)
            RETURNING *
            "#
        )
        .bind(assessment_id)
        .bind(&data.alert_type)
        .bind(data.severity.as_str())
        .bind(&data.message)
        .bind(Json(&data.location))
        .bind(data.created_at)
        .fetch_one(executor)
        .await?;

        row.try_into()
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, PersistenceError> {
        let row = sqlx::query_as::<_, AlertRow>("SELECT * FROM alerts WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Alerts created at or after `since`, most recent first
    pub async fn list_since(pool: &PgPool, since: DateTime<Utc>) -> Result<Vec<Self>, PersistenceError> {
        let rows = sqlx::query_as::<_, AlertRow>(
            r#"
            SELECT * FROM alerts
            WHERE created_at >= $1
            ORDER BY created_at DESC, seq DESC
            "#
        )
        .bind(since)
        .fetch_all(pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    pub async fn update_status(
        pool: &PgPool,
        id: Uuid,
        status: AlertStatus,
    ) -> Result<StatusChange, PersistenceError> {
        let allowed: Vec<String> = status
            .allowed_predecessors()
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();

        let row = sqlx::query_as::<_, AlertRow>(
            r#"
            UPDATE alerts
            SET status = $2, updated_at = NOW()
            WHERE id = $1 AND status = ANY($3)
            RETURNING *
            "#
        )
        .bind(id)
        .bind(status.as_str())
        .bind(allowed)
        .fetch_optional(pool)
        .await?;

        match row {
            Some(row) => Ok(StatusChange::Updated(row.try_into()?)),
            None => Ok(match Self::find_by_id(pool, id).await? {
                Some(alert) => StatusChange::Rejected { current: alert.status },
                None => StatusChange::NotFound,
            }),
        }
    }
}
