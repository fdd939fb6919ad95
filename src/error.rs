//! Error handling

use axum::{
    extract::rejection::JsonRejection,
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;
use std::time::Duration;

pub type AppResult<T> = Result<T, AppError>;

/// Malformed or missing reading fields. Rejected before anything is stored.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("invalid field {field}: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("unparsable timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("malformed request body: {0}")]
    MalformedBody(String),
}

impl From<validator::ValidationErrors> for ValidationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by_key(|(name, _)| name.to_string());

        let Some((name, errs)) = fields.into_iter().next() else {
            return ValidationError::MalformedBody("validation failed".to_string());
        };
        let code = errs.first().map(|e| e.code.to_string()).unwrap_or_default();

        if code == "required" {
            ValidationError::MissingField(name.to_string())
        } else {
            ValidationError::InvalidField {
                field: name.to_string(),
                reason: format!("failed {} check", code),
            }
        }
    }
}

/// Risk model failure or unusable model output.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ModelError {
    #[error("risk model failed: {0}")]
    Failed(String),

    #[error("risk model returned probability {0} outside [0, 1]")]
    InvalidProbability(f64),
}

/// Store unavailable, write conflict or unreadable row.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Delivery failure of the notification hook. Always swallowed after logging.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}

/// Failure of a single assessment run. Writes of the run are rolled back.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("assessment abandoned after {0:?}")]
    TimedOut(Duration),
}

#[derive(Debug)]
pub enum AppError {
    // Resource errors
    NotFound(String),
    InvalidTransition(String),

    // Validation errors
    ValidationError(String),

    // Database errors
    DatabaseError(String),

    // Risk model errors
    ModelError(String),

    // Assessment timed out
    Timeout(String),

    // Generic errors
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.as_str()),
            AppError::InvalidTransition(msg) => (StatusCode::CONFLICT, msg.as_str()),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            AppError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error occurred")
            }
            AppError::ModelError(msg) => {
                tracing::error!("Risk model error: {}", msg);
                (StatusCode::BAD_GATEWAY, "Risk model error")
            }
            AppError::Timeout(msg) => {
                tracing::error!("Timeout: {}", msg);
                (StatusCode::GATEWAY_TIMEOUT, "Risk assessment timed out")
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(err: JsonRejection) -> Self {
        ValidationError::MalformedBody(err.body_text()).into()
    }
}

impl From<PersistenceError> for AppError {
    fn from(err: PersistenceError) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<ModelError> for AppError {
    fn from(err: ModelError) -> Self {
        AppError::ModelError(err.to_string())
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Model(e) => e.into(),
            PipelineError::Persistence(e) => e.into(),
            PipelineError::TimedOut(after) => AppError::Timeout(format!("abandoned after {:?}", after)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_error_maps_to_status() {
        let model: AppError = PipelineError::Model(ModelError::Failed("boom".into())).into();
        assert_eq!(model.into_response().status(), StatusCode::BAD_GATEWAY);

        let timeout: AppError = PipelineError::TimedOut(Duration::from_millis(10)).into();
        assert_eq!(timeout.into_response().status(), StatusCode::GATEWAY_TIMEOUT);

        let store: AppError = PipelineError::Persistence(PersistenceError::Unavailable("down".into())).into();
        assert_eq!(store.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_validation_error_is_bad_request() {
        let err: AppError = ValidationError::MissingField("unit".to_string()).into();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
