pub mod agents;
pub mod config;
pub mod dashboard;
pub mod health;
pub mod holidays;
pub mod import_export;
pub mod index;
pub mod metrics;
pub mod planning;

// Common response types
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::errors::{ApiError, DatabaseError, RotationError, ValidationError};
use common::import_export::ImportExportError;
use common::planning::PlanningError;
use serde::Serialize;

/// Standard API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    pub trace_id: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
            trace_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn status(&self) -> StatusCode {
        match self.error.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(
                error = %self.error,
                message = %self.message,
                trace_id = %self.trace_id,
                "Request failed"
            );
        }

        (status, Json(self)).into_response()
    }
}

impl From<ApiError> for ErrorResponse {
    fn from(err: ApiError) -> Self {
        let response = ErrorResponse::new(err.code.to_lowercase(), err.message);
        match err.details {
            Some(details) => response.with_details(details),
            None => response,
        }
    }
}

impl From<RotationError> for ErrorResponse {
    fn from(err: RotationError) -> Self {
        ApiError::from(err).into()
    }
}

impl From<ValidationError> for ErrorResponse {
    fn from(err: ValidationError) -> Self {
        ApiError::from(err).into()
    }
}

impl From<DatabaseError> for ErrorResponse {
    fn from(err: DatabaseError) -> Self {
        ApiError::from(err).into()
    }
}

impl From<PlanningError> for ErrorResponse {
    fn from(err: PlanningError) -> Self {
        match err {
            PlanningError::Rotation(e) => e.into(),
            PlanningError::Database(e) => e.into(),
            PlanningError::AgentNotFound(_) => ErrorResponse::new("not_found", err.to_string()),
            PlanningError::InvalidRange(_) => {
                ErrorResponse::new("validation_error", err.to_string())
            }
        }
    }
}

impl From<ImportExportError> for ErrorResponse {
    fn from(err: ImportExportError) -> Self {
        match err {
            ImportExportError::Database(e) => e.into(),
            ImportExportError::Validation(e) => e.into(),
            ImportExportError::Csv(_) => ErrorResponse::new("validation_error", err.to_string()),
            ImportExportError::Output(_) => ErrorResponse::new("export_failed", err.to_string()),
        }
    }
}

/// Standard API success response
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

impl<T: Serialize> IntoResponse for SuccessResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_map_to_status() {
        assert_eq!(
            ErrorResponse::from(DatabaseError::NotFound("x".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ErrorResponse::from(DatabaseError::DuplicateKey("x".into())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ErrorResponse::from(RotationError::InvalidMonth(13)).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorResponse::from(RotationError::InvalidConfiguration("x".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ErrorResponse::from(PlanningError::AgentNotFound("AG404".into())).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_trace_id_is_set() {
        let err = ErrorResponse::new("validation_error", "bad");
        assert!(uuid::Uuid::parse_str(&err.trace_id).is_ok());
    }
}
