// Error handling framework

use thiserror::Error;

/// Shift rotation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RotationError {
    #[error("Invalid month {0}: expected a value between 1 and 12")]
    InvalidMonth(u32),

    #[error("Invalid year {0}: expected a 4-digit year")]
    InvalidYear(i32),

    #[error("Unknown rotation group: {0}")]
    InvalidGroup(String),

    #[error("Duplicate agent code in roster: {0}")]
    DuplicateAgentCode(String),

    #[error("Invalid rotation configuration: {0}")]
    InvalidConfiguration(String),
}

/// Validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid field value for {field}: {reason}")]
    InvalidFieldValue { field: String, reason: String },

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Database-specific errors
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Database health check failed: {0}")]
    HealthCheckFailed(String),

    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Duplicate key violation: {0}")]
    DuplicateKey(String),

    #[error("Schema bootstrap failed: {0}")]
    MigrationFailed(String),
}

/// API response error type for HTTP responses
#[derive(Debug, serde::Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl From<RotationError> for ApiError {
    fn from(err: RotationError) -> Self {
        let code = match err {
            RotationError::InvalidConfiguration(_) => "CONFIGURATION_ERROR",
            _ => "VALIDATION_ERROR",
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::new("VALIDATION_ERROR", err.to_string())
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        let code = match err {
            DatabaseError::NotFound(_) => "NOT_FOUND",
            DatabaseError::DuplicateKey(_) => "CONFLICT",
            _ => "DATABASE_ERROR",
        };
        ApiError::new(code, err.to_string())
    }
}

// SQLite extended result codes for constraint violations
const SQLITE_CONSTRAINT_PRIMARYKEY: &str = "1555";
const SQLITE_CONSTRAINT_UNIQUE: &str = "2067";

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Record not found".to_string()),
            sqlx::Error::Database(db_err) => match db_err.code() {
                Some(code)
                    if code == SQLITE_CONSTRAINT_PRIMARYKEY || code == SQLITE_CONSTRAINT_UNIQUE =>
                {
                    DatabaseError::DuplicateKey(db_err.message().to_string())
                }
                _ => DatabaseError::QueryFailed(db_err.message().to_string()),
            },
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                DatabaseError::ConnectionFailed(err.to_string())
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_error_display() {
        let err = RotationError::InvalidMonth(13);
        assert!(err.to_string().contains("13"));

        let err = RotationError::InvalidGroup("Z".to_string());
        assert_eq!(err.to_string(), "Unknown rotation group: Z");
    }

    #[test]
    fn test_rotation_error_to_api_error() {
        let api_err: ApiError = RotationError::DuplicateAgentCode("AG001".to_string()).into();
        assert_eq!(api_err.code, "VALIDATION_ERROR");

        let api_err: ApiError =
            RotationError::InvalidConfiguration("empty cycle".to_string()).into();
        assert_eq!(api_err.code, "CONFIGURATION_ERROR");
    }

    #[test]
    fn test_database_error_to_api_error() {
        let api_err: ApiError = DatabaseError::DuplicateKey("agents.code".to_string()).into();
        assert_eq!(api_err.code, "CONFLICT");

        let api_err: ApiError = DatabaseError::NotFound("AG404".to_string()).into();
        assert_eq!(api_err.code, "NOT_FOUND");
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: DatabaseError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DatabaseError::NotFound(_)));
    }

    #[test]
    fn test_api_error_with_details() {
        let err = ApiError::new("TEST_ERROR", "Test message")
            .with_details(serde_json::json!({"field": "value"}));
        assert!(err.details.is_some());
    }
}
