//! Error Handling Utilities
//!
//! Application-wide error type and its mapping onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Main application error type that can represent errors from any component
#[derive(Error, Debug)]
pub enum AppError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Malformed or missing input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Bad credentials or bad token
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Resource not found errors
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Uniqueness violations
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Rate limiting errors
    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    /// Remote image host failures
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Generic internal server errors
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Password hashing errors
    #[error("Password hashing error: {0}")]
    HashingError(#[from] bcrypt::BcryptError),
}

/// Standard error response structure for API endpoints
#[derive(Serialize, Debug, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
        }
    }
}

impl AppError {
    /// HTTP status this error is reported with
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::RateLimit(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::ExternalService(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_)
            | AppError::Internal(_)
            | AppError::Configuration(_)
            | AppError::HashingError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Server-side failures are logged in full and reported generically
        match &self {
            AppError::Database(_)
            | AppError::Internal(_)
            | AppError::Configuration(_)
            | AppError::HashingError(_) => log::error!("{}", self),
            AppError::ExternalService(_) => log::warn!("{}", self),
            _ => {}
        }

        let (error_code, message) = match self {
            AppError::Database(_) => ("DATABASE_ERROR", "A database error occurred".to_string()),
            AppError::Validation(msg) => ("VALIDATION_ERROR", msg),
            AppError::Authentication(msg) => ("AUTHENTICATION_ERROR", msg),
            AppError::NotFound(msg) => ("NOT_FOUND", msg),
            AppError::Conflict(msg) => ("CONFLICT", msg),
            AppError::RateLimit(msg) => ("RATE_LIMIT_EXCEEDED", msg),
            AppError::ExternalService(msg) => ("EXTERNAL_SERVICE_ERROR", msg),
            AppError::Internal(_) => (
                "INTERNAL_ERROR",
                "An internal server error occurred".to_string(),
            ),
            AppError::Configuration(_) => (
                "CONFIGURATION_ERROR",
                "Server configuration error".to_string(),
            ),
            AppError::HashingError(_) => ("HASHING_ERROR", "Password hashing error".to_string()),
        };

        let error_response = ErrorResponse::new(error_code, &message);
        (status, Json(error_response)).into_response()
    }
}

/// Result type alias for operations that can return AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_creation() {
        let error = ErrorResponse::new("TEST_ERROR", "Test message");
        assert_eq!(error.error, "TEST_ERROR");
        assert_eq!(error.message, "Test message");
    }

    #[test]
    fn test_app_error_display() {
        let error = AppError::Validation("Poster image is required".to_string());
        assert_eq!(
            error.to_string(),
            "Validation error: Poster image is required"
        );
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::Validation(String::new()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Authentication(String::new()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::NotFound(String::new()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Conflict(String::new()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::RateLimit(String::new()).status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::ExternalService(String::new()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::Internal(String::new()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_error_hides_details() {
        let response = AppError::Internal("connection reset by peer".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
