/// Unified error types for the KlikJasa verification console
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the console service
#[derive(Error, Debug)]
pub enum KlikError {
    /// Record source unreachable or the backend rejected the query
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict errors (e.g., request already reviewed)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// JSON error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Convert KlikError to HTTP response
impl IntoResponse for KlikError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            KlikError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                "InvalidRequest",
                self.to_string(),
            ),
            KlikError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound", self.to_string()),
            KlikError::Conflict(_) => (StatusCode::CONFLICT, "Conflict", self.to_string()),
            KlikError::Fetch(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "FetchFailed",
                self.to_string(),
            ),
            KlikError::Database(_) | KlikError::Internal(_) | KlikError::Io(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "InternalServerError",
                "Internal server error".to_string(), // Don't leak details
            ),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for console operations
pub type KlikResult<T> = Result<T, KlikError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = vec![
            (KlikError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (KlikError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (KlikError::Conflict("x".into()), StatusCode::CONFLICT),
            (KlikError::Fetch("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (KlikError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_fetch_error_message() {
        let err = KlikError::Fetch("backend offline".to_string());
        assert_eq!(err.to_string(), "Fetch failed: backend offline");
    }
}
