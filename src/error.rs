//! Domain error types for the Vista server.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.

use actix_web::{HttpResponse, ResponseError};
use std::fmt;

/// Application-level errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// A stored JSON column could not be decoded
    #[error("Storage corruption: {0}")]
    Corruption(String),

    /// Schema migration failed
    #[error("Migration error: {0}")]
    Migration(String),

    /// Resource not found
    #[error("{0} not found")]
    NotFound(String),

    /// Invalid client input; the message is returned verbatim
    #[error("{0}")]
    InvalidInput(String),

    /// Request body exceeds the configured limit
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Local filesystem operation failed
    #[error("File system error: {0}")]
    FileSystem(String),
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let (status, error_code, response_message) = match self {
            AppError::Database(err_str) => {
                tracing::error!("Database error: {}", err_str);
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "An internal database error occurred".to_string(),
                )
            }
            AppError::Corruption(err_str) => {
                tracing::error!("Storage corruption: {}", err_str);
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_CORRUPTION",
                    "Stored project data could not be read".to_string(),
                )
            }
            AppError::Migration(err_str) => {
                tracing::error!("Migration error: {}", err_str);
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "MIGRATION_ERROR",
                    "Database schema is not available".to_string(),
                )
            }
            AppError::NotFound(_) => (
                actix_web::http::StatusCode::NOT_FOUND,
                "NOT_FOUND",
                self.to_string(),
            ),
            AppError::InvalidInput(_) => (
                actix_web::http::StatusCode::BAD_REQUEST,
                "INVALID_INPUT",
                self.to_string(),
            ),
            AppError::PayloadTooLarge(_) => (
                actix_web::http::StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                self.to_string(),
            ),
            AppError::FileSystem(err_str) => {
                tracing::error!("File system error: {}", err_str);
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "FILESYSTEM_ERROR",
                    "An internal storage error occurred".to_string(),
                )
            }
        };

        HttpResponse::build(status).json(ErrorResponse {
            error: error_code.to_string(),
            message: response_message,
        })
    }
}

/// Error response body matching OpenAPI schema.
#[derive(Debug, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

// Conversion implementations for common error types

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::FileSystem(err.to_string())
    }
}
