use axum::http::StatusCode;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Auth(String),

    #[error("{0}")]
    NotFound(String),

    /// A store call failed. The message is the user-facing one; the
    /// underlying cause is logged where the failure happens.
    #[error("{0}")]
    Gateway(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Shown to clients in place of store and runtime failure details.
pub const MSG_INTERNAL: &str = "Something went wrong. Please try again.";

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl AppError {
    pub fn unauthorized() -> Self {
        AppError::Auth("Unauthorized".to_string())
    }

    pub fn task_not_found() -> Self {
        AppError::NotFound("Task not found".to_string())
    }

    pub fn to_error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Auth(_) => "UNAUTHORIZED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Gateway(_) => "GATEWAY_ERROR",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Config(_) => "CONFIG_ERROR",
            _ => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to send to a client. Database, IO, JSON and config
    /// details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation(_)
            | AppError::Auth(_)
            | AppError::NotFound(_)
            | AppError::Gateway(_) => self.to_string(),
            _ => MSG_INTERNAL.to_string(),
        }
    }

    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.public_message(),
            code: self.to_error_code().to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
