//! API error handling
//!
//! Every failure renders as `{"success": false, "message": "..."}`. Server
//! faults are logged in full and answered with a generic message.
//!
//! Author: hephaex@gmail.com

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::credentials::CredentialError;

/// Message returned for every 500
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";
pub const INVALID_BODY_MESSAGE: &str = "Invalid request body";

/// API error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Always `false`
    pub success: bool,
    /// Human-readable message
    pub message: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Malformed or invalid input (400)
    Validation(String),
    /// Email already registered (409)
    DuplicateEmail,
    /// Login failed; the cause is never disclosed (401)
    InvalidCredentials,
    /// Missing or rejected credentials (401)
    Unauthorized(String),
    /// Credentials present but not acceptable (403)
    Forbidden(String),
    NotFound(String),
    Internal(String),
    Database(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateEmail => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::Validation(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg) => msg,
            AppError::DuplicateEmail => "Email already in use".to_string(),
            AppError::InvalidCredentials => "Invalid credentials".to_string(),
            AppError::Internal(detail) => {
                tracing::error!(error = %detail, "Internal error");
                INTERNAL_ERROR_MESSAGE.to_string()
            }
            AppError::Database(detail) => {
                tracing::error!(error = %detail, "Database error");
                INTERNAL_ERROR_MESSAGE.to_string()
            }
        };

        (status, Json(ApiError::new(message))).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<acct_core::AcctError> for AppError {
    fn from(err: acct_core::AcctError) -> Self {
        use acct_core::AcctError;

        match err {
            AcctError::NotFound(msg) => AppError::NotFound(msg),
            AcctError::DuplicateEmail(_) => AppError::DuplicateEmail,
            AcctError::ValidationError(msg) => AppError::Validation(msg),
            AcctError::DatabaseError(msg) => AppError::Database(msg),
            AcctError::ConfigError(msg) => AppError::Internal(format!("Configuration error: {msg}")),
            AcctError::Other(err) => AppError::Internal(err.to_string()),
        }
    }
}

impl From<CredentialError> for AppError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::Store(err) => err.into(),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Rejected request body");
        AppError::Validation(INVALID_BODY_MESSAGE.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(validation_message(&errors))
    }
}

/// Flatten field errors into one stable, human-readable message
pub fn validation_message(errors: &validator::ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => message.to_string(),
                None => format!("Invalid value for {field}"),
            })
        })
        .collect();

    messages.sort();
    messages.dedup();
    messages.join("; ")
}
