//! Error handling module for the Content AI backend.
//!
//! Provides centralized error types with mapping to HTTP status codes and response envelopes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const INVALID_KIND: &str = "INVALID_KIND";
    pub const EMPTY_PROMPT: &str = "EMPTY_PROMPT";
    pub const MISSING_CREDENTIAL: &str = "MISSING_CREDENTIAL";
    pub const INVALID_CREDENTIAL: &str = "INVALID_CREDENTIAL";
    pub const EMPTY_RESPONSE: &str = "EMPTY_RESPONSE";
    pub const REMOTE_ERROR: &str = "REMOTE_ERROR";
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const INVALID_LOGIN: &str = "INVALID_LOGIN";
    pub const AUTH_DISABLED: &str = "AUTH_DISABLED";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
    pub const SEARCH_ERROR: &str = "SEARCH_ERROR";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
}

/// User-facing text for a missing generation credential.
pub const MISSING_CREDENTIAL_MESSAGE: &str =
    "Please check your Gemini API key in the server configuration";
/// User-facing text for a rejected generation credential.
pub const INVALID_CREDENTIAL_MESSAGE: &str =
    "Invalid Gemini API key. Please check the server configuration.";
/// User-facing text for a generation call that produced nothing.
pub const EMPTY_RESPONSE_MESSAGE: &str = "No content generated. Please try again.";
/// User-facing text for a rejected email/password pair.
pub const INVALID_LOGIN_MESSAGE: &str = "Invalid email or password.";

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    /// Content kind is not one of the recognized kinds
    InvalidKind(String),
    /// Prompt is empty for a kind that requires one
    EmptyPrompt,
    /// No generation API key configured
    MissingCredential,
    /// Generation API rejected the configured key
    InvalidCredential,
    /// Generation API returned no usable text
    EmptyResponse,
    /// Any other generation API failure, carrying the upstream message
    Remote(String),
    /// Authentication required
    Unauthorized(String),
    /// Email/password pair rejected
    InvalidLogin,
    /// Sign-in or sign-up switched off
    AuthDisabled(String),
    /// Resource not found
    NotFound(String),
    /// Validation error
    Validation(String),
    /// Database error
    Database(String),
    /// Search index error
    Search(String),
    /// Internal server error
    Internal(String),
    /// Bad request
    BadRequest(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidKind(_) => StatusCode::BAD_REQUEST,
            AppError::EmptyPrompt => StatusCode::BAD_REQUEST,
            AppError::MissingCredential => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InvalidCredential => StatusCode::BAD_GATEWAY,
            AppError::EmptyResponse => StatusCode::BAD_GATEWAY,
            AppError::Remote(_) => StatusCode::BAD_GATEWAY,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::InvalidLogin => StatusCode::UNAUTHORIZED,
            AppError::AuthDisabled(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Search(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidKind(_) => codes::INVALID_KIND,
            AppError::EmptyPrompt => codes::EMPTY_PROMPT,
            AppError::MissingCredential => codes::MISSING_CREDENTIAL,
            AppError::InvalidCredential => codes::INVALID_CREDENTIAL,
            AppError::EmptyResponse => codes::EMPTY_RESPONSE,
            AppError::Remote(_) => codes::REMOTE_ERROR,
            AppError::Unauthorized(_) => codes::UNAUTHORIZED,
            AppError::InvalidLogin => codes::INVALID_LOGIN,
            AppError::AuthDisabled(_) => codes::AUTH_DISABLED,
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::Validation(_) => codes::VALIDATION_ERROR,
            AppError::Database(_) => codes::DATABASE_ERROR,
            AppError::Search(_) => codes::SEARCH_ERROR,
            AppError::Internal(_) => codes::INTERNAL_ERROR,
            AppError::BadRequest(_) => codes::BAD_REQUEST,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            AppError::InvalidKind(kind) => format!("Invalid content type: {}", kind),
            AppError::EmptyPrompt => "Please provide a prompt".to_string(),
            AppError::MissingCredential => MISSING_CREDENTIAL_MESSAGE.to_string(),
            AppError::InvalidCredential => INVALID_CREDENTIAL_MESSAGE.to_string(),
            AppError::EmptyResponse => EMPTY_RESPONSE_MESSAGE.to_string(),
            AppError::Remote(msg) => msg.clone(),
            AppError::Unauthorized(msg) => msg.clone(),
            AppError::InvalidLogin => INVALID_LOGIN_MESSAGE.to_string(),
            AppError::AuthDisabled(msg) => msg.clone(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::Validation(msg) => msg.clone(),
            AppError::Database(msg) => msg.clone(),
            AppError::Search(msg) => msg.clone(),
            AppError::Internal(msg) => msg.clone(),
            AppError::BadRequest(msg) => msg.clone(),
        }
    }

    /// Whether this error came out of the generation pipeline.
    pub fn is_generation_failure(&self) -> bool {
        matches!(
            self,
            AppError::MissingCredential
                | AppError::InvalidCredential
                | AppError::EmptyResponse
                | AppError::Remote(_)
        )
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        AppError::Database(format!("Database error: {}", err))
    }
}

impl From<tantivy::TantivyError> for AppError {
    fn from(err: tantivy::TantivyError) -> Self {
        tracing::error!("Search error: {:?}", err);
        AppError::Search(format!("Search error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        AppError::BadRequest(format!("JSON error: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        tracing::error!("Generation request error: {:?}", err);
        AppError::Remote(format!("Failed to reach the generation API: {}", err))
    }
}

/// Error details in the response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetails,
}

impl ErrorResponse {
    pub fn new(error: &AppError) -> Self {
        let details = match error {
            AppError::InvalidKind(kind) => Some(serde_json::json!({ "kind": kind })),
            _ if error.is_generation_failure() => Some(serde_json::json!({ "retryable": true })),
            _ => None,
        };

        Self {
            success: false,
            error: ErrorDetails {
                code: error.error_code().to_string(),
                message: error.message(),
                details,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse::new(&self);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_failures_are_gateway_errors() {
        assert_eq!(
            AppError::Remote("boom".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::MissingCredential.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert!(AppError::EmptyResponse.is_generation_failure());
        assert!(!AppError::EmptyPrompt.is_generation_failure());
    }

    #[test]
    fn test_invalid_login_message_is_mapped() {
        let err = AppError::InvalidLogin;
        assert_eq!(err.message(), "Invalid email or password.");
        assert_eq!(err.to_string(), "INVALID_LOGIN: Invalid email or password.");
    }

    #[test]
    fn test_error_envelope_details() {
        let body = ErrorResponse::new(&AppError::InvalidKind("poem".into()));
        assert!(!body.success);
        assert_eq!(body.error.code, codes::INVALID_KIND);
        assert_eq!(body.error.details, Some(serde_json::json!({ "kind": "poem" })));

        let body = ErrorResponse::new(&AppError::NotFound("gone".into()));
        assert!(body.error.details.is_none());
    }
}
