//! REST API module.
//!
//! Contains all API routes and handlers following the browser client's contract.

mod auth;
mod contents;
mod generate;
mod search;

pub use auth::*;
pub use contents::*;
pub use generate::*;
pub use search::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;

/// Success response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(ApiResponse::new(data))
}

/// Replace store failures with a generic retry message; keep the rest.
///
/// The original error is logged, the client only learns that `action` failed.
pub fn store_failure(action: &'static str) -> impl FnOnce(AppError) -> AppError {
    move |err| match err {
        AppError::Database(_) | AppError::Internal(_) | AppError::Search(_) => {
            tracing::error!("Failed to {}: {}", action, err);
            AppError::Internal(format!("Failed to {}. Please try again.", action))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_failure_hides_database_details() {
        let err = store_failure("save content")(AppError::Database("disk I/O error".into()));
        assert_eq!(err.message(), "Failed to save content. Please try again.");

        let err = store_failure("save content")(AppError::NotFound("Content x not found".into()));
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_store_failure_hides_search_details() {
        let err = store_failure("search saved content")(AppError::Search(
            "Search error: An IO error occurred: 'No space left on device'".into(),
        ));
        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(err.message(), "Failed to search saved content. Please try again.");
        assert_eq!(err.error_code(), crate::errors::codes::INTERNAL_ERROR);

        // Bad queries are the caller's problem and keep their wording.
        let err = store_failure("search saved content")(AppError::Validation(
            "Invalid search query".into(),
        ));
        assert_eq!(err.message(), "Invalid search query");
    }
}
