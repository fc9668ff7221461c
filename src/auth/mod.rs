//! Authentication: accounts, sessions and route gating.
//!
//! Protected routes need `Authorization: Bearer <access token>`. The gate
//! resolves the token through the [`SessionStore`] and hands the handler a
//! [`CurrentUser`].

mod password;
mod provider;
mod session;

pub use provider::{ProviderSettings, SqliteAuthProvider};
pub use session::{SessionEvent, SessionStore};

use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::errors::AppError;
use crate::models::User;

/// The signed-in user for the current request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub access_token: String,
}

/// Extract a bearer token from the `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Session gate layer function that takes the shared store as a parameter.
pub async fn session_gate_layer(
    store: Arc<SessionStore>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(access_token) = bearer_token(request.headers()) else {
        return unauthorized_response("Missing access token");
    };

    let resolved = match store.current(&access_token).await {
        Some(user) => Ok(Some(user)),
        None => store.check_session(&access_token).await,
    };

    match resolved {
        Ok(Some(user)) => {
            request
                .extensions_mut()
                .insert(CurrentUser { user, access_token });
            next.run(request).await
        }
        Ok(None) => unauthorized_response("Your session has expired. Please sign in again."),
        Err(e) => e.into_response(),
    }
}

/// Create an unauthorized response.
fn unauthorized_response(message: &str) -> Response {
    AppError::Unauthorized(message.to_string()).into_response()
}
