//! Account and session endpoints.

use axum::{extract::State, http::HeaderMap, Extension, Json};
use serde::Serialize;

use super::{success, ApiResult};
use crate::auth::{bearer_token, CurrentUser};
use crate::models::{Credentials, RefreshRequest, Session, SignUpOutcome, User, VerifyRequest};
use crate::AppState;

/// Who is signed in, if anyone.
#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub user: Option<User>,
}

/// POST /api/auth/signup - Register a new account.
pub async fn sign_up(
    State(state): State<AppState>,
    Json(request): Json<Credentials>,
) -> ApiResult<SignUpOutcome> {
    let outcome = state
        .sessions
        .sign_up(&request.email, &request.password)
        .await?;

    if let Some(token) = &outcome.confirmation_token {
        tracing::info!(user_id = %outcome.user.id, "Account awaiting email confirmation");
        tracing::debug!(user_id = %outcome.user.id, "Confirmation token: {}", token);
    }

    success(outcome)
}

/// POST /api/auth/signin - Sign in with email and password.
pub async fn sign_in(
    State(state): State<AppState>,
    Json(request): Json<Credentials>,
) -> ApiResult<Session> {
    let session = state
        .sessions
        .sign_in(&request.email, &request.password)
        .await?;
    success(session)
}

/// POST /api/auth/refresh - Exchange a refresh token for a new session.
pub async fn refresh_session(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> ApiResult<Session> {
    let session = state.sessions.refresh(&request.refresh_token).await?;
    success(session)
}

/// POST /api/auth/verify - Confirm an email address.
pub async fn verify_email(
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> ApiResult<User> {
    let user = state.sessions.confirm_email(&request.token).await?;
    success(user)
}

/// GET /api/auth/session - Resolve the caller's session, if any.
pub async fn get_session(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<SessionInfo> {
    let user = match bearer_token(&headers) {
        Some(token) => state.sessions.check_session(&token).await?,
        None => None,
    };
    success(SessionInfo { user })
}

/// POST /api/auth/signout - End the caller's session.
pub async fn sign_out(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<()> {
    state.sessions.sign_out(&current.access_token).await?;
    success(())
}
