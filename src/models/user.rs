//! User and session models.

use serde::{Deserialize, Serialize};

/// A registered account. The password hash never leaves the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub email_confirmed: bool,
    pub created_at: String,
}

/// An authenticated session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: String,
    pub user: User,
}

/// Result of a sign-up.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpOutcome {
    pub user: User,
    /// The account must be confirmed before it can sign in.
    pub confirmation_required: bool,
    /// Confirmation token to deliver to the user out of band.
    #[serde(skip_serializing)]
    pub confirmation_token: Option<String>,
}

/// Email/password pair for sign-up and sign-in.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Request body for refreshing a session.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Request body for confirming an email address.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyRequest {
    pub token: String,
}
