//! Account and session provider.
//!
//! [`AuthProvider`] is the boundary to whatever owns accounts. Its errors
//! carry the provider's own wording; [`super::SessionStore`] decides which of
//! those messages the user gets to see.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use super::password::{hash_password, new_token, verify_password};
use crate::config::Config;
use crate::db::{timestamp, Repository, StoredSession};
use crate::models::{Session, SignUpOutcome, User};

pub const SIGNUPS_DISABLED: &str = "Email signups are disabled";
pub const LOGINS_DISABLED: &str = "Email logins are disabled";
pub const INVALID_LOGIN_CREDENTIALS: &str = "Invalid login credentials";
pub const EMAIL_NOT_CONFIRMED: &str = "Email not confirmed";
pub const USER_ALREADY_REGISTERED: &str = "User already registered";
pub const REFRESH_TOKEN_NOT_FOUND: &str = "refresh_token_not_found";
pub const INVALID_CONFIRMATION_TOKEN: &str = "Token has expired or is invalid";

const MIN_PASSWORD_LEN: usize = 6;

/// A failure reported by the provider, in its own words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub message: String,
    /// The provider itself broke, as opposed to rejecting the request.
    pub internal: bool,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            internal: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            internal: true,
        }
    }

    pub fn is(&self, message: &str) -> bool {
        self.message == message
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ProviderError {}

impl From<crate::errors::AppError> for ProviderError {
    fn from(err: crate::errors::AppError) -> Self {
        ProviderError::internal(err.message())
    }
}

/// Account and session operations offered by an identity provider.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, ProviderError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ProviderError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), ProviderError>;

    /// Resolve an access token. Unknown tokens are `Ok(None)`.
    async fn get_session(&self, access_token: &str) -> Result<Option<Session>, ProviderError>;

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, ProviderError>;

    async fn confirm_email(&self, token: &str) -> Result<User, ProviderError>;
}

/// Provider policy switches.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub signups_enabled: bool,
    pub logins_enabled: bool,
    pub require_email_confirmation: bool,
    pub session_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl From<&Config> for ProviderSettings {
    fn from(config: &Config) -> Self {
        Self {
            signups_enabled: config.signups_enabled,
            logins_enabled: config.logins_enabled,
            require_email_confirmation: config.require_email_confirmation,
            session_ttl: config.session_ttl,
            refresh_ttl: config.refresh_ttl,
        }
    }
}

/// Provider backed by the application database.
pub struct SqliteAuthProvider {
    repo: Arc<Repository>,
    settings: ProviderSettings,
}

impl SqliteAuthProvider {
    pub fn new(repo: Arc<Repository>, settings: ProviderSettings) -> Self {
        Self { repo, settings }
    }

    fn issue(&self, user_id: &str) -> StoredSession {
        let now = Utc::now();
        let ttl = chrono::Duration::from_std(self.settings.session_ttl)
            .unwrap_or_else(|_| chrono::Duration::hours(1));
        let refresh_ttl = chrono::Duration::from_std(self.settings.refresh_ttl)
            .unwrap_or_else(|_| chrono::Duration::days(30));

        StoredSession {
            access_token: new_token(),
            refresh_token: new_token(),
            user_id: user_id.to_string(),
            expires_at: now + ttl,
            refresh_expires_at: now + refresh_ttl,
        }
    }

    async fn to_session(&self, stored: StoredSession) -> Result<Option<Session>, ProviderError> {
        let Some(user) = self.repo.get_user(&stored.user_id).await? else {
            return Ok(None);
        };
        Ok(Some(Session {
            access_token: stored.access_token,
            refresh_token: stored.refresh_token,
            expires_at: timestamp(stored.expires_at),
            user,
        }))
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_email(email: &str) -> Result<(), ProviderError> {
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if valid {
        Ok(())
    } else {
        Err(ProviderError::new("Unable to validate email address: invalid format"))
    }
}

#[async_trait]
impl AuthProvider for SqliteAuthProvider {
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, ProviderError> {
        if !self.settings.signups_enabled {
            return Err(ProviderError::new(SIGNUPS_DISABLED));
        }

        let email = normalize_email(email);
        validate_email(&email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ProviderError::new(format!(
                "Password should be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let confirmation_token = self
            .settings
            .require_email_confirmation
            .then(new_token);
        let hash = hash_password(password);

        let user = self
            .repo
            .create_user(&email, &hash, confirmation_token.as_deref())
            .await?
            .ok_or_else(|| ProviderError::new(USER_ALREADY_REGISTERED))?;

        tracing::info!(user_id = %user.id, "Registered new account");

        Ok(SignUpOutcome {
            user,
            confirmation_required: confirmation_token.is_some(),
            confirmation_token,
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ProviderError> {
        if !self.settings.logins_enabled {
            return Err(ProviderError::new(LOGINS_DISABLED));
        }

        let email = normalize_email(email);
        let Some(credentials) = self.repo.find_credentials(&email).await? else {
            return Err(ProviderError::new(INVALID_LOGIN_CREDENTIALS));
        };
        if !verify_password(password, &credentials.password_hash) {
            return Err(ProviderError::new(INVALID_LOGIN_CREDENTIALS));
        }
        if !credentials.user.email_confirmed {
            return Err(ProviderError::new(EMAIL_NOT_CONFIRMED));
        }

        match self.repo.prune_expired_sessions(Utc::now()).await {
            Ok(0) => {}
            Ok(pruned) => tracing::debug!("Pruned {} lapsed sessions", pruned),
            Err(e) => tracing::warn!("Failed to prune lapsed sessions: {}", e),
        }

        let stored = self.issue(&credentials.user.id);
        self.repo.insert_session(&stored).await?;

        Ok(Session {
            access_token: stored.access_token,
            refresh_token: stored.refresh_token,
            expires_at: timestamp(stored.expires_at),
            user: credentials.user,
        })
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), ProviderError> {
        self.repo.delete_session(access_token).await?;
        Ok(())
    }

    async fn get_session(&self, access_token: &str) -> Result<Option<Session>, ProviderError> {
        let Some(stored) = self.repo.find_session(access_token).await? else {
            return Ok(None);
        };

        let now = Utc::now();
        if stored.expires_at <= now {
            if stored.refresh_expires_at <= now {
                self.repo.delete_session(access_token).await?;
                return Err(ProviderError::new(REFRESH_TOKEN_NOT_FOUND));
            }
            // Still refreshable, but this access token is done.
            return Ok(None);
        }

        self.to_session(stored).await
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, ProviderError> {
        let stored = self
            .repo
            .find_session_by_refresh(refresh_token)
            .await?
            .ok_or_else(|| ProviderError::new(REFRESH_TOKEN_NOT_FOUND))?;

        if stored.refresh_expires_at <= Utc::now() {
            self.repo.delete_session(&stored.access_token).await?;
            return Err(ProviderError::new(REFRESH_TOKEN_NOT_FOUND));
        }

        let fresh = self.issue(&stored.user_id);
        self.repo.rotate_session(&stored.access_token, &fresh).await?;

        self.to_session(fresh)
            .await?
            .ok_or_else(|| ProviderError::new(REFRESH_TOKEN_NOT_FOUND))
    }

    async fn confirm_email(&self, token: &str) -> Result<User, ProviderError> {
        self.repo
            .confirm_user(token.trim())
            .await?
            .ok_or_else(|| ProviderError::new(INVALID_CONFIRMATION_TOKEN))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_database;
    use tempfile::TempDir;

    fn settings() -> ProviderSettings {
        ProviderSettings {
            signups_enabled: true,
            logins_enabled: true,
            require_email_confirmation: false,
            session_ttl: Duration::from_secs(3600),
            refresh_ttl: Duration::from_secs(7200),
        }
    }

    async fn provider(settings: ProviderSettings) -> (SqliteAuthProvider, TempDir) {
        let dir = TempDir::new().unwrap();
        let pool = init_database(&dir.path().join("auth.sqlite")).await.unwrap();
        let repo = Arc::new(Repository::new(pool));
        (SqliteAuthProvider::new(repo, settings), dir)
    }

    #[tokio::test]
    async fn test_sign_up_then_sign_in() {
        let (auth, _dir) = provider(settings()).await;
        let outcome = auth.sign_up(" Jo@Example.com ", "secret1").await.unwrap();
        assert!(!outcome.confirmation_required);
        assert_eq!(outcome.user.email, "jo@example.com");

        let session = auth.sign_in("jo@example.com", "secret1").await.unwrap();
        assert_eq!(session.user.id, outcome.user.id);

        let resolved = auth.get_session(&session.access_token).await.unwrap().unwrap();
        assert_eq!(resolved.user.email, "jo@example.com");

        auth.sign_out(&session.access_token).await.unwrap();
        assert!(auth.get_session(&session.access_token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_wrong_password_uses_provider_wording() {
        let (auth, _dir) = provider(settings()).await;
        auth.sign_up("jo@example.com", "secret1").await.unwrap();

        let err = auth.sign_in("jo@example.com", "nope").await.unwrap_err();
        assert!(err.is(INVALID_LOGIN_CREDENTIALS));
        let err = auth.sign_in("nobody@example.com", "secret1").await.unwrap_err();
        assert!(err.is(INVALID_LOGIN_CREDENTIALS));
    }

    #[tokio::test]
    async fn test_sign_up_rejections() {
        let (auth, _dir) = provider(settings()).await;
        auth.sign_up("jo@example.com", "secret1").await.unwrap();

        let dup = auth.sign_up("JO@example.com", "secret1").await.unwrap_err();
        assert!(dup.is(USER_ALREADY_REGISTERED));
        assert!(auth.sign_up("not-an-email", "secret1").await.is_err());
        assert!(auth.sign_up("short@example.com", "123").await.is_err());

        let (closed, _dir) = provider(ProviderSettings {
            signups_enabled: false,
            ..settings()
        })
        .await;
        let err = closed.sign_up("jo@example.com", "secret1").await.unwrap_err();
        assert!(err.is(SIGNUPS_DISABLED));
    }

    #[tokio::test]
    async fn test_confirmation_required() {
        let (auth, _dir) = provider(ProviderSettings {
            require_email_confirmation: true,
            ..settings()
        })
        .await;

        let outcome = auth.sign_up("jo@example.com", "secret1").await.unwrap();
        assert!(outcome.confirmation_required);
        let err = auth.sign_in("jo@example.com", "secret1").await.unwrap_err();
        assert!(err.is(EMAIL_NOT_CONFIRMED));

        let token = outcome.confirmation_token.unwrap();
        let user = auth.confirm_email(&token).await.unwrap();
        assert!(user.email_confirmed);
        auth.sign_in("jo@example.com", "secret1").await.unwrap();
    }

    #[tokio::test]
    async fn test_lapsed_session_reports_missing_refresh_token() {
        let (auth, _dir) = provider(ProviderSettings {
            session_ttl: Duration::ZERO,
            refresh_ttl: Duration::ZERO,
            ..settings()
        })
        .await;
        auth.sign_up("jo@example.com", "secret1").await.unwrap();
        let session = auth.sign_in("jo@example.com", "secret1").await.unwrap();

        let err = auth.get_session(&session.access_token).await.unwrap_err();
        assert!(err.is(REFRESH_TOKEN_NOT_FOUND));
        // The lapsed session is gone afterwards.
        assert!(auth.get_session(&session.access_token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sign_in_prunes_lapsed_sessions() {
        let (auth, _dir) = provider(ProviderSettings {
            session_ttl: Duration::ZERO,
            refresh_ttl: Duration::ZERO,
            ..settings()
        })
        .await;
        auth.sign_up("jo@example.com", "secret1").await.unwrap();
        let abandoned = auth.sign_in("jo@example.com", "secret1").await.unwrap();

        tokio::time::sleep(Duration::from_millis(5)).await;
        auth.sign_in("jo@example.com", "secret1").await.unwrap();

        // Already deleted, so there is no lapsed row left to report on.
        assert!(auth.get_session(&abandoned.access_token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_refresh_rotates_tokens() {
        let (auth, _dir) = provider(settings()).await;
        auth.sign_up("jo@example.com", "secret1").await.unwrap();
        let session = auth.sign_in("jo@example.com", "secret1").await.unwrap();

        let fresh = auth.refresh_session(&session.refresh_token).await.unwrap();
        assert_ne!(fresh.access_token, session.access_token);
        assert!(auth.get_session(&session.access_token).await.unwrap().is_none());
        assert!(auth.get_session(&fresh.access_token).await.unwrap().is_some());

        let err = auth.refresh_session(&session.refresh_token).await.unwrap_err();
        assert!(err.is(REFRESH_TOKEN_NOT_FOUND));
    }
}
