//! Process-wide authentication state.
//!
//! One [`SessionStore`] is built at startup and shared through the app
//! state. It fronts the [`AuthProvider`], caches the user behind each live
//! access token until that token expires, and broadcasts sign-in/sign-out
//! events to subscribers.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, RwLock};

use super::provider::{
    AuthProvider, ProviderError, EMAIL_NOT_CONFIRMED, INVALID_LOGIN_CREDENTIALS, LOGINS_DISABLED,
    REFRESH_TOKEN_NOT_FOUND, SIGNUPS_DISABLED,
};
use crate::errors::AppError;
use crate::models::{Session, SignUpOutcome, User};

const EVENT_CAPACITY: usize = 64;

/// Change in who is signed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn { user_id: String },
    SignedOut { user_id: Option<String> },
}

/// A resolved user, valid until its access token expires.
#[derive(Debug, Clone)]
struct CachedSession {
    user: User,
    refresh_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedSession {
    fn from_session(session: &Session) -> Option<Self> {
        let expires_at = DateTime::parse_from_rfc3339(&session.expires_at)
            .ok()?
            .with_timezone(&Utc);
        Some(Self {
            user: session.user.clone(),
            refresh_token: session.refresh_token.clone(),
            expires_at,
        })
    }

    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Observable store of authenticated sessions.
pub struct SessionStore {
    provider: Arc<dyn AuthProvider>,
    sessions: RwLock<HashMap<String, CachedSession>>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionStore {
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            provider,
            sessions: RwLock::new(HashMap::new()),
            events,
        }
    }

    /// Receive every sign-in and sign-out from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// The user behind `access_token` if this store issued or resolved it and
    /// it has not expired yet. Never asks the provider.
    pub async fn current(&self, access_token: &str) -> Option<User> {
        let now = Utc::now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(access_token) {
                Some(cached) if cached.is_live(now) => return Some(cached.user.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        self.forget(access_token).await;
        None
    }

    /// Cache a live session, sweeping out every expired entry on the way.
    async fn remember(&self, session: &Session) {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, cached| cached.is_live(now));
        match CachedSession::from_session(session) {
            Some(cached) if cached.is_live(now) => {
                sessions.insert(session.access_token.clone(), cached);
            }
            Some(_) => {}
            None => tracing::warn!("Session with unreadable expiry was not cached"),
        }
    }

    #[cfg(test)]
    async fn cached_sessions(&self) -> usize {
        self.sessions.read().await.len()
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    async fn forget(&self, access_token: &str) -> Option<User> {
        self.sessions
            .write()
            .await
            .remove(access_token)
            .map(|cached| cached.user)
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, AppError> {
        self.provider
            .sign_up(email, password)
            .await
            .map_err(|err| match err {
                e if e.is(SIGNUPS_DISABLED) => AppError::AuthDisabled(
                    "Sign up is currently disabled. Please try again later.".to_string(),
                ),
                e => provider_failure(e, AppError::Validation),
            })
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let session = self
            .provider
            .sign_in(email, password)
            .await
            .map_err(|err| match err {
                e if e.is(LOGINS_DISABLED) => AppError::AuthDisabled(
                    "Sign in is currently disabled. Please try again later.".to_string(),
                ),
                e if e.is(INVALID_LOGIN_CREDENTIALS) => AppError::InvalidLogin,
                e if e.is(EMAIL_NOT_CONFIRMED) => AppError::Unauthorized(
                    "Please confirm your email address before signing in.".to_string(),
                ),
                e => provider_failure(e, AppError::Unauthorized),
            })?;

        self.remember(&session).await;
        tracing::info!(user_id = %session.user.id, "User signed in");
        self.publish(SessionEvent::SignedIn {
            user_id: session.user.id.clone(),
        });

        Ok(session)
    }

    pub async fn sign_out(&self, access_token: &str) -> Result<(), AppError> {
        self.provider.sign_out(access_token).await.map_err(|e| {
            tracing::error!("Error signing out: {}", e);
            AppError::Internal("Error signing out. Please try again.".to_string())
        })?;

        let user = self.forget(access_token).await;
        self.publish(SessionEvent::SignedOut {
            user_id: user.map(|u| u.id),
        });
        Ok(())
    }

    /// Resolve the user behind `access_token`.
    ///
    /// A session whose refresh token is gone counts as signed out rather
    /// than as an error.
    pub async fn check_session(&self, access_token: &str) -> Result<Option<User>, AppError> {
        match self.provider.get_session(access_token).await {
            Ok(Some(session)) => {
                self.remember(&session).await;
                Ok(Some(session.user))
            }
            Ok(None) => {
                self.forget(access_token).await;
                Ok(None)
            }
            Err(e) if e.is(REFRESH_TOKEN_NOT_FOUND) => {
                tracing::debug!("Stale session, signing out locally");
                if let Err(e) = self.provider.sign_out(access_token).await {
                    tracing::warn!("Failed to drop stale session: {}", e);
                }
                let user = self.forget(access_token).await;
                self.publish(SessionEvent::SignedOut {
                    user_id: user.map(|u| u.id),
                });
                Ok(None)
            }
            Err(e) => {
                tracing::error!("Error checking user session: {}", e);
                Err(provider_failure(e, AppError::Unauthorized))
            }
        }
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<Session, AppError> {
        let result = self.provider.refresh_session(refresh_token).await;

        // The access token paired with `refresh_token` is dead either way.
        self.sessions
            .write()
            .await
            .retain(|_, cached| cached.refresh_token != refresh_token);

        let session = result.map_err(|err| match err {
            e if e.is(REFRESH_TOKEN_NOT_FOUND) => AppError::Unauthorized(
                "Your session has expired. Please sign in again.".to_string(),
            ),
            e => provider_failure(e, AppError::Unauthorized),
        })?;

        self.remember(&session).await;
        Ok(session)
    }

    pub async fn confirm_email(&self, token: &str) -> Result<User, AppError> {
        self.provider
            .confirm_email(token)
            .await
            .map_err(|e| provider_failure(e, AppError::Validation))
    }
}

/// Internal provider failures become 500s; rejections keep their wording.
fn provider_failure(err: ProviderError, rejection: fn(String) -> AppError) -> AppError {
    if err.internal {
        AppError::Internal(err.message)
    } else {
        rejection(err.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::provider::{ProviderSettings, SqliteAuthProvider};
    use crate::db::{init_database, Repository};
    use std::time::Duration;
    use tempfile::TempDir;

    async fn store(settings: ProviderSettings) -> (SessionStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let pool = init_database(&dir.path().join("auth.sqlite")).await.unwrap();
        let repo = Arc::new(Repository::new(pool));
        let provider = Arc::new(SqliteAuthProvider::new(repo, settings));
        (SessionStore::new(provider), dir)
    }

    fn settings() -> ProviderSettings {
        ProviderSettings {
            signups_enabled: true,
            logins_enabled: true,
            require_email_confirmation: false,
            session_ttl: Duration::from_secs(3600),
            refresh_ttl: Duration::from_secs(7200),
        }
    }

    #[tokio::test]
    async fn test_invalid_login_is_remapped() {
        let (store, _dir) = store(settings()).await;
        store.sign_up("jo@example.com", "secret1").await.unwrap();

        let err = store.sign_in("jo@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidLogin));
        assert_eq!(err.message(), "Invalid email or password.");
    }

    #[tokio::test]
    async fn test_disabled_logins_are_remapped() {
        let (store, _dir) = store(ProviderSettings {
            logins_enabled: false,
            ..settings()
        })
        .await;

        let err = store.sign_in("jo@example.com", "secret1").await.unwrap_err();
        assert!(
            matches!(err, AppError::AuthDisabled(ref msg) if msg.starts_with("Sign in is currently disabled"))
        );
    }

    #[tokio::test]
    async fn test_events_and_current_user() {
        let (store, _dir) = store(settings()).await;
        let mut events = store.subscribe();
        store.sign_up("jo@example.com", "secret1").await.unwrap();

        let session = store.sign_in("jo@example.com", "secret1").await.unwrap();
        assert_eq!(
            events.recv().await.unwrap(),
            SessionEvent::SignedIn {
                user_id: session.user.id.clone()
            }
        );
        assert_eq!(store.current(&session.access_token).await, Some(session.user.clone()));

        store.sign_out(&session.access_token).await.unwrap();
        assert_eq!(
            events.recv().await.unwrap(),
            SessionEvent::SignedOut {
                user_id: Some(session.user.id.clone())
            }
        );
        assert!(store.current(&session.access_token).await.is_none());
        assert!(store.check_session(&session.access_token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_refresh_evicts_rotated_token() {
        let (store, _dir) = store(settings()).await;
        store.sign_up("jo@example.com", "secret1").await.unwrap();
        let session = store.sign_in("jo@example.com", "secret1").await.unwrap();

        let fresh = store.refresh(&session.refresh_token).await.unwrap();
        assert!(store.current(&session.access_token).await.is_none());
        assert_eq!(store.current(&fresh.access_token).await, Some(session.user.clone()));
        assert_eq!(store.cached_sessions().await, 1);

        // A replayed refresh token fails and leaves nothing behind for it.
        assert!(store.refresh(&session.refresh_token).await.is_err());
        assert!(store.current(&session.access_token).await.is_none());
    }

    #[tokio::test]
    async fn test_expired_sessions_are_not_kept() {
        let (store, _dir) = store(ProviderSettings {
            session_ttl: Duration::ZERO,
            ..settings()
        })
        .await;
        store.sign_up("jo@example.com", "secret1").await.unwrap();

        let mut tokens = Vec::new();
        for _ in 0..50 {
            tokens.push(store.sign_in("jo@example.com", "secret1").await.unwrap().access_token);
        }

        assert_eq!(store.cached_sessions().await, 0);
        for token in &tokens {
            assert!(store.current(token).await.is_none());
        }
    }

    #[tokio::test]
    async fn test_live_sessions_are_served_from_cache() {
        let (store, _dir) = store(settings()).await;
        store.sign_up("jo@example.com", "secret1").await.unwrap();
        for _ in 0..3 {
            store.sign_in("jo@example.com", "secret1").await.unwrap();
        }
        assert_eq!(store.cached_sessions().await, 3);
        assert!(store.current("never-issued").await.is_none());
    }

    #[tokio::test]
    async fn test_stale_refresh_token_means_no_session() {
        let (store, _dir) = store(ProviderSettings {
            session_ttl: Duration::ZERO,
            refresh_ttl: Duration::ZERO,
            ..settings()
        })
        .await;
        store.sign_up("jo@example.com", "secret1").await.unwrap();
        let session = store.sign_in("jo@example.com", "secret1").await.unwrap();
        let mut events = store.subscribe();

        let user = store.check_session(&session.access_token).await.unwrap();
        assert!(user.is_none());
        assert!(matches!(
            events.recv().await.unwrap(),
            SessionEvent::SignedOut { .. }
        ));
        assert!(store.current(&session.access_token).await.is_none());
    }
}
