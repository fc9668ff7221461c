//! Database repository for CRUD operations.
//!
//! Uses prepared statements; every content query is scoped to its owner.

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{ContentType, NewContent, SavedContent, User};

/// Fixed-width timestamp so that text ordering matches time ordering.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// A user row together with its password hash.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

/// A session row as stored.
#[derive(Debug, Clone)]
pub struct StoredSession {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== USER OPERATIONS ====================

    /// Create a user. Returns `None` when the email is already registered.
    pub async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        confirmation_token: Option<&str>,
    ) -> Result<Option<User>, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = timestamp(Utc::now());
        let confirmed = confirmation_token.is_none();

        let result = sqlx::query(
            "INSERT INTO users (id, email, password_hash, email_confirmed, confirmation_token, created_at) VALUES (?, ?, ?, ?, ?, ?)"
        )
        .bind(&id)
        .bind(email)
        .bind(password_hash)
        .bind(confirmed as i32)
        .bind(confirmation_token)
        .bind(&now)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(Some(User {
                id,
                email: email.to_string(),
                email_confirmed: confirmed,
                created_at: now,
            })),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Look up a user and password hash by email (case-insensitive).
    pub async fn find_credentials(&self, email: &str) -> Result<Option<UserCredentials>, AppError> {
        let row = sqlx::query(
            "SELECT id, email, password_hash, email_confirmed, created_at FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| UserCredentials {
            password_hash: row.get("password_hash"),
            user: user_from_row(&row),
        }))
    }

    /// Get a user by ID.
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query(
            "SELECT id, email, email_confirmed, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// Confirm the user holding `token`. The token is single use.
    pub async fn confirm_user(&self, token: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query(
            "UPDATE users SET email_confirmed = 1, confirmation_token = NULL WHERE confirmation_token = ? RETURNING id, email, email_confirmed, created_at",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    // ==================== SESSION OPERATIONS ====================

    /// Store a new session.
    pub async fn insert_session(&self, session: &StoredSession) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO sessions (access_token, refresh_token, user_id, expires_at, refresh_expires_at, created_at) VALUES (?, ?, ?, ?, ?, ?)"
        )
        .bind(&session.access_token)
        .bind(&session.refresh_token)
        .bind(&session.user_id)
        .bind(timestamp(session.expires_at))
        .bind(timestamp(session.refresh_expires_at))
        .bind(timestamp(Utc::now()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Find a session by access token.
    pub async fn find_session(&self, access_token: &str) -> Result<Option<StoredSession>, AppError> {
        let row = sqlx::query(
            "SELECT access_token, refresh_token, user_id, expires_at, refresh_expires_at FROM sessions WHERE access_token = ?",
        )
        .bind(access_token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(session_from_row))
    }

    /// Find a session by refresh token.
    pub async fn find_session_by_refresh(
        &self,
        refresh_token: &str,
    ) -> Result<Option<StoredSession>, AppError> {
        let row = sqlx::query(
            "SELECT access_token, refresh_token, user_id, expires_at, refresh_expires_at FROM sessions WHERE refresh_token = ?",
        )
        .bind(refresh_token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(session_from_row))
    }

    /// Replace a session with a freshly issued one.
    pub async fn rotate_session(
        &self,
        old_access_token: &str,
        session: &StoredSession,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM sessions WHERE access_token = ?")
            .bind(old_access_token)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO sessions (access_token, refresh_token, user_id, expires_at, refresh_expires_at, created_at) VALUES (?, ?, ?, ?, ?, ?)"
        )
        .bind(&session.access_token)
        .bind(&session.refresh_token)
        .bind(&session.user_id)
        .bind(timestamp(session.expires_at))
        .bind(timestamp(session.refresh_expires_at))
        .bind(timestamp(Utc::now()))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Delete a session. Returns whether one existed.
    pub async fn delete_session(&self, access_token: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE access_token = ?")
            .bind(access_token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Drop sessions whose refresh token lapsed before `now`. Returns how many went.
    pub async fn prune_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE refresh_expires_at < ?")
            .bind(timestamp(now))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    // ==================== CONTENT OPERATIONS ====================

    /// Save content for `owner`.
    pub async fn create_content(
        &self,
        owner: &str,
        content: &NewContent,
    ) -> Result<SavedContent, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = timestamp(Utc::now());

        sqlx::query(
            "INSERT INTO contents (id, user_id, title, content, platform, type, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(&id)
        .bind(owner)
        .bind(&content.title)
        .bind(&content.content)
        .bind(&content.platform)
        .bind(content.content_type.as_str())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(SavedContent {
            id,
            user_id: owner.to_string(),
            title: content.title.clone(),
            content: content.content.clone(),
            platform: content.platform.clone(),
            content_type: content.content_type,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// List an owner's content, newest first.
    pub async fn list_contents(
        &self,
        owner: &str,
        content_type: Option<ContentType>,
    ) -> Result<Vec<SavedContent>, AppError> {
        let rows = sqlx::query(
            "SELECT id, user_id, title, content, platform, type, created_at, updated_at FROM contents WHERE user_id = ? AND (? IS NULL OR type = ?) ORDER BY created_at DESC, rowid DESC"
        )
        .bind(owner)
        .bind(content_type.map(|t| t.as_str()))
        .bind(content_type.map(|t| t.as_str()))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().filter_map(content_from_row).collect())
    }

    /// List every saved item, for rebuilding the search index.
    pub async fn list_all_contents(&self) -> Result<Vec<SavedContent>, AppError> {
        let rows = sqlx::query(
            "SELECT id, user_id, title, content, platform, type, created_at, updated_at FROM contents ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().filter_map(content_from_row).collect())
    }

    /// Get one of an owner's items.
    pub async fn get_content(&self, owner: &str, id: &str) -> Result<Option<SavedContent>, AppError> {
        let row = sqlx::query(
            "SELECT id, user_id, title, content, platform, type, created_at, updated_at FROM contents WHERE id = ? AND user_id = ?",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().and_then(content_from_row))
    }

    /// Delete one of an owner's items.
    pub async fn delete_content(&self, owner: &str, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM contents WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Content {} not found", id)));
        }

        Ok(())
    }
}

// Helper functions for row conversion

fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> User {
    let email_confirmed: i32 = row.get("email_confirmed");
    User {
        id: row.get("id"),
        email: row.get("email"),
        email_confirmed: email_confirmed != 0,
        created_at: row.get("created_at"),
    }
}

fn session_from_row(row: &sqlx::sqlite::SqliteRow) -> StoredSession {
    StoredSession {
        access_token: row.get("access_token"),
        refresh_token: row.get("refresh_token"),
        user_id: row.get("user_id"),
        expires_at: row.get("expires_at"),
        refresh_expires_at: row.get("refresh_expires_at"),
    }
}

fn content_from_row(row: &sqlx::sqlite::SqliteRow) -> Option<SavedContent> {
    let type_str: String = row.get("type");
    let Some(content_type) = ContentType::from_str(&type_str) else {
        tracing::warn!("Skipping content with unknown type {:?}", type_str);
        return None;
    };

    Some(SavedContent {
        id: row.get("id"),
        user_id: row.get("user_id"),
        title: row.get("title"),
        content: row.get("content"),
        platform: row.get("platform"),
        content_type,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_database;
    use tempfile::TempDir;

    async fn repo() -> (Repository, TempDir) {
        let dir = TempDir::new().unwrap();
        let pool = init_database(&dir.path().join("test.sqlite")).await.unwrap();
        (Repository::new(pool), dir)
    }

    fn new_content(title: &str, content_type: ContentType) -> NewContent {
        NewContent {
            title: title.to_string(),
            content: format!("{} body", title),
            platform: "instagram".to_string(),
            content_type,
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let (repo, _dir) = repo().await;
        let first = repo.create_user("a@example.com", "hash", None).await.unwrap();
        assert!(first.is_some_and(|u| u.email_confirmed));

        let second = repo.create_user("A@example.com", "hash", None).await.unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn test_confirmation_token_is_single_use() {
        let (repo, _dir) = repo().await;
        let user = repo
            .create_user("b@example.com", "hash", Some("tok"))
            .await
            .unwrap()
            .unwrap();
        assert!(!user.email_confirmed);

        let confirmed = repo.confirm_user("tok").await.unwrap().unwrap();
        assert!(confirmed.email_confirmed);
        assert!(repo.confirm_user("tok").await.unwrap().is_none());
    }

    fn stored_session(user_id: &str, token: &str, refresh_expires_at: DateTime<Utc>) -> StoredSession {
        StoredSession {
            access_token: format!("{}-access", token),
            refresh_token: format!("{}-refresh", token),
            user_id: user_id.to_string(),
            expires_at: refresh_expires_at,
            refresh_expires_at,
        }
    }

    #[tokio::test]
    async fn test_prune_drops_only_lapsed_sessions() {
        let (repo, _dir) = repo().await;
        let user = repo.create_user("c@example.com", "h", None).await.unwrap().unwrap();
        let now = Utc::now();

        repo.insert_session(&stored_session(&user.id, "old", now - chrono::Duration::days(2)))
            .await
            .unwrap();
        repo.insert_session(&stored_session(&user.id, "live", now + chrono::Duration::days(2)))
            .await
            .unwrap();

        assert_eq!(repo.prune_expired_sessions(now).await.unwrap(), 1);
        assert!(repo.find_session("old-access").await.unwrap().is_none());

        let live = repo.find_session("live-access").await.unwrap().unwrap();
        assert_eq!(live.refresh_token, "live-refresh");
        assert_eq!(timestamp(live.refresh_expires_at), timestamp(now + chrono::Duration::days(2)));

        assert_eq!(repo.prune_expired_sessions(now).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_contents_are_scoped_and_ordered() {
        let (repo, _dir) = repo().await;
        let alice = repo.create_user("alice@example.com", "h", None).await.unwrap().unwrap();
        let bob = repo.create_user("bob@example.com", "h", None).await.unwrap().unwrap();

        let first = repo
            .create_content(&alice.id, &new_content("first", ContentType::Caption))
            .await
            .unwrap();
        let second = repo
            .create_content(&alice.id, &new_content("second", ContentType::Script))
            .await
            .unwrap();
        repo.create_content(&bob.id, &new_content("bob's", ContentType::Idea))
            .await
            .unwrap();

        let listed = repo.list_contents(&alice.id, None).await.unwrap();
        let ids: Vec<&str> = listed.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);

        let scripts = repo
            .list_contents(&alice.id, Some(ContentType::Script))
            .await
            .unwrap();
        assert_eq!(scripts.len(), 1);
        assert_eq!(scripts[0].title, "second");

        // Bob cannot see or delete Alice's content.
        assert!(repo.get_content(&bob.id, &first.id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete_content(&bob.id, &first.id).await,
            Err(AppError::NotFound(_))
        ));

        repo.delete_content(&alice.id, &first.id).await.unwrap();
        assert!(repo.get_content(&alice.id, &first.id).await.unwrap().is_none());
        assert_eq!(repo.list_all_contents().await.unwrap().len(), 2);
    }
}
