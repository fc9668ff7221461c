//! Configuration module for the Content AI backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Placeholder value shipped in sample `.env` files; treated as "no key".
pub const PLACEHOLDER_API_KEY: &str = "your-gemini-api-key";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Gemini API key. Generation is disabled without it.
    pub gemini_api_key: Option<String>,
    /// Gemini model name
    pub gemini_model: String,
    /// Base URL of the generative language API
    pub gemini_base_url: String,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Path to Tantivy search index directory
    pub index_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Whether new accounts may be registered
    pub signups_enabled: bool,
    /// Whether password sign-in is allowed
    pub logins_enabled: bool,
    /// New accounts must confirm their email before signing in
    pub require_email_confirmation: bool,
    /// Lifetime of an access token
    pub session_ttl: Duration,
    /// Lifetime of a refresh token
    pub refresh_ttl: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let gemini_api_key = env::var("GEMINI_API_KEY")
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty() && key != PLACEHOLDER_API_KEY);

        let gemini_model = env::var("CONTENT_AI_GEMINI_MODEL")
            .unwrap_or_else(|_| "gemini-1.5-flash".to_string());

        let gemini_base_url = env::var("CONTENT_AI_GEMINI_BASE_URL")
            .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string());

        let db_path = env::var("CONTENT_AI_DB_PATH")
            .unwrap_or_else(|_| "./data/app.sqlite".to_string())
            .into();

        let index_path = env::var("CONTENT_AI_INDEX_PATH")
            .unwrap_or_else(|_| "./data/index".to_string())
            .into();

        let bind_addr = env::var("CONTENT_AI_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .expect("Invalid CONTENT_AI_BIND_ADDR format");

        let log_level = env::var("CONTENT_AI_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Self {
            gemini_api_key,
            gemini_model,
            gemini_base_url,
            db_path,
            index_path,
            bind_addr,
            log_level,
            signups_enabled: env_flag("CONTENT_AI_SIGNUPS_ENABLED", true),
            logins_enabled: env_flag("CONTENT_AI_LOGINS_ENABLED", true),
            require_email_confirmation: env_flag("CONTENT_AI_REQUIRE_EMAIL_CONFIRMATION", false),
            session_ttl: env_secs("CONTENT_AI_SESSION_TTL_SECS", 3600),
            refresh_ttl: env_secs("CONTENT_AI_REFRESH_TTL_SECS", 30 * 24 * 3600),
        }
    }

    /// Warning shown to clients while generation is unavailable.
    pub fn credential_warning(&self) -> Option<&'static str> {
        if self.gemini_api_key.is_none() {
            Some("Gemini API key is not configured. Set GEMINI_API_KEY to enable generation.")
        } else {
            None
        }
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

fn env_secs(name: &str, default: u64) -> Duration {
    let secs = env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default);
    Duration::from_secs(secs)
}
