//! Content AI Backend
//!
//! REST backend for a social media content assistant: Gemini-backed generation,
//! trending digests parsed into cards, and per-user saved content with
//! Tantivy full-text search.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod generation;
mod models;
mod prompt;
mod search;
mod trends;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use auth::{ProviderSettings, SessionEvent, SessionStore, SqliteAuthProvider};
use config::Config;
use db::Repository;
use generation::{GeminiClient, TextGenerator};
use search::SearchIndex;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub search: Arc<SearchIndex>,
    pub config: Arc<Config>,
    pub generator: Arc<dyn TextGenerator>,
    pub sessions: Arc<SessionStore>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Content AI Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Index path: {:?}", config.index_path);
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!("Generation model: {}", config.gemini_model);

    if let Some(warning) = config.credential_warning() {
        tracing::warn!("{} Generation is disabled.", warning);
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    // Initialize search index
    let search = Arc::new(SearchIndex::open(&config.index_path)?);

    // Build initial search index from database
    tracing::info!("Building search index...");
    let contents = repo.list_all_contents().await?;
    search.rebuild(&contents).await?;

    let pruned = repo.prune_expired_sessions(chrono::Utc::now()).await?;
    if pruned > 0 {
        tracing::info!("Pruned {} lapsed sessions", pruned);
    }

    let provider = Arc::new(SqliteAuthProvider::new(
        repo.clone(),
        ProviderSettings::from(&config),
    ));
    let sessions = Arc::new(SessionStore::new(provider));
    spawn_session_logger(&sessions);

    let generator: Arc<dyn TextGenerator> = Arc::new(GeminiClient::from_config(&config));

    // Create application state
    let state = AppState {
        repo,
        search,
        config: Arc::new(config.clone()),
        generator,
        sessions,
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Log every sign-in and sign-out seen by the session store.
fn spawn_session_logger(sessions: &SessionStore) {
    let mut events = sessions.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(SessionEvent::SignedIn { user_id }) => {
                    tracing::debug!(%user_id, "Session started");
                }
                Ok(SessionEvent::SignedOut { user_id }) => {
                    tracing::debug!(user_id = ?user_id, "Session ended");
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Session logger lagged, skipped {} events", skipped);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let sessions = state.sessions.clone();

    // Routes that need a signed-in user
    let protected_routes = Router::new()
        // Session
        .route("/auth/signout", post(api::sign_out))
        // Generation
        .route("/generate", post(api::generate))
        .route("/trends", get(api::get_trends))
        // Saved content
        .route("/contents", get(api::list_contents).post(api::save_content))
        .route(
            "/contents/{id}",
            get(api::get_content).delete(api::delete_content),
        )
        // Search
        .route("/search", get(api::search_contents))
        // Apply session gate middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::session_gate_layer(sessions.clone(), req, next)
        }));

    let public_routes = Router::new()
        .route("/kinds", get(api::list_kinds))
        .route("/generate/status", get(api::generation_status))
        .route("/auth/signup", post(api::sign_up))
        .route("/auth/signin", post(api::sign_in))
        .route("/auth/refresh", post(api::refresh_session))
        .route("/auth/verify", post(api::verify_email))
        .route("/auth/session", get(api::get_session));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", protected_routes.merge(public_routes))
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
