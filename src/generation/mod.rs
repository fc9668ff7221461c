//! Text generation against a remote generative-language API.
//!
//! One call per request. No retries, no streaming: a failed attempt goes
//! straight back to the caller.

mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;

use crate::errors::AppError;

/// Upstream messages that mean the configured key was rejected.
const INVALID_KEY_MESSAGES: [&str; 3] = [
    "API key not valid",
    "API key missing",
    "Invalid API key provided",
];

/// Something that turns an instruction into generated text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Whether a credential is available. Generation fails fast without one.
    fn is_configured(&self) -> bool;

    /// Send `instruction` and return the generated text.
    async fn generate(&self, instruction: &str) -> Result<String, AppError>;
}

/// Map an upstream failure message to a typed error.
pub fn classify_remote_message(message: &str) -> AppError {
    if INVALID_KEY_MESSAGES.iter().any(|m| message.contains(m)) {
        AppError::InvalidCredential
    } else if message.trim().is_empty() {
        AppError::Remote("Failed to generate content. Please try again.".to_string())
    } else {
        AppError::Remote(message.to_string())
    }
}
