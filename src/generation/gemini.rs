//! Gemini `generateContent` client.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{classify_remote_message, TextGenerator};
use crate::config::Config;
use crate::errors::AppError;

/// Client for the Gemini generative language API.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>, model: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.gemini_api_key.clone(),
            config.gemini_model.clone(),
            config.gemini_base_url.clone(),
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

/// Concatenate the text parts of the first candidate.
fn extract_text(body: &Value) -> Option<String> {
    let parts = body["candidates"][0]["content"]["parts"].as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|part| part["text"].as_str())
        .collect();
    Some(text)
}

fn extract_error_message(body: &str, status: reqwest::StatusCode) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| format!("HTTP {}", status))
}

#[async_trait]
impl TextGenerator for GeminiClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate(&self, instruction: &str) -> Result<String, AppError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(AppError::MissingCredential);
        };

        let payload = json!({
            "contents": [{ "parts": [{ "text": instruction }] }]
        });

        tracing::debug!(model = %self.model, "Sending generation request");
        let response = self
            .http
            .post(self.endpoint())
            .query(&[("key", api_key)])
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = extract_error_message(&body, status);
            tracing::warn!(%status, "Generation API error: {}", message);
            return Err(classify_remote_message(&message));
        }

        let value: Value = serde_json::from_str(&body)
            .map_err(|e| AppError::Remote(format!("Malformed generation response: {}", e)))?;

        // Some failures come back as 200 with an error object.
        if let Some(message) = value["error"]["message"].as_str() {
            return Err(classify_remote_message(message));
        }

        match extract_text(&value) {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(AppError::EmptyResponse),
        }
    }
}
