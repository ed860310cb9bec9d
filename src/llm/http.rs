//! Shared pieces for providers spoken to over plain HTTP
//!
//! Mistral and Grok both expose an OpenAI-compatible `/chat/completions`
//! endpoint. Request bodies differ per provider, so each client owns its
//! request struct; responses and status handling are shared here.

use crate::types::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound on a single non-streaming completion.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: &str) -> Self {
        Self {
            role: "system",
            content: content.to_string(),
        }
    }

    pub fn user(content: &str) -> Self {
        Self {
            role: "user",
            content: content.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    /// Content of the first choice, empty when the provider returned none.
    pub fn into_content(self) -> String {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default()
    }
}

/// Build the HTTP client used by one provider.
pub fn build_client(provider: &str) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| AppError::Configuration(format!("{} HTTP client: {}", provider, e)))
}

/// Join an API base URL and the chat completions path.
pub fn completions_url(api_base: &str) -> String {
    format!("{}/chat/completions", api_base.trim_end_matches('/'))
}

/// Canonical reason phrase for a status, falling back to the numeric code.
pub fn status_text(status: reqwest::StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completions_url_trims_trailing_slash() {
        assert_eq!(
            completions_url("https://api.x.ai/v1/"),
            "https://api.x.ai/v1/chat/completions"
        );
        assert_eq!(
            completions_url("https://api.mistral.ai/v1"),
            "https://api.mistral.ai/v1/chat/completions"
        );
    }

    #[test]
    fn test_status_text() {
        assert_eq!(
            status_text(reqwest::StatusCode::TOO_MANY_REQUESTS),
            "Too Many Requests"
        );
        assert_eq!(
            status_text(reqwest::StatusCode::from_u16(599).unwrap()),
            "599"
        );
    }

    #[test]
    fn test_empty_choices_yield_empty_content() {
        let response: ChatCompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(response.into_content(), "");
    }
}
