use crate::llm::client::{DeltaStream, LLMClient};
use crate::llm::http::{self, ChatCompletionResponse, ChatMessage};
use crate::llm::sse;
use crate::types::{AppError, ModelKind, Result};
use async_trait::async_trait;
use serde::Serialize;

const PROVIDER: &str = "Mistral";

#[derive(Debug, Serialize)]
struct MistralRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    safe_prompt: bool,
}

/// Mistral chat completions over HTTP
pub struct MistralClient {
    http: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
}

impl MistralClient {
    pub fn new(api_key: String, api_base: String, model: String) -> Result<Self> {
        Ok(Self {
            http: http::build_client(PROVIDER)?,
            api_key,
            api_base,
            model,
        })
    }

    async fn send(&self, system: &str, prompt: &str, stream: bool) -> Result<reqwest::Response> {
        let body = MistralRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(prompt)],
            stream,
            safe_prompt: false,
        };

        let response = self
            .http
            .post(http::completions_url(&self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::provider(PROVIDER, format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            let message = if text.is_empty() {
                http::status_text(status)
            } else {
                format!("{} ({})", http::status_text(status), text)
            };
            return Err(AppError::provider(PROVIDER, message));
        }

        Ok(response)
    }
}

#[async_trait]
impl LLMClient for MistralClient {
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        let response = self.send(system, prompt, false).await?;

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AppError::provider(PROVIDER, format!("Failed to parse response: {}", e)))?;

        Ok(body.into_content())
    }

    async fn stream_with_system(&self, system: &str, prompt: &str) -> Result<DeltaStream> {
        let response = self.send(system, prompt, true).await?;
        Ok(sse::delta_stream(response, PROVIDER))
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn kind(&self) -> ModelKind {
        ModelKind::Mistral
    }
}
