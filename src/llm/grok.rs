//! xAI Grok client
//!
//! Grok has no typed SDK here; requests are plain JSON POSTs and a non-2xx
//! response is reported with its HTTP status text.

use crate::llm::client::{DeltaStream, LLMClient};
use crate::llm::http::{self, ChatCompletionResponse, ChatMessage};
use crate::llm::sse;
use crate::types::{AppError, ModelKind, Result};
use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

const PROVIDER: &str = "Grok";

#[derive(Debug, Serialize)]
struct GrokRequest {
    messages: Vec<ChatMessage>,
    model: String,
    temperature: f32,
    stream: bool,
}

pub struct GrokClient {
    http: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
    temperature: f32,
}

impl GrokClient {
    pub fn new(api_key: String, api_base: String, model: String, temperature: f32) -> Result<Self> {
        Ok(Self {
            http: http::build_client(PROVIDER)?,
            api_key,
            api_base,
            model,
            temperature,
        })
    }

    async fn send(&self, system: &str, prompt: &str, stream: bool) -> Result<reqwest::Response> {
        let body = GrokRequest {
            messages: vec![ChatMessage::system(system), ChatMessage::user(prompt)],
            model: self.model.clone(),
            temperature: self.temperature,
            stream,
        };

        debug!(model = %self.model, stream, "Sending Grok request");

        let response = self
            .http
            .post(http::completions_url(&self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::provider(PROVIDER, e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::provider(
                PROVIDER,
                http::status_text(response.status()),
            ));
        }

        Ok(response)
    }
}

#[async_trait]
impl LLMClient for GrokClient {
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        let response = self.send(system, prompt, false).await?;

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AppError::provider(PROVIDER, format!("Invalid response: {}", e)))?;

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
        ModelKind::Grok
    }
}
