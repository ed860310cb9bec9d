//! Anthropic Claude LLM client implementation
//!
//! Enable with the `anthropic` feature flag. The system prompt travels in its
//! own request field rather than as a message.

use crate::llm::client::{DeltaStream, LLMClient};
use crate::types::{AppError, ModelKind, Result};
use async_trait::async_trait;
use claude_sdk::{ClaudeClient, ContentBlock, Message, MessagesRequest, StreamEvent};
use futures::StreamExt;

const PROVIDER: &str = "Anthropic";

/// Anthropic Claude client for API-based inference
pub struct AnthropicClient {
    client: ClaudeClient,
    model: String,
    max_tokens: u32,
}

impl AnthropicClient {
    /// Create a new Anthropic client
    ///
    /// # Arguments
    ///
    /// * `api_key` - Anthropic API key
    /// * `model` - Model identifier (e.g., "claude-3-opus-20240229")
    /// * `max_tokens` - Upper bound on generated tokens per request
    pub fn new(api_key: String, model: String, max_tokens: u32) -> Self {
        Self {
            client: ClaudeClient::anthropic(api_key),
            model,
            max_tokens,
        }
    }

    /// Extract text content from Claude response content blocks
    fn extract_text_content(content: &[ContentBlock]) -> String {
        content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// Extract text from a streaming event
    fn extract_stream_text(event: &StreamEvent) -> Option<String> {
        match event {
            StreamEvent::ContentBlockDelta { delta, .. } => delta.text().map(|s| s.to_string()),
            _ => None,
        }
    }

    fn build_request(&self, system: &str, prompt: &str) -> MessagesRequest {
        MessagesRequest::new(
            self.model.clone(),
            self.max_tokens,
            vec![Message::user(prompt.to_string())],
        )
        .with_system(system.to_string())
    }
}

#[async_trait]
impl LLMClient for AnthropicClient {
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        let request = self.build_request(system, prompt);

        let response = self
            .client
            .send_message(request)
            .await
            .map_err(|e| AppError::provider(PROVIDER, e.to_string()))?;

        Ok(Self::extract_text_content(&response.content))
    }

    async fn stream_with_system(&self, system: &str, prompt: &str) -> Result<DeltaStream> {
        let request = self.build_request(system, prompt);

        let stream = self
            .client
            .send_streaming(request)
            .await
            .map_err(|e| AppError::provider(PROVIDER, e.to_string()))?;

        let result_stream = async_stream::stream! {
            let mut stream = stream;
            while let Some(result) = stream.next().await {
                match result {
                    Ok(event) => {
                        if let Some(text) = Self::extract_stream_text(&event) {
                            yield Ok(text);
                        }
                    }
                    Err(e) => {
                        yield Err(AppError::provider(PROVIDER, format!("Stream error: {}", e)));
                    }
                }
            }
        };

        Ok(Box::new(Box::pin(result_stream)))
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn kind(&self) -> ModelKind {
        ModelKind::Claude
    }
}
