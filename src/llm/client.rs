//! LLM client abstraction and provider construction
//!
//! Every research backend implements [`LLMClient`], so the research pipeline
//! works with a plain `String` (or a stream of `String` deltas) no matter
//! which provider produced it:
//! - **GPT-4**: `async-openai` SDK (feature `openai`)
//! - **Claude**: `claude-sdk` (feature `anthropic`)
//! - **Mistral**: JSON over HTTP
//! - **Grok**: JSON over HTTP

use crate::types::{AppError, ModelKind, Result};
use async_trait::async_trait;
use futures::Stream;
use std::sync::Arc;

/// Stream of text deltas produced by a streaming completion.
pub type DeltaStream = Box<dyn Stream<Item = Result<String>> + Send + Unpin>;

/// Generic LLM client trait for provider abstraction
///
/// All research providers implement this trait. The orchestrator never looks
/// at which implementation it holds once a call has returned.
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate a completion for a system/user prompt pair
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Stream a completion for a system/user prompt pair
    async fn stream_with_system(&self, system: &str, prompt: &str) -> Result<DeltaStream>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;

    /// Which research backend this client talks to
    fn kind(&self) -> ModelKind;
}

/// Provider enum for runtime construction
///
/// | Provider | Transport | Streaming |
/// |----------|-----------|-----------|
/// | OpenAI | `async-openai` | ✅ |
/// | Anthropic | `claude-sdk` | ✅ |
/// | Mistral | HTTP (`reqwest`) | ✅ SSE |
/// | Grok | HTTP (`reqwest`) | ✅ SSE |
#[derive(Debug, Clone)]
pub enum Provider {
    /// OpenAI chat completions
    OpenAI {
        api_key: String,
        api_base: String,
        model: String,
    },

    /// Anthropic messages API
    Anthropic {
        api_key: String,
        model: String,
        max_tokens: u32,
    },

    /// Mistral chat completions
    Mistral {
        api_key: String,
        api_base: String,
        model: String,
    },

    /// xAI Grok chat completions, called with a plain HTTP POST
    Grok {
        api_key: String,
        api_base: String,
        model: String,
        temperature: f32,
    },
}

impl Provider {
    /// Create a client instance for this provider
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the provider's SDK feature is
    /// compiled out, or when the HTTP client cannot be built.
    pub fn create_client(&self) -> Result<Arc<dyn LLMClient>> {
        match self {
            #[cfg(feature = "openai")]
            Provider::OpenAI {
                api_key,
                api_base,
                model,
            } => Ok(Arc::new(super::openai::OpenAIClient::new(
                api_key.clone(),
                api_base.clone(),
                model.clone(),
            ))),

            #[cfg(not(feature = "openai"))]
            Provider::OpenAI { .. } => Err(AppError::Configuration(
                "The gpt4 provider requires the `openai` feature".to_string(),
            )),

            #[cfg(feature = "anthropic")]
            Provider::Anthropic {
                api_key,
                model,
                max_tokens,
            } => Ok(Arc::new(super::anthropic::AnthropicClient::new(
                api_key.clone(),
                model.clone(),
                *max_tokens,
            ))),

            #[cfg(not(feature = "anthropic"))]
            Provider::Anthropic { .. } => Err(AppError::Configuration(
                "The claude provider requires the `anthropic` feature".to_string(),
            )),

            Provider::Mistral {
                api_key,
                api_base,
                model,
            } => Ok(Arc::new(super::mistral::MistralClient::new(
                api_key.clone(),
                api_base.clone(),
                model.clone(),
            )?)),

            Provider::Grok {
                api_key,
                api_base,
                model,
                temperature,
            } => Ok(Arc::new(super::grok::GrokClient::new(
                api_key.clone(),
                api_base.clone(),
                model.clone(),
                *temperature,
            )?)),
        }
    }

    /// The research backend this provider serves
    pub fn kind(&self) -> ModelKind {
        match self {
            Provider::OpenAI { .. } => ModelKind::Gpt4,
            Provider::Anthropic { .. } => ModelKind::Claude,
            Provider::Mistral { .. } => ModelKind::Mistral,
            Provider::Grok { .. } => ModelKind::Grok,
        }
    }

    /// Get a human-readable name for this provider
    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAI { .. } => "OpenAI",
            Provider::Anthropic { .. } => "Anthropic",
            Provider::Mistral { .. } => "Mistral",
            Provider::Grok { .. } => "Grok",
        }
    }
}
