//! Provider Registry for the four research backends
//!
//! Clients are built once at start-up from the `[providers.*]` sections of
//! `scout.toml` and shared by `Arc` with every job. Selecting a backend that
//! has no section is a configuration error reported to the caller.

use crate::llm::client::{LLMClient, Provider};
use crate::types::{AppError, ModelKind, Result};
use crate::utils::toml_config::{ProviderConfig, ScoutConfig};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

const OPENAI_BASE: &str = "https://api.openai.com/v1";
const MISTRAL_BASE: &str = "https://api.mistral.ai/v1";
const GROK_BASE: &str = "https://api.x.ai/v1";

/// Default model identifier for each backend
pub fn default_model(kind: ModelKind) -> &'static str {
    match kind {
        ModelKind::Gpt4 => "gpt-4",
        ModelKind::Claude => "claude-3-opus-20240229",
        ModelKind::Mistral => "mistral-large-latest",
        ModelKind::Grok => "grok-2-1212",
    }
}

/// Registry of constructed clients keyed by backend
#[derive(Default)]
pub struct ProviderRegistry {
    clients: HashMap<ModelKind, Arc<dyn LLMClient>>,
}

impl ProviderRegistry {
    /// Create a new empty provider registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a client for every configured backend
    ///
    /// # Errors
    ///
    /// Fails when a referenced API key variable is unset or a client cannot
    /// be constructed.
    pub fn from_config(config: &ScoutConfig) -> Result<Self> {
        let mut registry = Self::new();

        for (kind, provider_config) in config.providers.configured() {
            let api_key = config
                .resolve_env(&provider_config.api_key_env)
                .map_err(|e| AppError::Configuration(e.to_string()))?;
            let provider = Self::provider_for(kind, provider_config, api_key);
            let client = provider.create_client()?;

            info!(
                provider = provider.name(),
                model = client.model_name(),
                "Registered research provider"
            );
            registry.register(kind, client);
        }

        Ok(registry)
    }

    /// Resolve defaults for one backend into a [`Provider`]
    pub fn provider_for(kind: ModelKind, config: &ProviderConfig, api_key: String) -> Provider {
        let model = config
            .model
            .clone()
            .unwrap_or_else(|| default_model(kind).to_string());
        let base = |default: &str| config.api_base.clone().unwrap_or_else(|| default.to_string());

        match kind {
            ModelKind::Gpt4 => Provider::OpenAI {
                api_key,
                api_base: base(OPENAI_BASE),
                model,
            },
            ModelKind::Claude => Provider::Anthropic {
                api_key,
                model,
                max_tokens: config.max_tokens.unwrap_or(4096),
            },
            ModelKind::Mistral => Provider::Mistral {
                api_key,
                api_base: base(MISTRAL_BASE),
                model,
            },
            ModelKind::Grok => Provider::Grok {
                api_key,
                api_base: base(GROK_BASE),
                model,
                temperature: config.temperature.unwrap_or(0.7),
            },
        }
    }

    /// Register (or replace) the client for a backend
    pub fn register(&mut self, kind: ModelKind, client: Arc<dyn LLMClient>) {
        self.clients.insert(kind, client);
    }

    /// Client for a backend
    pub fn get(&self, kind: ModelKind) -> Result<Arc<dyn LLMClient>> {
        self.clients.get(&kind).cloned().ok_or_else(|| {
            AppError::Configuration(format!("Provider '{}' is not configured", kind))
        })
    }

    pub fn is_configured(&self, kind: ModelKind) -> bool {
        self.clients.contains_key(&kind)
    }

    /// Configured backends in display order
    pub fn configured(&self) -> Vec<ModelKind> {
        ModelKind::ALL
            .into_iter()
            .filter(|kind| self.is_configured(*kind))
            .collect()
    }
}
