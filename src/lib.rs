//! # Scout - company research server
//!
//! Submit a company name or URL, have one of four LLM providers (GPT-4,
//! Claude, Mistral, Grok) research it, and keep a structured, annotated
//! history of the reports.
//!
//! Scout can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `scout-server` binary
//! 2. **As a library** - Build an [`AppState`] and mount [`api::routes::app`]
//!
//! ## Configuration-Driven Setup
//!
//! ```rust,ignore
//! use scout::{AppState, ConfigManager};
//! use std::sync::Arc;
//!
//! let config_manager = Arc::new(ConfigManager::new("scout.toml")?);
//! let state = AppState::build(config_manager).await?;
//! let app = scout::api::routes::app(state);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `openai` | GPT-4 through the OpenAI SDK (default) |
//! | `anthropic` | Claude through the Anthropic SDK (default) |
//!
//! Mistral and Grok speak plain HTTP and are always available.
//!
//! ## Modules
//!
//! - [`api`] - REST API handlers and routes
//! - [`cli`] - Command-line parsing and colored output
//! - [`db`] - Research store (libsql, file or in-memory)
//! - [`llm`] - Provider clients and the provider registry
//! - [`research`] - Normalization, extraction and the research job
//! - [`types`] - Common types and error handling
//! - [`utils`] - TOML configuration

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Command-line interface.
pub mod cli;
/// Research store.
pub mod db;
/// LLM provider clients and abstractions.
pub mod llm;
/// The company research pipeline.
pub mod research;
/// Core types (records, requests, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

pub use db::{DatabaseProvider, ResearchStore, TursoClient};
pub use llm::{EmbeddingClient, LLMClient, Provider, ProviderRegistry};
pub use research::{InputNormalizer, JobScheduler, ResearchOrchestrator, StreamingGateway};
pub use types::{AppError, Result};
pub use utils::toml_config::{ConfigManager, ScoutConfig};

use crate::llm::OpenAIEmbeddings;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Validated TOML configuration
    pub config_manager: Arc<ConfigManager>,
    pub store: Arc<dyn ResearchStore>,
    /// Clients for every configured provider
    pub providers: Arc<ProviderRegistry>,
    /// Runs one background research job per submitted message
    pub scheduler: Arc<JobScheduler>,
    pub gateway: Arc<StreamingGateway>,
}

impl AppState {
    /// Open the store and build every provider client from configuration
    pub async fn build(config_manager: Arc<ConfigManager>) -> Result<Self> {
        let config = config_manager.config();

        let store = DatabaseProvider::from_config(&config.database)
            .create_client()
            .await?;
        let providers = Arc::new(ProviderRegistry::from_config(&config)?);
        let normalizer = Arc::new(InputNormalizer::new(&config.research)?);

        let mut orchestrator =
            ResearchOrchestrator::new(store.clone(), providers.clone(), normalizer.clone());
        if let Some(embeddings) = OpenAIEmbeddings::from_config(&config.research.embeddings)? {
            orchestrator = orchestrator.with_embeddings(Arc::new(embeddings));
        }

        Ok(Self::assemble(
            config_manager,
            store,
            providers,
            normalizer,
            orchestrator,
        ))
    }

    /// Wire prebuilt components together
    pub fn from_parts(
        config_manager: Arc<ConfigManager>,
        store: Arc<dyn ResearchStore>,
        providers: Arc<ProviderRegistry>,
        normalizer: Arc<InputNormalizer>,
    ) -> Self {
        let orchestrator =
            ResearchOrchestrator::new(store.clone(), providers.clone(), normalizer.clone());
        Self::assemble(config_manager, store, providers, normalizer, orchestrator)
    }

    /// Wait for background research jobs and streaming replies to finish
    pub async fn wait_idle(&self) {
        self.scheduler.wait_idle().await;
        self.gateway.wait_idle().await;
    }

    fn assemble(
        config_manager: Arc<ConfigManager>,
        store: Arc<dyn ResearchStore>,
        providers: Arc<ProviderRegistry>,
        normalizer: Arc<InputNormalizer>,
        orchestrator: ResearchOrchestrator,
    ) -> Self {
        let scheduler = Arc::new(JobScheduler::new(Arc::new(orchestrator)));
        let gateway = Arc::new(StreamingGateway::new(
            store.clone(),
            providers.clone(),
            normalizer,
        ));

        Self {
            config_manager,
            store,
            providers,
            scheduler,
            gateway,
        }
    }
}
