//! Text embeddings for the company-research cache

use crate::llm::http;
use crate::types::{AppError, Result};
use crate::utils::toml_config::{ConfigError, EmbeddingsConfig};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const PROVIDER: &str = "OpenAI embeddings";

/// Dimension of `text-embedding-3-small` vectors
pub const EMBEDDING_DIMENSION: usize = 1536;

#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// OpenAI `/embeddings` endpoint over HTTP
pub struct OpenAIEmbeddings {
    http: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
}

impl OpenAIEmbeddings {
    pub fn new(api_key: String, api_base: String, model: String) -> Result<Self> {
        Ok(Self {
            http: http::build_client(PROVIDER)?,
            api_key,
            api_base,
            model,
        })
    }

    /// Build from the `[research.embeddings]` section; `None` when disabled
    pub fn from_config(config: &EmbeddingsConfig) -> Result<Option<Self>> {
        if !config.enabled {
            return Ok(None);
        }
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            AppError::Configuration(
                ConfigError::MissingEnvVar(config.api_key_env.clone()).to_string(),
            )
        })?;

        Self::new(api_key, config.api_base.clone(), config.model.clone()).map(Some)
    }
}

#[async_trait]
impl EmbeddingClient for OpenAIEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/embeddings", self.api_base.trim_end_matches('/'));

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: text,
            })
            .send()
            .await
            .map_err(|e| AppError::provider(PROVIDER, e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::provider(
                PROVIDER,
                http::status_text(response.status()),
            ));
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| AppError::provider(PROVIDER, format!("Invalid response: {}", e)))?;

        body.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| AppError::provider(PROVIDER, "Response contained no embedding"))
    }
}
