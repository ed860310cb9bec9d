//! TOML-based configuration for Scout
//!
//! All runtime settings live in `scout.toml`. Secrets never appear in the
//! file itself: each provider names the environment variable holding its API
//! key, and loading fails fast when a referenced variable is not set.
//!
//! Use [`ConfigManager`] for thread-safe access to the current configuration.

use crate::types::ModelKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Root configuration structure loaded from scout.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoutConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    /// Research backends; a provider without a section is unavailable
    #[serde(default)]
    pub providers: ProvidersConfig,

    #[serde(default)]
    pub research: ResearchConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// `text` or `json`
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

// ============= Database Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Local libsql file path, or `:memory:`
    #[serde(default = "default_database_url")]
    pub url: String,
}

fn default_database_url() -> String {
    "./data/scout.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

// ============= Provider Configuration =============

/// One section per research backend: `[providers.gpt4]`, `[providers.claude]`,
/// `[providers.mistral]`, `[providers.grok]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub gpt4: Option<ProviderConfig>,

    #[serde(default)]
    pub claude: Option<ProviderConfig>,

    #[serde(default)]
    pub mistral: Option<ProviderConfig>,

    #[serde(default)]
    pub grok: Option<ProviderConfig>,
}

impl ProvidersConfig {
    /// Section for a backend, if configured
    pub fn get(&self, kind: ModelKind) -> Option<&ProviderConfig> {
        match kind {
            ModelKind::Gpt4 => self.gpt4.as_ref(),
            ModelKind::Claude => self.claude.as_ref(),
            ModelKind::Mistral => self.mistral.as_ref(),
            ModelKind::Grok => self.grok.as_ref(),
        }
    }

    /// Configured backends in display order
    pub fn configured(&self) -> Vec<(ModelKind, &ProviderConfig)> {
        ModelKind::ALL
            .into_iter()
            .filter_map(|kind| self.get(kind).map(|config| (kind, config)))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Environment variable name containing the API key
    pub api_key_env: String,

    /// Model override; each backend has its own default
    #[serde(default)]
    pub model: Option<String>,

    /// API base URL override
    #[serde(default)]
    pub api_base: Option<String>,

    #[serde(default)]
    pub temperature: Option<f32>,

    #[serde(default)]
    pub max_tokens: Option<u32>,
}

// ============= Research Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchConfig {
    /// Ask the selected provider for a general briefing on free-text queries
    #[serde(default = "default_true")]
    pub general_information: bool,

    /// Append instant-answer search results to free-text queries
    #[serde(default = "default_true")]
    pub search_enrichment: bool,

    #[serde(default = "default_search_url")]
    pub search_url: String,

    /// Timeout for URL fetches and search calls
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    #[serde(default)]
    pub embeddings: EmbeddingsConfig,
}

fn default_true() -> bool {
    true
}

fn default_search_url() -> String {
    "https://api.duckduckgo.com/".to_string()
}

fn default_fetch_timeout() -> u64 {
    15
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            general_information: true,
            search_enrichment: true,
            search_url: default_search_url(),
            fetch_timeout_secs: default_fetch_timeout(),
            embeddings: EmbeddingsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingsConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_embeddings_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_openai_base")]
    pub api_base: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,
}

fn default_embeddings_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_openai_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key_env: default_embeddings_key_env(),
            api_base: default_openai_base(),
            model: default_embedding_model(),
        }
    }
}

// ============= Errors =============

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),
}

impl ScoutConfig {
    /// Load and validate configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: ScoutConfig = toml::from_str(&content)?;

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration for internal consistency and env var availability
    pub fn validate(&self) -> Result<(), ConfigError> {
        let configured = self.providers.configured();
        if configured.is_empty() {
            return Err(ConfigError::ValidationError(
                "At least one provider must be configured under [providers]".to_string(),
            ));
        }

        for (kind, provider) in configured {
            self.validate_env_var(&provider.api_key_env)?;

            if let Some(temperature) = provider.temperature {
                if !(0.0..=2.0).contains(&temperature) {
                    return Err(ConfigError::ValidationError(format!(
                        "Temperature for provider '{}' must be between 0.0 and 2.0",
                        kind
                    )));
                }
            }
            if provider.max_tokens == Some(0) {
                return Err(ConfigError::ValidationError(format!(
                    "max_tokens for provider '{}' must be positive",
                    kind
                )));
            }
        }

        if self.research.embeddings.enabled {
            self.validate_env_var(&self.research.embeddings.api_key_env)?;
        }

        if !matches!(self.server.log_format.as_str(), "text" | "json") {
            return Err(ConfigError::ValidationError(format!(
                "Unknown log_format '{}' (expected \"text\" or \"json\")",
                self.server.log_format
            )));
        }

        Ok(())
    }

    fn validate_env_var(&self, name: &str) -> Result<(), ConfigError> {
        std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))?;
        Ok(())
    }

    /// Get a resolved value from an env var reference
    pub fn resolve_env(&self, env_name: &str) -> Result<String, ConfigError> {
        std::env::var(env_name).map_err(|_| ConfigError::MissingEnvVar(env_name.to_string()))
    }
}

// ============= Configuration Manager =============

/// Shared, validated configuration together with the file it came from
#[derive(Clone)]
pub struct ConfigManager {
    config: Arc<ScoutConfig>,
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new configuration manager and load the initial config
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(ConfigError::ReadError)?
                .join(path)
        };

        let config = ScoutConfig::load(&path)?;

        Ok(Self {
            config: Arc::new(config),
            config_path: path,
        })
    }

    /// Create a config manager directly from a config (useful for testing)
    pub fn from_config(config: ScoutConfig) -> Self {
        Self {
            config: Arc::new(config),
            config_path: PathBuf::from("scout.toml"),
        }
    }

    pub fn config(&self) -> Arc<ScoutConfig> {
        Arc::clone(&self.config)
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }
}
