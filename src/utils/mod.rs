/// TOML configuration and the config manager.
pub mod toml_config;

pub use toml_config::{ConfigError, ConfigManager, ScoutConfig};
