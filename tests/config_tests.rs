//! Configuration file tests: the shipped scout.toml and start-up wiring.

use scout::types::ModelKind;
use scout::{AppState, ConfigManager, ScoutConfig};
use std::io::Write;
use std::sync::Arc;

#[test]
fn test_shipped_config_parses() {
    let content = std::fs::read_to_string(concat!(env!("CARGO_MANIFEST_DIR"), "/scout.toml"))
        .expect("scout.toml should exist");
    let config: ScoutConfig = toml::from_str(&content).expect("scout.toml should parse");

    let kinds: Vec<ModelKind> = config
        .providers
        .configured()
        .into_iter()
        .map(|(kind, _)| kind)
        .collect();
    assert_eq!(kinds, ModelKind::ALL.to_vec());
    assert_eq!(config.server.port, 3000);
    assert!(!config.research.embeddings.enabled);
}

#[tokio::test]
async fn test_app_state_builds_from_file() {
    std::env::set_var("SCOUT_CONFIG_TEST_KEY", "test-key");
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[database]
url = ":memory:"

[providers.mistral]
api_key_env = "SCOUT_CONFIG_TEST_KEY"

[providers.grok]
api_key_env = "SCOUT_CONFIG_TEST_KEY"
api_base = "http://127.0.0.1:9"

[research]
search_enrichment = false
"#
    )
    .unwrap();

    let manager = Arc::new(ConfigManager::new(file.path()).unwrap());
    let state = AppState::build(manager).await.unwrap();

    assert_eq!(
        state.providers.configured(),
        vec![ModelKind::Mistral, ModelKind::Grok]
    );
    assert!(!state.providers.is_configured(ModelKind::Gpt4));
    assert!(state.store.list_conversations().await.unwrap().is_empty());
}
