//! Fixtures shared by the integration tests.

#![allow(dead_code)]

pub mod mocks;

use scout::db::{NewMessage, ResearchStore, TursoClient};
use scout::llm::{LLMClient, ProviderRegistry};
use scout::research::InputNormalizer;
use scout::types::{ConversationStatus, Message, ModelKind};
use scout::utils::toml_config::ResearchConfig;
use std::sync::Arc;

pub const REPORT: &str = "🏢 COMPANY OVERVIEW
• Name: Acme Corp
• Industry: Robotics
• Founded: 2015
• Headquarters: San Francisco, CA

💼 BUSINESS ANALYSIS
• Core Business: Warehouse robots
  - Total Raised: $120M
• Revenue: $40M

👥 KEY PEOPLE
• Jane Doe, CEO
• John Roe, CTO

📈 RECENT DEVELOPMENTS
• Latest News: Series C announced

🌎 Links:
• Official Website [https://acme.example]
• Blog (https://acme.example/blog)

⭐ HIGHLIGHTS
• Strengths: Fast deployment
";

pub const SOURCES_JSON: &str = r#"```json
{"sources": [{"title": "Acme", "url": "https://acme.example"}, {"title": "Acme on News", "url": "https://news.example/acme"}]}
```"#;

pub async fn memory_store() -> Arc<dyn ResearchStore> {
    Arc::new(
        TursoClient::new_memory()
            .await
            .expect("in-memory store should open"),
    )
}

/// Registry holding only `client`, under `kind`
pub fn registry_with(kind: ModelKind, client: Arc<dyn LLMClient>) -> Arc<ProviderRegistry> {
    let mut registry = ProviderRegistry::new();
    registry.register(kind, client);
    Arc::new(registry)
}

/// Normalizer that never enriches queries
pub fn offline_normalizer() -> Arc<InputNormalizer> {
    let config = ResearchConfig {
        general_information: false,
        search_enrichment: false,
        fetch_timeout_secs: 5,
        ..ResearchConfig::default()
    };
    Arc::new(InputNormalizer::new(&config).expect("normalizer should build"))
}

/// Normalizer that enriches queries from `search_url` only
pub fn normalizer_with_search(search_url: &str) -> Arc<InputNormalizer> {
    let config = ResearchConfig {
        general_information: false,
        search_enrichment: true,
        search_url: search_url.to_string(),
        fetch_timeout_secs: 5,
        ..ResearchConfig::default()
    };
    Arc::new(InputNormalizer::new(&config).expect("normalizer should build"))
}

/// Normalizer that adds the provider briefing and news from `search_url`
pub fn enriching_normalizer(search_url: &str) -> Arc<InputNormalizer> {
    let config = ResearchConfig {
        general_information: true,
        search_enrichment: true,
        search_url: search_url.to_string(),
        fetch_timeout_secs: 5,
        ..ResearchConfig::default()
    };
    Arc::new(InputNormalizer::new(&config).expect("normalizer should build"))
}

/// A conversation with one user message
pub async fn seed_query(
    store: &Arc<dyn ResearchStore>,
    content: &str,
    model: ModelKind,
) -> Message {
    let conversation = store
        .create_conversation(content, ConversationStatus::Active)
        .await
        .expect("conversation should be created");
    store
        .add_message(NewMessage::user(&conversation.id, content, model))
        .await
        .expect("message should be stored")
}

/// Assistant messages of a conversation
pub async fn assistant_messages(
    store: &Arc<dyn ResearchStore>,
    conversation_id: &str,
) -> Vec<Message> {
    store
        .list_messages(conversation_id)
        .await
        .expect("messages should list")
        .into_iter()
        .filter(|m| m.role == scout::types::MessageRole::Assistant)
        .collect()
}
