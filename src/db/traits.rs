//! Store abstraction for conversations, messages and research results
//!
//! The research pipeline and the HTTP handlers only ever see
//! [`ResearchStore`]; the libsql implementation lives in
//! [`super::turso`].
//!
//! # Example
//!
//! ```rust,ignore
//! use scout::db::DatabaseProvider;
//!
//! // In-memory database (tests, throwaway runs)
//! let store = DatabaseProvider::Memory.create_client().await?;
//!
//! // File-based database
//! let store = DatabaseProvider::SQLite { path: "data/scout.db".into() }
//!     .create_client()
//!     .await?;
//! ```

use crate::types::{
    CompanyResearch, Conversation, ConversationStatus, Message, MessageMetadata, MessageRole,
    MigrationReport, ModelKind, NewResearchResult, ResearchResult, ResearchSummary, Result,
};
use crate::utils::toml_config::DatabaseConfig;
use async_trait::async_trait;
use std::sync::Arc;

/// Database provider configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DatabaseProvider {
    /// In-memory database (ephemeral, lost on restart)
    #[default]
    Memory,
    /// File-based database
    SQLite {
        /// Path to the database file
        path: String,
    },
}

impl DatabaseProvider {
    /// Pick the provider for the `[database]` section
    pub fn from_config(config: &DatabaseConfig) -> Self {
        let url = config.url.trim();
        if url.is_empty() || url == ":memory:" {
            DatabaseProvider::Memory
        } else {
            DatabaseProvider::SQLite {
                path: url.to_string(),
            }
        }
    }

    /// Open the store and make sure the schema exists
    pub async fn create_client(&self) -> Result<Arc<dyn ResearchStore>> {
        match self {
            DatabaseProvider::Memory => {
                let client = super::turso::TursoClient::new_memory().await?;
                Ok(Arc::new(client))
            }
            DatabaseProvider::SQLite { path } => {
                let client = super::turso::TursoClient::new_local(path).await?;
                Ok(Arc::new(client))
            }
        }
    }
}

/// Fields for a message about to be appended
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub conversation_id: String,
    pub content: String,
    pub role: MessageRole,
    pub model: ModelKind,
    pub metadata: Option<MessageMetadata>,
}

impl NewMessage {
    pub fn user(conversation_id: &str, content: &str, model: ModelKind) -> Self {
        Self {
            conversation_id: conversation_id.to_string(),
            content: content.to_string(),
            role: MessageRole::User,
            model,
            metadata: None,
        }
    }

    pub fn assistant(conversation_id: &str, content: &str, model: ModelKind) -> Self {
        Self {
            conversation_id: conversation_id.to_string(),
            content: content.to_string(),
            role: MessageRole::Assistant,
            model,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: MessageMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Abstract trait for store operations
///
/// Every write is acknowledged before the call returns, so a caller that
/// awaits each operation observes its own writes in issue order.
#[async_trait]
pub trait ResearchStore: Send + Sync {
    // ============== Conversation Operations ==============

    /// Create a conversation; `is_cancelled` starts false
    async fn create_conversation(
        &self,
        title: &str,
        status: ConversationStatus,
    ) -> Result<Conversation>;

    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>>;

    /// All conversations, newest first
    async fn list_conversations(&self) -> Result<Vec<Conversation>>;

    /// Set the cancellation flag. Idempotent; `NotFound` if the conversation
    /// does not exist.
    async fn cancel_conversation(&self, id: &str) -> Result<()>;

    /// Current value of the persisted cancellation flag
    async fn is_cancelled(&self, conversation_id: &str) -> Result<bool>;

    // ============== Message Operations ==============

    async fn add_message(&self, message: NewMessage) -> Result<Message>;

    async fn get_message(&self, id: &str) -> Result<Option<Message>>;

    /// Messages of one conversation in creation order
    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>>;

    /// Overwrite the content (and optionally metadata) of a message
    async fn update_message(
        &self,
        id: &str,
        content: &str,
        metadata: Option<&MessageMetadata>,
    ) -> Result<()>;

    // ============== Research Result Operations ==============

    async fn create_research_result(&self, result: NewResearchResult) -> Result<ResearchResult>;

    /// All results, newest first
    async fn list_research_results(&self) -> Result<Vec<ResearchResult>>;

    /// Compact rows for the history table, newest first
    async fn research_summaries(&self, limit: usize) -> Result<Vec<ResearchSummary>>;

    /// Flip `is_open`, returning the new value
    async fn toggle_research_result(&self, id: &str) -> Result<bool>;

    /// Replace the notes of a result (last write wins)
    async fn update_research_notes(&self, id: &str, notes: &str) -> Result<()>;

    async fn delete_research_result(&self, id: &str) -> Result<()>;

    // ============== Company Research Cache ==============

    /// Append an embedding cache entry, returning its id
    async fn store_company_research(&self, research: CompanyResearch) -> Result<String>;

    async fn company_research_count(&self) -> Result<usize>;

    // ============== Maintenance ==============

    /// Backfill legacy rows: cancellation flags, update timestamps, message
    /// models, and source metadata reduced to `{title, url}`
    async fn run_migrations(&self) -> Result<MigrationReport>;
}
