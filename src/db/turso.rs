use crate::db::traits::{NewMessage, ResearchStore};
use crate::types::{
    AppError, CompanyResearch, Conversation, ConversationStatus, Message, MessageMetadata,
    MessageRole, MigrationReport, ModelKind, NewResearchResult, ResearchResult, ResearchSummary,
    Result, Source,
};
use async_trait::async_trait;
use chrono::Utc;
use libsql::{Builder, Connection, Database};
use tracing::{info, warn};

/// libsql-backed store (local file or in-memory)
///
/// Holds one connection for the lifetime of the client; every `connect()`
/// on an in-memory database would open a fresh, empty database.
pub struct TursoClient {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

fn db_error(context: &'static str) -> impl Fn(libsql::Error) -> AppError {
    move |e| AppError::Database(format!("{}: {}", context, e))
}

fn row_error(e: libsql::Error) -> AppError {
    AppError::Database(e.to_string())
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn parse_model(value: Option<String>) -> ModelKind {
    value
        .and_then(|m| m.parse::<ModelKind>().ok())
        .unwrap_or_default()
}

fn parse_metadata(value: Option<String>) -> Option<MessageMetadata> {
    let raw = value?;
    match serde_json::from_str::<MessageMetadata>(&raw) {
        Ok(metadata) => Some(metadata),
        Err(e) => {
            warn!(error = %e, "Ignoring unreadable message metadata");
            None
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| AppError::Internal(format!("JSON encode: {}", e)))
}

fn from_json<T: serde::de::DeserializeOwned>(raw: &str, column: &str) -> Result<T> {
    serde_json::from_str(raw)
        .map_err(|e| AppError::Database(format!("Invalid JSON in column {}: {}", column, e)))
}

const CONVERSATION_COLUMNS: &str = "id, title, status, created_at, updated_at, is_cancelled";
const MESSAGE_COLUMNS: &str = "id, conversation_id, content, role, created_at, model, metadata";
const RESULT_COLUMNS: &str = "id, company_name, business_analysis, key_people, recent_developments, \
     links, highlights, notes, is_open, created_at, industry, funding, confidence";

fn row_to_conversation(row: &libsql::Row) -> Result<Conversation> {
    let created_at: i64 = row.get(3).map_err(row_error)?;
    Ok(Conversation {
        id: row.get(0).map_err(row_error)?,
        title: row.get(1).map_err(row_error)?,
        status: ConversationStatus::parse(&row.get::<String>(2).map_err(row_error)?),
        created_at,
        updated_at: row
            .get::<Option<i64>>(4)
            .map_err(row_error)?
            .unwrap_or(created_at),
        is_cancelled: row.get::<Option<i64>>(5).map_err(row_error)?.unwrap_or(0) != 0,
    })
}

fn row_to_message(row: &libsql::Row) -> Result<Message> {
    Ok(Message {
        id: row.get(0).map_err(row_error)?,
        conversation_id: row.get(1).map_err(row_error)?,
        content: row.get(2).map_err(row_error)?,
        role: MessageRole::parse(&row.get::<String>(3).map_err(row_error)?),
        created_at: row.get(4).map_err(row_error)?,
        model: parse_model(row.get::<Option<String>>(5).map_err(row_error)?),
        metadata: parse_metadata(row.get::<Option<String>>(6).map_err(row_error)?),
    })
}

fn row_to_result(row: &libsql::Row) -> Result<ResearchResult> {
    Ok(ResearchResult {
        id: row.get(0).map_err(row_error)?,
        company_name: row.get(1).map_err(row_error)?,
        business_analysis: row.get(2).map_err(row_error)?,
        key_people: from_json(&row.get::<String>(3).map_err(row_error)?, "key_people")?,
        recent_developments: row.get(4).map_err(row_error)?,
        links: from_json(&row.get::<String>(5).map_err(row_error)?, "links")?,
        highlights: row.get(6).map_err(row_error)?,
        notes: row.get::<Option<String>>(7).map_err(row_error)?,
        is_open: row.get::<i64>(8).map_err(row_error)? != 0,
        created_at: row.get(9).map_err(row_error)?,
        industry: row.get::<Option<String>>(10).map_err(row_error)?,
        funding: row.get::<Option<String>>(11).map_err(row_error)?,
        confidence: row.get::<Option<f64>>(12).map_err(row_error)?,
    })
}

impl TursoClient {
    /// Open an ephemeral in-memory database
    pub async fn new_memory() -> Result<Self> {
        Self::open(":memory:").await
    }

    /// Open (or create) a database file, creating parent directories
    pub async fn new_local(path: &str) -> Result<Self> {
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::Database(format!("Failed to create {}: {}", parent.display(), e))
                })?;
            }
        }
        Self::open(path).await
    }

    async fn open(path: &str) -> Result<Self> {
        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(db_error("Failed to open database"))?;
        let conn = db.connect().map_err(db_error("Failed to get connection"))?;

        let client = Self { db, conn };
        client.initialize_schema().await?;

        Ok(client)
    }

    pub fn connection(&self) -> Connection {
        self.conn.clone()
    }

    async fn initialize_schema(&self) -> Result<()> {
        let conn = &self.conn;

        // Nullable legacy columns are backfilled by run_migrations
        conn.execute(
            "CREATE TABLE IF NOT EXISTS conversations (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'active',
                created_at INTEGER NOT NULL,
                updated_at INTEGER,
                is_cancelled INTEGER DEFAULT 0
            )",
            (),
        )
        .await
        .map_err(db_error("Failed to create conversations table"))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                conversation_id TEXT NOT NULL,
                content TEXT NOT NULL,
                role TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                model TEXT,
                metadata TEXT,
                FOREIGN KEY (conversation_id) REFERENCES conversations(id)
            )",
            (),
        )
        .await
        .map_err(db_error("Failed to create messages table"))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS research_results (
                id TEXT PRIMARY KEY,
                company_name TEXT NOT NULL,
                business_analysis TEXT NOT NULL,
                key_people TEXT NOT NULL,
                recent_developments TEXT NOT NULL,
                links TEXT NOT NULL,
                highlights TEXT NOT NULL,
                notes TEXT,
                is_open INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                industry TEXT,
                funding TEXT,
                confidence REAL
            )",
            (),
        )
        .await
        .map_err(db_error("Failed to create research_results table"))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS company_research (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                content TEXT NOT NULL,
                embedding TEXT NOT NULL,
                last_updated INTEGER NOT NULL,
                metadata TEXT
            )",
            (),
        )
        .await
        .map_err(db_error("Failed to create company_research table"))?;

        for index in [
            "CREATE INDEX IF NOT EXISTS idx_conversations_created ON conversations(created_at)",
            "CREATE INDEX IF NOT EXISTS idx_messages_conversation ON messages(conversation_id, created_at)",
            "CREATE INDEX IF NOT EXISTS idx_results_created ON research_results(created_at)",
            "CREATE INDEX IF NOT EXISTS idx_results_company ON research_results(company_name)",
            "CREATE INDEX IF NOT EXISTS idx_company_research_name ON company_research(name)",
        ] {
            conn.execute(index, ())
                .await
                .map_err(db_error("Failed to create index"))?;
        }

        Ok(())
    }

    async fn backfill_conversations(&self) -> Result<u64> {
        self.conn
            .execute(
                "UPDATE conversations
                 SET is_cancelled = COALESCE(is_cancelled, 0),
                     updated_at = COALESCE(updated_at, created_at)
                 WHERE is_cancelled IS NULL OR updated_at IS NULL",
                (),
            )
            .await
            .map_err(db_error("Failed to backfill conversations"))
    }

    async fn backfill_models(&self) -> Result<u64> {
        self.conn
            .execute(
                "UPDATE messages SET model = 'gpt4'
                 WHERE model IS NULL OR model NOT IN ('gpt4', 'claude', 'mistral', 'grok')",
                (),
            )
            .await
            .map_err(db_error("Failed to backfill message models"))
    }

    /// Rewrite stored source lists so every entry carries exactly `title` and `url`
    async fn clean_source_metadata(&self) -> Result<u64> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, metadata FROM messages WHERE metadata IS NOT NULL",
                (),
            )
            .await
            .map_err(db_error("Failed to query message metadata"))?;

        let mut pending = Vec::new();
        while let Some(row) = rows.next().await.map_err(row_error)? {
            let id: String = row.get(0).map_err(row_error)?;
            let raw: String = row.get(1).map_err(row_error)?;
            pending.push((id, raw));
        }

        let mut cleaned = 0;
        for (id, raw) in pending {
            let value: serde_json::Value = match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(_) => {
                    self.conn
                        .execute("UPDATE messages SET metadata = NULL WHERE id = ?", [id.as_str()])
                        .await
                        .map_err(db_error("Failed to clear message metadata"))?;
                    cleaned += 1;
                    continue;
                }
            };

            let Some(sources) = value.get("sources").and_then(|s| s.as_array()) else {
                continue;
            };
            let field = |source: &serde_json::Value, key: &str| {
                source
                    .get(key)
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string()
            };
            let metadata = MessageMetadata {
                sources: sources
                    .iter()
                    .map(|source| Source {
                        title: field(source, "title"),
                        url: field(source, "url"),
                    })
                    .collect(),
            };
            let cleaned_json = to_json(&metadata)?;
            let reparsed = serde_json::from_str::<serde_json::Value>(&cleaned_json).ok();
            if reparsed.as_ref() == Some(&value) {
                continue;
            }

            self.conn
                .execute(
                    "UPDATE messages SET metadata = ? WHERE id = ?",
                    libsql::params![cleaned_json, id.as_str()],
                )
                .await
                .map_err(db_error("Failed to rewrite message metadata"))?;
            cleaned += 1;
        }

        Ok(cleaned)
    }
}

#[async_trait]
impl ResearchStore for TursoClient {
    async fn create_conversation(
        &self,
        title: &str,
        status: ConversationStatus,
    ) -> Result<Conversation> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = now_millis();

        self.conn
            .execute(
                "INSERT INTO conversations (id, title, status, created_at, updated_at, is_cancelled)
                 VALUES (?, ?, ?, ?, ?, 0)",
                libsql::params![id.as_str(), title, status.as_str(), now, now],
            )
            .await
            .map_err(db_error("Failed to create conversation"))?;

        Ok(Conversation {
            id,
            title: title.to_string(),
            status,
            created_at: now,
            updated_at: now,
            is_cancelled: false,
        })
    }

    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>> {
        let sql = format!("SELECT {} FROM conversations WHERE id = ?", CONVERSATION_COLUMNS);
        let mut rows = self
            .conn
            .query(&sql, [id])
            .await
            .map_err(db_error("Failed to query conversation"))?;

        match rows.next().await.map_err(row_error)? {
            Some(row) => Ok(Some(row_to_conversation(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_conversations(&self) -> Result<Vec<Conversation>> {
        let sql = format!(
            "SELECT {} FROM conversations ORDER BY created_at DESC, rowid DESC",
            CONVERSATION_COLUMNS
        );
        let mut rows = self
            .conn
            .query(&sql, ())
            .await
            .map_err(db_error("Failed to list conversations"))?;

        let mut conversations = Vec::new();
        while let Some(row) = rows.next().await.map_err(row_error)? {
            conversations.push(row_to_conversation(&row)?);
        }
        Ok(conversations)
    }

    async fn cancel_conversation(&self, id: &str) -> Result<()> {
        let changed = self
            .conn
            .execute("UPDATE conversations SET is_cancelled = 1 WHERE id = ?", [id])
            .await
            .map_err(db_error("Failed to cancel conversation"))?;

        if changed == 0 {
            return Err(AppError::NotFound("Conversation".to_string()));
        }
        info!(conversation_id = %id, "Conversation cancelled");
        Ok(())
    }

    async fn is_cancelled(&self, conversation_id: &str) -> Result<bool> {
        self.get_conversation(conversation_id)
            .await?
            .map(|c| c.is_cancelled)
            .ok_or_else(|| AppError::NotFound("Conversation".to_string()))
    }

    async fn add_message(&self, message: NewMessage) -> Result<Message> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = now_millis();
        let metadata = message.metadata.as_ref().map(to_json).transpose()?;

        self.conn
            .execute(
                "INSERT INTO messages (id, conversation_id, content, role, created_at, model, metadata)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                libsql::params![
                    id.as_str(),
                    message.conversation_id.as_str(),
                    message.content.as_str(),
                    message.role.as_str(),
                    now,
                    message.model.as_str(),
                    metadata
                ],
            )
            .await
            .map_err(db_error("Failed to add message"))?;

        self.conn
            .execute(
                "UPDATE conversations SET updated_at = ? WHERE id = ?",
                libsql::params![now, message.conversation_id.as_str()],
            )
            .await
            .map_err(db_error("Failed to touch conversation"))?;

        Ok(Message {
            id,
            conversation_id: message.conversation_id,
            content: message.content,
            role: message.role,
            created_at: now,
            model: message.model,
            metadata: message.metadata,
        })
    }

    async fn get_message(&self, id: &str) -> Result<Option<Message>> {
        let sql = format!("SELECT {} FROM messages WHERE id = ?", MESSAGE_COLUMNS);
        let mut rows = self
            .conn
            .query(&sql, [id])
            .await
            .map_err(db_error("Failed to query message"))?;

        match rows.next().await.map_err(row_error)? {
            Some(row) => Ok(Some(row_to_message(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>> {
        let sql = format!(
            "SELECT {} FROM messages WHERE conversation_id = ? ORDER BY created_at ASC, rowid ASC",
            MESSAGE_COLUMNS
        );
        let mut rows = self
            .conn
            .query(&sql, [conversation_id])
            .await
            .map_err(db_error("Failed to query messages"))?;

        let mut messages = Vec::new();
        while let Some(row) = rows.next().await.map_err(row_error)? {
            messages.push(row_to_message(&row)?);
        }
        Ok(messages)
    }

    async fn update_message(
        &self,
        id: &str,
        content: &str,
        metadata: Option<&MessageMetadata>,
    ) -> Result<()> {
        let changed = match metadata {
            Some(metadata) => self
                .conn
                .execute(
                    "UPDATE messages SET content = ?, metadata = ? WHERE id = ?",
                    libsql::params![content, to_json(metadata)?, id],
                )
                .await,
            None => {
                self.conn
                    .execute(
                        "UPDATE messages SET content = ? WHERE id = ?",
                        libsql::params![content, id],
                    )
                    .await
            }
        }
        .map_err(db_error("Failed to update message"))?;

        if changed == 0 {
            return Err(AppError::NotFound("Message".to_string()));
        }
        Ok(())
    }

    async fn create_research_result(&self, result: NewResearchResult) -> Result<ResearchResult> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = now_millis();

        self.conn
            .execute(
                "INSERT INTO research_results (id, company_name, business_analysis, key_people,
                    recent_developments, links, highlights, notes, is_open, created_at,
                    industry, funding, confidence)
                 VALUES (?, ?, ?, ?, ?, ?, ?, NULL, 0, ?, ?, ?, NULL)",
                libsql::params![
                    id.as_str(),
                    result.company_name.as_str(),
                    result.business_analysis.as_str(),
                    to_json(&result.key_people)?,
                    result.recent_developments.as_str(),
                    to_json(&result.links)?,
                    result.highlights.as_str(),
                    now,
                    result.industry.as_deref(),
                    result.funding.as_deref()
                ],
            )
            .await
            .map_err(db_error("Failed to create research result"))?;

        Ok(ResearchResult {
            id,
            company_name: result.company_name,
            business_analysis: result.business_analysis,
            key_people: result.key_people,
            recent_developments: result.recent_developments,
            links: result.links,
            highlights: result.highlights,
            notes: None,
            is_open: false,
            created_at: now,
            industry: result.industry,
            funding: result.funding,
            confidence: None,
        })
    }

    async fn list_research_results(&self) -> Result<Vec<ResearchResult>> {
        let sql = format!(
            "SELECT {} FROM research_results ORDER BY created_at DESC, rowid DESC",
            RESULT_COLUMNS
        );
        let mut rows = self
            .conn
            .query(&sql, ())
            .await
            .map_err(db_error("Failed to list research results"))?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(row_error)? {
            results.push(row_to_result(&row)?);
        }
        Ok(results)
    }

    async fn research_summaries(&self, limit: usize) -> Result<Vec<ResearchSummary>> {
        let sql = format!(
            "SELECT {} FROM research_results ORDER BY created_at DESC, rowid DESC LIMIT ?",
            RESULT_COLUMNS
        );
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut rows = self
            .conn
            .query(&sql, [limit])
            .await
            .map_err(db_error("Failed to query research summaries"))?;

        let mut summaries = Vec::new();
        while let Some(row) = rows.next().await.map_err(row_error)? {
            summaries.push(ResearchSummary::from(row_to_result(&row)?));
        }
        Ok(summaries)
    }

    async fn toggle_research_result(&self, id: &str) -> Result<bool> {
        // Flipped in one statement so concurrent toggles never cancel out
        let mut rows = self
            .conn
            .query(
                "UPDATE research_results SET is_open = 1 - is_open WHERE id = ? RETURNING is_open",
                [id],
            )
            .await
            .map_err(db_error("Failed to toggle research result"))?;

        let row = rows
            .next()
            .await
            .map_err(row_error)?
            .ok_or_else(|| AppError::NotFound("Research result".to_string()))?;
        let is_open: i64 = row.get(0).map_err(row_error)?;
        Ok(is_open != 0)
    }

    async fn update_research_notes(&self, id: &str, notes: &str) -> Result<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE research_results SET notes = ? WHERE id = ?",
                libsql::params![notes, id],
            )
            .await
            .map_err(db_error("Failed to update notes"))?;

        if changed == 0 {
            return Err(AppError::NotFound("Research result".to_string()));
        }
        Ok(())
    }

    async fn delete_research_result(&self, id: &str) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM research_results WHERE id = ?", [id])
            .await
            .map_err(db_error("Failed to delete research result"))?;

        if changed == 0 {
            return Err(AppError::NotFound("Research result".to_string()));
        }
        Ok(())
    }

    async fn store_company_research(&self, research: CompanyResearch) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let metadata = research.metadata.as_ref().map(to_json).transpose()?;

        self.conn
            .execute(
                "INSERT INTO company_research (id, name, content, embedding, last_updated, metadata)
                 VALUES (?, ?, ?, ?, ?, ?)",
                libsql::params![
                    id.as_str(),
                    research.name.as_str(),
                    research.content.as_str(),
                    to_json(&research.embedding)?,
                    now_millis(),
                    metadata
                ],
            )
            .await
            .map_err(db_error("Failed to store company research"))?;

        Ok(id)
    }

    async fn company_research_count(&self) -> Result<usize> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM company_research", ())
            .await
            .map_err(db_error("Failed to count company research"))?;

        let count = match rows.next().await.map_err(row_error)? {
            Some(row) => row.get::<i64>(0).map_err(row_error)?,
            None => 0,
        };
        Ok(usize::try_from(count).unwrap_or_default())
    }

    async fn run_migrations(&self) -> Result<MigrationReport> {
        let conversations = self.backfill_conversations().await?;
        let models = self.backfill_models().await?;
        let messages = self.clean_source_metadata().await?;

        let message = if conversations + models + messages == 0 {
            "No records needed migration".to_string()
        } else {
            format!(
                "Successfully migrated {} conversation(s), backfilled {} message model(s) and cleaned up {} message(s)",
                conversations, models, messages
            )
        };
        info!(conversations, models, messages, "Migrations complete");

        Ok(MigrationReport {
            success: true,
            message,
        })
    }
}
