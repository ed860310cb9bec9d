use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

// ============= Provider Selection =============

/// The four research backends a query can be dispatched to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// OpenAI GPT-4
    #[default]
    Gpt4,
    /// Anthropic Claude
    Claude,
    /// Mistral Large
    Mistral,
    /// xAI Grok
    Grok,
}

impl ModelKind {
    /// All provider variants, in display order.
    pub const ALL: [ModelKind; 4] = [
        ModelKind::Gpt4,
        ModelKind::Claude,
        ModelKind::Mistral,
        ModelKind::Grok,
    ];

    /// Wire name used in the store and the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Gpt4 => "gpt4",
            ModelKind::Claude => "claude",
            ModelKind::Mistral => "mistral",
            ModelKind::Grok => "grok",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "gpt4" => Ok(ModelKind::Gpt4),
            "claude" => Ok(ModelKind::Claude),
            "mistral" => Ok(ModelKind::Mistral),
            "grok" => Ok(ModelKind::Grok),
            other => Err(AppError::InvalidInput(format!("Unknown model '{}'", other))),
        }
    }
}

// ============= Conversation Types =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ConversationStatus {
    Active,
    Completed,
}

impl ConversationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationStatus::Active => "active",
            ConversationStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "completed" => ConversationStatus::Completed,
            _ => ConversationStatus::Active,
        }
    }
}

/// A chat session. `is_cancelled` only ever moves from `false` to `true`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub status: ConversationStatus,
    pub created_at: i64,
    pub updated_at: i64,
    pub is_cancelled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "assistant" => MessageRole::Assistant,
            _ => MessageRole::User,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Source {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MessageMetadata {
    pub sources: Vec<Source>,
}

/// One turn of a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub content: String,
    pub role: MessageRole,
    pub created_at: i64,
    pub model: ModelKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

// ============= Research Types =============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ResearchLink {
    pub title: String,
    pub url: String,
}

/// A completed research run, split into report sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResearchResult {
    pub id: String,
    pub company_name: String,
    pub business_analysis: String,
    pub key_people: Vec<String>,
    pub recent_developments: String,
    pub links: Vec<ResearchLink>,
    pub highlights: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub is_open: bool,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub funding: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Fields supplied when the orchestrator records a research run.
#[derive(Debug, Clone, Default)]
pub struct NewResearchResult {
    pub company_name: String,
    pub business_analysis: String,
    pub key_people: Vec<String>,
    pub recent_developments: String,
    pub links: Vec<ResearchLink>,
    pub highlights: String,
    pub industry: Option<String>,
    pub funding: Option<String>,
}

/// Compact row for the history table.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResearchSummary {
    pub id: String,
    pub company_name: String,
    pub industry: Option<String>,
    pub key_people: Vec<String>,
    pub funding: Option<String>,
    pub confidence: Option<f64>,
}

impl From<ResearchResult> for ResearchSummary {
    fn from(r: ResearchResult) -> Self {
        Self {
            id: r.id,
            company_name: r.company_name,
            industry: r.industry,
            key_people: r.key_people,
            funding: r.funding,
            confidence: r.confidence,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub founded: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headquarters: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employees: Option<String>,
}

/// Embedding cache entry, appended after each successful run.
#[derive(Debug, Clone)]
pub struct CompanyResearch {
    pub name: String,
    pub content: String,
    pub embedding: Vec<f32>,
    pub metadata: Option<CompanyMetadata>,
}

// ============= API Request/Response Types =============

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationRequest {
    pub title: String,
    #[serde(default)]
    pub status: Option<ConversationStatus>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationResponse {
    pub conversation_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitQueryRequest {
    #[serde(default)]
    pub conversation_id: Option<String>,
    pub content: String,
    #[serde(default)]
    pub model: ModelKind,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitQueryResponse {
    pub conversation_id: String,
    pub message_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StreamResearchRequest {
    pub message_id: String,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateNotesRequest {
    pub notes: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MigrationReport {
    pub success: bool,
    pub message: String,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("{provider} API error: {message}")]
    Provider { provider: String, message: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No research content generated")]
    NoContentGenerated,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Shorthand for a provider failure.
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let status = match &self {
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Provider { .. } => StatusCode::BAD_GATEWAY,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NoContentGenerated => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({
            "error": self.to_string()
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
