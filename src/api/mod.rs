//! HTTP API Handlers and Routes
//!
//! The REST layer of the research server, built on axum.
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each endpoint
//! - [`api::routes`](crate::api::routes) - Route definitions and router configuration
//!
//! # API Endpoints
//!
//! ## Conversations (`/api/conversations`)
//! - `POST /api/conversations` - Create a conversation
//! - `GET /api/conversations` - List conversations, newest first
//! - `POST /api/conversations/{id}/cancel` - Cancel a conversation's research
//! - `GET /api/conversations/{id}/messages` - Messages, oldest first
//!
//! ## Research
//! - `POST /api/messages` - Submit a query; research runs in the background
//! - `POST /api/research/stream` - Stream a reply as text deltas
//!
//! ## History (`/api/research-results`)
//! - `GET /api/research-results` - All results
//! - `GET /api/research-results/summaries` - Ten most recent, condensed
//! - `POST /api/research-results/{id}/toggle` - Flip the expanded state
//! - `PUT /api/research-results/{id}/notes` - Replace notes
//! - `DELETE /api/research-results/{id}` - Delete a result
//!
//! ## System
//! - `GET /api/health` - Health check
//! - `POST /api/migrations/run` - Backfill legacy records
//! - `GET /api/openapi.json` - This API as an OpenAPI document

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;

use crate::types::{
    Conversation, ConversationStatus, CreateConversationRequest, CreateConversationResponse,
    Message, MessageMetadata, MessageRole, MigrationReport, ModelKind, ResearchLink,
    ResearchResult, ResearchSummary, Source, StreamResearchRequest, SubmitQueryRequest,
    SubmitQueryResponse, UpdateNotesRequest,
};
use handlers::{conversations, messages, research, research_results, system};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(title = "Scout API", description = "Company research server"),
    paths(
        system::health,
        system::run_migrations,
        conversations::create_conversation,
        conversations::list_conversations,
        conversations::cancel_conversation,
        conversations::list_messages,
        messages::submit_query,
        research::stream_research,
        research_results::list_results,
        research_results::list_summaries,
        research_results::toggle_result,
        research_results::update_notes,
        research_results::delete_result,
    ),
    components(schemas(
        Conversation,
        ConversationStatus,
        CreateConversationRequest,
        CreateConversationResponse,
        Message,
        MessageMetadata,
        MessageRole,
        MigrationReport,
        ModelKind,
        ResearchLink,
        ResearchResult,
        ResearchSummary,
        Source,
        StreamResearchRequest,
        SubmitQueryRequest,
        SubmitQueryResponse,
        UpdateNotesRequest,
        research_results::ToggleResponse,
        system::HealthResponse,
    )),
    tags(
        (name = "conversations", description = "Conversations and their messages"),
        (name = "messages", description = "Query submission"),
        (name = "research", description = "Streaming research"),
        (name = "research-results", description = "Research history"),
        (name = "system", description = "Health and maintenance"),
    )
)]
pub struct ApiDoc;
