//! Conversation handlers.

use crate::{
    types::{
        AppError, Conversation, ConversationStatus, CreateConversationRequest,
        CreateConversationResponse, Message, Result,
    },
    AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

/// Create an empty conversation.
#[utoipa::path(
    post,
    path = "/api/conversations",
    request_body = CreateConversationRequest,
    responses(
        (status = 201, description = "Conversation created", body = CreateConversationResponse),
        (status = 400, description = "Invalid input")
    ),
    tag = "conversations"
)]
pub async fn create_conversation(
    State(state): State<AppState>,
    Json(payload): Json<CreateConversationRequest>,
) -> Result<(StatusCode, Json<CreateConversationResponse>)> {
    let title = payload.title.trim();
    if title.is_empty() {
        return Err(AppError::InvalidInput("title must not be empty".to_string()));
    }

    let status = payload.status.unwrap_or(ConversationStatus::Active);
    let conversation = state.store.create_conversation(title, status).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateConversationResponse {
            conversation_id: conversation.id,
        }),
    ))
}

/// List conversations, newest first.
#[utoipa::path(
    get,
    path = "/api/conversations",
    responses(
        (status = 200, description = "All conversations", body = Vec<Conversation>)
    ),
    tag = "conversations"
)]
pub async fn list_conversations(State(state): State<AppState>) -> Result<Json<Vec<Conversation>>> {
    Ok(Json(state.store.list_conversations().await?))
}

/// Mark a conversation cancelled. Running jobs stop at their next checkpoint.
#[utoipa::path(
    post,
    path = "/api/conversations/{id}/cancel",
    params(
        ("id" = String, Path, description = "Conversation ID")
    ),
    responses(
        (status = 204, description = "Conversation cancelled"),
        (status = 404, description = "Conversation not found")
    ),
    tag = "conversations"
)]
pub async fn cancel_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.store.cancel_conversation(&id).await?;
    tracing::info!(conversation_id = %id, "Conversation cancelled");
    Ok(StatusCode::NO_CONTENT)
}

/// Messages of a conversation, oldest first.
#[utoipa::path(
    get,
    path = "/api/conversations/{id}/messages",
    params(
        ("id" = String, Path, description = "Conversation ID")
    ),
    responses(
        (status = 200, description = "Conversation messages", body = Vec<Message>),
        (status = 404, description = "Conversation not found")
    ),
    tag = "conversations"
)]
pub async fn list_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Message>>> {
    if state.store.get_conversation(&id).await?.is_none() {
        return Err(AppError::NotFound("Conversation".to_string()));
    }

    Ok(Json(state.store.list_messages(&id).await?))
}
