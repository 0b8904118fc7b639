//! Axum route handlers for the Chat API.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::applications;
use crate::chat::conversation::{build_turns, parse_messages, validate_content, ChatMessage};
use crate::chat::prompts::build_system_prompt;
use crate::chat::{load_owned, normalize_title, store};
use crate::envelope::ApiResponse;
use crate::errors::AppError;
use crate::llm_client::{LlmError, Role};
use crate::models::chat::ChatConversationRow;
use crate::routes::UserIdQuery;
use crate::state::AppState;
use crate::users;

#[derive(Debug, Deserialize)]
pub struct CreateConversationRequest {
    pub user_id: Uuid,
    pub application_id: Option<Uuid>,
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub user_id: Uuid,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ConversationDetail {
    pub conversation: ChatConversationRow,
    pub message_count: usize,
}

/// POST /api/v1/chat/conversations
pub async fn handle_create_conversation(
    State(state): State<AppState>,
    Json(request): Json<CreateConversationRequest>,
) -> Result<ApiResponse<ChatConversationRow>, AppError> {
    let title = normalize_title(request.title.as_deref())?;
    users::store::find_user(&state.db, request.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", request.user_id)))?;
    if let Some(application_id) = request.application_id {
        applications::load_owned(&state.db, application_id, request.user_id).await?;
    }

    let row =
        store::insert_conversation(&state.db, request.user_id, request.application_id, &title)
            .await?;
    info!("Created conversation {} for user {}", row.id, row.user_id);
    Ok(ApiResponse::created(row))
}

/// GET /api/v1/chat/conversations?user_id=
pub async fn handle_list_conversations(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<ApiResponse<Vec<ChatConversationRow>>, AppError> {
    let rows = store::list_for_user(&state.db, params.user_id).await?;
    Ok(ApiResponse::ok(rows))
}

/// GET /api/v1/chat/conversations/:id?user_id=
pub async fn handle_get_conversation(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<ApiResponse<ConversationDetail>, AppError> {
    let conversation = load_owned(&state.db, conversation_id, params.user_id).await?;
    let message_count = parse_messages(&conversation.messages)?.len();
    Ok(ApiResponse::ok(ConversationDetail {
        conversation,
        message_count,
    }))
}

/// DELETE /api/v1/chat/conversations/:id?user_id=
pub async fn handle_delete_conversation(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<ApiResponse<()>, AppError> {
    load_owned(&state.db, conversation_id, params.user_id).await?;
    store::delete_conversation(&state.db, conversation_id).await?;
    info!("Deleted conversation {conversation_id}");
    Ok(ApiResponse::ok(()).with_message("Conversation deleted"))
}

/// POST /api/v1/chat/conversations/:id/messages
///
/// Sends the message with recent history to the model and stores both sides.
/// Nothing is persisted if the model call fails.
pub async fn handle_send_message(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    Json(request): Json<SendMessageRequest>,
) -> Result<ApiResponse<ChatMessage>, AppError> {
    let conversation = load_owned(&state.db, conversation_id, request.user_id).await?;
    let content = validate_content(&request.content)?;
    let history = parse_messages(&conversation.messages)?;

    let application = match conversation.application_id {
        Some(id) => {
            let row = applications::store::find_application(&state.db, id).await?;
            if row.is_none() {
                warn!("Conversation {conversation_id} links to missing application {id}");
            }
            row
        }
        None => None,
    };
    let system = build_system_prompt(application.as_ref());

    let user_message = ChatMessage::new(Role::User, content, Utc::now());
    let response = state
        .llm
        .chat(&system, &build_turns(&history, &user_message.content))
        .await?;
    let reply = response
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(LlmError::EmptyContent)?
        .to_string();
    let assistant_message = ChatMessage::new(Role::Assistant, reply, Utc::now());

    let appended = serde_json::to_value([&user_message, &assistant_message])
        .map_err(|e| AppError::Internal(anyhow::Error::new(e)))?;
    store::append_messages(&state.db, conversation_id, &appended).await?;

    info!(
        "Conversation {conversation_id}: reply of {} chars",
        assistant_message.content.len()
    );
    Ok(ApiResponse::ok(assistant_message))
}
