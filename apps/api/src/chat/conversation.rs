use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;
use crate::llm_client::{Role, Turn};

/// Messages beyond this many are not replayed to the model.
pub const HISTORY_WINDOW: usize = 20;
pub const MAX_MESSAGE_CHARS: usize = 4000;

/// One entry of `chat_conversations.messages`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: Role, content: String, created_at: DateTime<Utc>) -> Self {
        Self {
            role,
            content,
            created_at,
        }
    }
}

pub fn parse_messages(raw: &Value) -> Result<Vec<ChatMessage>, AppError> {
    if raw.is_null() {
        return Ok(Vec::new());
    }
    serde_json::from_value(raw.clone())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("malformed chat history: {e}")))
}

/// Trimmed message body; must be non-empty and at most `MAX_MESSAGE_CHARS`.
pub fn validate_content(raw: &str) -> Result<String, AppError> {
    let content = raw.trim();
    if content.is_empty() {
        return Err(AppError::Validation("Message cannot be empty".to_string()));
    }
    let len = content.chars().count();
    if len > MAX_MESSAGE_CHARS {
        return Err(AppError::Validation(format!(
            "Message is {len} characters; the limit is {MAX_MESSAGE_CHARS}"
        )));
    }
    Ok(content.to_string())
}

/// The last `HISTORY_WINDOW` messages followed by the new user message.
/// The Messages API wants the first turn to come from the user, so a window
/// that starts on an assistant reply is advanced past it.
pub fn build_turns<'a>(history: &'a [ChatMessage], new_message: &'a str) -> Vec<Turn<'a>> {
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    let window = &history[start..];
    let first_user = window
        .iter()
        .position(|m| m.role == Role::User)
        .unwrap_or(window.len());

    window[first_user..]
        .iter()
        .map(|m| Turn {
            role: m.role,
            content: &m.content,
        })
        .chain(std::iter::once(Turn {
            role: Role::User,
            content: new_message,
        }))
        .collect()
}
