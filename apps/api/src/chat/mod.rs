// Mortgage assistant chat: conversations persisted as a JSON message list,
// each new message forwarded to the hosted model with recent history.

pub mod conversation;
pub mod handlers;
pub mod prompts;
pub mod store;

use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::chat::ChatConversationRow;

pub const DEFAULT_TITLE: &str = "New conversation";
const MAX_TITLE_CHARS: usize = 120;

/// Trimmed title, falling back to the default when blank.
pub fn normalize_title(raw: Option<&str>) -> Result<String, AppError> {
    let title = raw.map(str::trim).filter(|t| !t.is_empty()).unwrap_or(DEFAULT_TITLE);
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(AppError::Validation(format!(
            "Title must be at most {MAX_TITLE_CHARS} characters"
        )));
    }
    Ok(title.to_string())
}

/// Loads a conversation and checks that `user_id` owns it.
pub async fn load_owned(
    pool: &PgPool,
    conversation_id: Uuid,
    user_id: Uuid,
) -> Result<ChatConversationRow, AppError> {
    let row = store::find_conversation(pool, conversation_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Conversation {conversation_id} not found")))?;
    if row.user_id != user_id {
        return Err(AppError::Forbidden);
    }
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title(None).unwrap(), DEFAULT_TITLE);
        assert_eq!(normalize_title(Some("   ")).unwrap(), DEFAULT_TITLE);
        assert_eq!(normalize_title(Some(" Deposit questions ")).unwrap(), "Deposit questions");
        assert!(normalize_title(Some(&"t".repeat(121))).is_err());
    }
}
