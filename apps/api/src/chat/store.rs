use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::chat::ChatConversationRow;

pub async fn insert_conversation(
    pool: &PgPool,
    user_id: Uuid,
    application_id: Option<Uuid>,
    title: &str,
) -> sqlx::Result<ChatConversationRow> {
    sqlx::query_as::<_, ChatConversationRow>(
        r#"
        INSERT INTO chat_conversations (id, user_id, application_id, title, messages)
        VALUES ($1, $2, $3, $4, '[]'::jsonb)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(application_id)
    .bind(title)
    .fetch_one(pool)
    .await
}

pub async fn find_conversation(
    pool: &PgPool,
    id: Uuid,
) -> sqlx::Result<Option<ChatConversationRow>> {
    sqlx::query_as::<_, ChatConversationRow>("SELECT * FROM chat_conversations WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> sqlx::Result<Vec<ChatConversationRow>> {
    sqlx::query_as::<_, ChatConversationRow>(
        "SELECT * FROM chat_conversations WHERE user_id = $1 ORDER BY updated_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Appends a JSON array of messages in one statement so concurrent sends never
/// overwrite each other's history.
pub async fn append_messages(pool: &PgPool, id: Uuid, messages: &Value) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        UPDATE chat_conversations
        SET messages = messages || $2::jsonb, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(messages)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete_conversation(pool: &PgPool, id: Uuid) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM chat_conversations WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
