use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::document::DocumentRow;

/// Parameters for recording an uploaded document.
pub struct NewDocument<'a> {
    pub id: Uuid,
    pub application_id: Uuid,
    pub user_id: Uuid,
    pub document_type: &'a str,
    pub original_filename: &'a str,
    pub content_type: &'a str,
    pub size_bytes: i64,
    pub storage_key: &'a str,
    pub content_hash: &'a str,
}

pub async fn insert_document(pool: &PgPool, new: NewDocument<'_>) -> sqlx::Result<DocumentRow> {
    sqlx::query_as::<_, DocumentRow>(
        r#"
        INSERT INTO documents
            (id, application_id, user_id, document_type, original_filename,
             content_type, size_bytes, storage_key, content_hash, ai_processed)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, FALSE)
        RETURNING *
        "#,
    )
    .bind(new.id)
    .bind(new.application_id)
    .bind(new.user_id)
    .bind(new.document_type)
    .bind(new.original_filename)
    .bind(new.content_type)
    .bind(new.size_bytes)
    .bind(new.storage_key)
    .bind(new.content_hash)
    .fetch_one(pool)
    .await
}

pub async fn find_document(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<DocumentRow>> {
    sqlx::query_as::<_, DocumentRow>("SELECT * FROM documents WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_for_application(
    pool: &PgPool,
    application_id: Uuid,
) -> sqlx::Result<Vec<DocumentRow>> {
    sqlx::query_as::<_, DocumentRow>(
        "SELECT * FROM documents WHERE application_id = $1 ORDER BY created_at",
    )
    .bind(application_id)
    .fetch_all(pool)
    .await
}

pub async fn list_unprocessed(
    pool: &PgPool,
    application_id: Uuid,
) -> sqlx::Result<Vec<DocumentRow>> {
    sqlx::query_as::<_, DocumentRow>(
        r#"
        SELECT * FROM documents
        WHERE application_id = $1 AND ai_processed = FALSE
        ORDER BY created_at
        "#,
    )
    .bind(application_id)
    .fetch_all(pool)
    .await
}

pub async fn save_analysis(
    pool: &PgPool,
    id: Uuid,
    extracted_text: &str,
    ai_analysis: &Value,
) -> sqlx::Result<Option<DocumentRow>> {
    sqlx::query_as::<_, DocumentRow>(
        r#"
        UPDATE documents
        SET extracted_text = $2, ai_analysis = $3, ai_processed = TRUE, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(extracted_text)
    .bind(ai_analysis)
    .fetch_optional(pool)
    .await
}

/// Returns whether a row was removed.
pub async fn delete_document(pool: &PgPool, id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM documents WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
