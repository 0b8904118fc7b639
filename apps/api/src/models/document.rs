use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DocumentRow {
    pub id: Uuid,
    pub application_id: Uuid,
    pub user_id: Uuid,
    pub document_type: String,
    pub original_filename: String,
    pub content_type: String,
    pub size_bytes: i64,
    /// Internal location in the document store; never sent to clients.
    #[serde(skip_serializing)]
    pub storage_key: String,
    pub content_hash: String,
    pub ai_processed: bool,
    pub extracted_text: Option<String>,
    pub ai_analysis: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
