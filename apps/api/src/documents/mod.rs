// Application documents: upload to the document store, download, and the
// analysis pipeline that feeds them through document intelligence.

pub mod handlers;
pub mod pipeline;
pub mod store;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::applications::ApplicationStatus;
use crate::errors::AppError;
use crate::models::document::DocumentRow;

/// Category the applicant files a document under. Independent of the
/// classification that analysis infers from the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentCategory {
    Identity,
    Income,
    BankStatement,
    Property,
    Other,
}

impl DocumentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentCategory::Identity => "identity",
            DocumentCategory::Income => "income",
            DocumentCategory::BankStatement => "bank_statement",
            DocumentCategory::Property => "property",
            DocumentCategory::Other => "other",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, AppError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "identity" => Ok(DocumentCategory::Identity),
            "income" => Ok(DocumentCategory::Income),
            "bank_statement" => Ok(DocumentCategory::BankStatement),
            "property" => Ok(DocumentCategory::Property),
            "other" => Ok(DocumentCategory::Other),
            other => Err(AppError::Validation(format!(
                "Invalid document_type '{other}'. Expected identity, income, bank_statement, property or other"
            ))),
        }
    }
}

/// Documents can be added until a decision is made or the application is withdrawn.
pub fn accepts_uploads(status: ApplicationStatus) -> bool {
    matches!(
        status,
        ApplicationStatus::Draft | ApplicationStatus::Submitted | ApplicationStatus::UnderReview
    )
}

/// `Content-Disposition` value that survives arbitrary client filenames.
pub fn attachment_disposition(filename: &str) -> String {
    let safe: String = filename
        .chars()
        .map(|c| if c == '"' || c == '\\' || c.is_control() || !c.is_ascii() { '_' } else { c })
        .collect();
    format!("attachment; filename=\"{safe}\"")
}

/// Loads a document and checks that `user_id` owns it.
pub async fn load_owned(
    pool: &PgPool,
    document_id: Uuid,
    user_id: Uuid,
) -> Result<DocumentRow, AppError> {
    let row = store::find_document(pool, document_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Document {document_id} not found")))?;
    if row.user_id != user_id {
        return Err(AppError::Forbidden);
    }
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse() {
        assert_eq!(
            DocumentCategory::parse("Bank_Statement").unwrap(),
            DocumentCategory::BankStatement
        );
        assert_eq!(DocumentCategory::parse("other").unwrap().as_str(), "other");
        assert!(DocumentCategory::parse("selfie").is_err());
    }

    #[test]
    fn test_accepts_uploads() {
        assert!(accepts_uploads(ApplicationStatus::Draft));
        assert!(accepts_uploads(ApplicationStatus::UnderReview));
        assert!(!accepts_uploads(ApplicationStatus::Approved));
        assert!(!accepts_uploads(ApplicationStatus::Withdrawn));
    }

    #[test]
    fn test_attachment_disposition_escapes() {
        assert_eq!(
            attachment_disposition("payslip.pdf"),
            "attachment; filename=\"payslip.pdf\""
        );
        assert_eq!(
            attachment_disposition("a\"b\\c\nd.pdf"),
            "attachment; filename=\"a_b_c_d.pdf\""
        );
        assert_eq!(
            attachment_disposition("relevé.pdf"),
            "attachment; filename=\"relev_.pdf\""
        );
    }
}
