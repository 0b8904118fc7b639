// Mortgage applications: the multi-step intake form, its lifecycle, and the
// threshold-based risk assessment run at submission.

pub mod form;
pub mod handlers;
pub mod risk;
pub mod store;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::application::ApplicationRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Draft,
    Submitted,
    UnderReview,
    Approved,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Draft => "draft",
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::UnderReview => "under_review",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "draft" => Some(ApplicationStatus::Draft),
            "submitted" => Some(ApplicationStatus::Submitted),
            "under_review" => Some(ApplicationStatus::UnderReview),
            "approved" => Some(ApplicationStatus::Approved),
            "rejected" => Some(ApplicationStatus::Rejected),
            "withdrawn" => Some(ApplicationStatus::Withdrawn),
            _ => None,
        }
    }

    /// Lifecycle edges reachable through a status update.
    /// `draft -> submitted` only happens through submission, which validates the form.
    pub fn can_transition_to(self, next: ApplicationStatus) -> bool {
        use ApplicationStatus::*;
        matches!(
            (self, next),
            (Submitted, UnderReview)
                | (UnderReview, Approved)
                | (UnderReview, Rejected)
                | (Draft, Withdrawn)
                | (Submitted, Withdrawn)
        )
    }

    pub fn is_deletable(self) -> bool {
        DELETABLE_STATUSES.contains(&self)
    }
}

/// Statuses an application may be deleted from.
pub const DELETABLE_STATUSES: [ApplicationStatus; 2] =
    [ApplicationStatus::Draft, ApplicationStatus::Withdrawn];

/// Status column of a row. Unknown values are treated as a server-side fault.
pub fn row_status(row: &ApplicationRow) -> Result<ApplicationStatus, AppError> {
    ApplicationStatus::parse(&row.status).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!(
            "application {} has unknown status '{}'",
            row.id,
            row.status
        ))
    })
}

/// Loads an application and checks that `user_id` owns it.
pub async fn load_owned(
    pool: &PgPool,
    application_id: Uuid,
    user_id: Uuid,
) -> Result<ApplicationRow, AppError> {
    let row = store::find_application(pool, application_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {application_id} not found")))?;
    if row.user_id != user_id {
        return Err(AppError::Forbidden);
    }
    Ok(row)
}
