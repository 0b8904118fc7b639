//! Axum route handlers for the Applications API.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::applications::form::{self, FormProgress};
use crate::applications::risk::{self, RiskAssessment};
use crate::applications::{load_owned, row_status, store, ApplicationStatus};
use crate::envelope::ApiResponse;
use crate::errors::AppError;
use crate::models::application::ApplicationRow;
use crate::routes::UserIdQuery;
use crate::state::AppState;
use crate::users;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateApplicationRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct SubmitApplicationRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct SaveStepRequest {
    pub user_id: Uuid,
    pub data: Value,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ApplicationDetail {
    pub application: ApplicationRow,
    pub progress: FormProgress,
}

impl From<ApplicationRow> for ApplicationDetail {
    fn from(application: ApplicationRow) -> Self {
        let progress = form::progress(&application.form_data);
        Self {
            application,
            progress,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/applications
pub async fn handle_create_application(
    State(state): State<AppState>,
    Json(request): Json<CreateApplicationRequest>,
) -> Result<ApiResponse<ApplicationDetail>, AppError> {
    users::store::find_user(&state.db, request.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", request.user_id)))?;

    let row = store::insert_application(&state.db, request.user_id).await?;
    info!("Created application {} for user {}", row.id, row.user_id);

    Ok(ApiResponse::created(row.into()))
}

/// GET /api/v1/applications?user_id=
pub async fn handle_list_applications(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<ApiResponse<Vec<ApplicationRow>>, AppError> {
    let rows = store::list_for_user(&state.db, params.user_id).await?;
    Ok(ApiResponse::ok(rows))
}

/// GET /api/v1/applications/:id?user_id=
pub async fn handle_get_application(
    State(state): State<AppState>,
    Path(application_id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<ApiResponse<ApplicationDetail>, AppError> {
    let row = load_owned(&state.db, application_id, params.user_id).await?;
    Ok(ApiResponse::ok(row.into()))
}

/// PUT /api/v1/applications/:id/steps/:step
///
/// Merges one step of form data into a draft and advances `current_step`.
pub async fn handle_save_step(
    State(state): State<AppState>,
    Path((application_id, step_key)): Path<(Uuid, String)>,
    Json(request): Json<SaveStepRequest>,
) -> Result<ApiResponse<ApplicationDetail>, AppError> {
    let step = form::find_step(&step_key)
        .ok_or_else(|| AppError::Validation(format!("Unknown form step '{step_key}'")))?;

    let row = load_owned(&state.db, application_id, request.user_id).await?;
    require_draft(&row)?;

    let data = form::step_payload(step, request.data)?;
    let row = store::save_step(&state.db, application_id, step.key, &data, step.number + 1)
        .await?
        .ok_or_else(not_draft)?;

    info!(
        "Saved step '{}' for application {application_id} (current_step={})",
        step.key, row.current_step
    );
    Ok(ApiResponse::ok(row.into()))
}

/// POST /api/v1/applications/:id/submit
///
/// Validates every step, computes the risk assessment and moves the draft to `submitted`.
pub async fn handle_submit_application(
    State(state): State<AppState>,
    Path(application_id): Path<Uuid>,
    Json(request): Json<SubmitApplicationRequest>,
) -> Result<ApiResponse<ApplicationDetail>, AppError> {
    let row = load_owned(&state.db, application_id, request.user_id).await?;
    require_draft(&row)?;

    let progress = form::progress(&row.form_data);
    if !progress.is_complete() {
        return Err(AppError::UnprocessableEntity(format!(
            "Application is incomplete. Missing fields: {}",
            progress.missing().join(", ")
        )));
    }

    let assessment = risk::assess(&row.form_data, Utc::now());
    let assessment_json = serde_json::to_value(&assessment)
        .map_err(|e| AppError::Internal(anyhow::Error::new(e)))?;

    let row = store::mark_submitted(&state.db, application_id, &assessment_json)
        .await?
        .ok_or_else(not_draft)?;

    info!(
        "Application {application_id} submitted (risk score {}, {:?})",
        assessment.score, assessment.level
    );
    Ok(ApiResponse::ok(row.into()).with_message("Application submitted"))
}

/// PATCH /api/v1/applications/:id/status
pub async fn handle_update_status(
    State(state): State<AppState>,
    Path(application_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<ApiResponse<ApplicationRow>, AppError> {
    let next = ApplicationStatus::parse(&request.status)
        .ok_or_else(|| AppError::Validation(format!("Unknown status '{}'", request.status)))?;

    let row = store::find_application(&state.db, application_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {application_id} not found")))?;
    let current = row_status(&row)?;

    if !current.can_transition_to(next) {
        return Err(AppError::UnprocessableEntity(format!(
            "Cannot move application from {} to {}",
            current.as_str(),
            next.as_str()
        )));
    }

    let row = store::set_status(&state.db, application_id, current.as_str(), next.as_str())
        .await?
        .ok_or_else(|| {
            AppError::Conflict(format!(
                "Application {application_id} changed status concurrently"
            ))
        })?;

    info!(
        "Application {application_id} status {} -> {}",
        current.as_str(),
        next.as_str()
    );
    Ok(ApiResponse::ok(row))
}

/// DELETE /api/v1/applications/:id?user_id=
///
/// Only drafts and withdrawn applications can be deleted. Stored files go too.
pub async fn handle_delete_application(
    State(state): State<AppState>,
    Path(application_id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<ApiResponse<()>, AppError> {
    let row = load_owned(&state.db, application_id, params.user_id).await?;
    let status = row_status(&row)?;
    if !status.is_deletable() {
        return Err(AppError::UnprocessableEntity(format!(
            "Cannot delete an application in status {}",
            status.as_str()
        )));
    }

    let keys = store::delete_application(&state.db, application_id)
        .await?
        .ok_or_else(|| {
            AppError::UnprocessableEntity(format!(
                "Application {application_id} is no longer in a deletable status"
            ))
        })?;
    for key in &keys {
        if let Err(e) = state.storage.delete(key).await {
            warn!("Failed to remove stored file {key}: {e}");
        }
    }

    info!(
        "Deleted application {application_id} and {} document(s)",
        keys.len()
    );
    Ok(ApiResponse::ok(()).with_message("Application deleted"))
}

/// GET /api/v1/applications/:id/risk?user_id=
///
/// Recomputes the assessment from the current form without saving it.
pub async fn handle_assess_risk(
    State(state): State<AppState>,
    Path(application_id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<ApiResponse<RiskAssessment>, AppError> {
    let row = load_owned(&state.db, application_id, params.user_id).await?;
    Ok(ApiResponse::ok(risk::assess(&row.form_data, Utc::now())))
}

fn require_draft(row: &ApplicationRow) -> Result<(), AppError> {
    if row_status(row)? != ApplicationStatus::Draft {
        return Err(not_draft());
    }
    Ok(())
}

fn not_draft() -> AppError {
    AppError::UnprocessableEntity("Only draft applications can be edited or submitted".to_string())
}
