//! Axum route handlers for the Users API.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::envelope::ApiResponse;
use crate::errors::AppError;
use crate::models::user::User;
use crate::state::AppState;
use crate::users::store::{self, NewUser};
use crate::users::{normalize_email, require_name, UserRole};

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

/// POST /api/v1/users
pub async fn handle_create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<ApiResponse<User>, AppError> {
    let email = normalize_email(&request.email)?;
    let full_name = require_name(&request.full_name)?;
    let role = match request.role.as_deref() {
        Some(raw) => UserRole::parse(raw)?,
        None => UserRole::Customer,
    };
    let phone = request.phone.as_deref().map(str::trim).filter(|p| !p.is_empty());

    let user = store::insert_user(
        &state.db,
        NewUser {
            email: &email,
            full_name: &full_name,
            phone,
            role: role.as_str(),
        },
    )
    .await
    .map_err(|e| {
        if store::is_unique_violation(&e) {
            AppError::Conflict(format!("A user with email {email} already exists"))
        } else {
            AppError::Database(e)
        }
    })?;

    info!("Created user {} ({})", user.id, user.role);
    Ok(ApiResponse::created(user))
}

/// GET /api/v1/users/:id
pub async fn handle_get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<ApiResponse<User>, AppError> {
    let user = store::find_user(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))?;
    Ok(ApiResponse::ok(user))
}

/// PATCH /api/v1/users/:id
pub async fn handle_update_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<ApiResponse<User>, AppError> {
    let full_name = request.full_name.as_deref().map(require_name).transpose()?;
    let phone = request.phone.as_deref().map(str::trim);

    let user = store::update_user(&state.db, user_id, full_name.as_deref(), phone)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))?;
    Ok(ApiResponse::ok(user).with_message("User updated"))
}
