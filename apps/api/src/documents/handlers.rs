//! Axum route handlers for the Documents API.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use crate::applications::{self, row_status};
use crate::cache::content_hash;
use crate::documents::pipeline::{self, AnalyzedDocument, BatchReport};
use crate::documents::store::{self, NewDocument};
use crate::documents::{accepts_uploads, attachment_disposition, load_owned, DocumentCategory};
use crate::envelope::ApiResponse;
use crate::errors::AppError;
use crate::intelligence::SupportedType;
use crate::models::document::DocumentRow;
use crate::routes::UserIdQuery;
use crate::state::AppState;
use crate::storage::document_key;
use crate::upload::read_multipart;

/// POST /api/v1/applications/:id/documents
///
/// Multipart fields: `user_id`, `document_type`, `file`.
pub async fn handle_upload_document(
    State(state): State<AppState>,
    Path(application_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<ApiResponse<DocumentRow>, AppError> {
    let form = read_multipart(multipart, state.config.max_upload_bytes).await?;

    let user_id: Uuid = form
        .field("user_id")
        .ok_or_else(|| AppError::Validation("user_id is required".to_string()))?
        .parse()
        .map_err(|_| AppError::Validation("user_id must be a UUID".to_string()))?;
    let category = DocumentCategory::parse(
        form.field("document_type")
            .ok_or_else(|| AppError::Validation("document_type is required".to_string()))?,
    )?;

    let application = applications::load_owned(&state.db, application_id, user_id).await?;
    let status = row_status(&application)?;
    if !accepts_uploads(status) {
        return Err(AppError::UnprocessableEntity(format!(
            "Documents cannot be added to an application in status {}",
            status.as_str()
        )));
    }

    let file = form.file;
    let file_type = SupportedType::from_content_type(&file.content_type)?;

    let document_id = Uuid::new_v4();
    let key = document_key(application_id, document_id, &file.filename);
    let hash = content_hash(&file.data);
    let size_bytes = file.data.len() as i64;

    state
        .storage
        .put(&key, file.data, file_type.mime())
        .await?;

    let inserted = store::insert_document(
        &state.db,
        NewDocument {
            id: document_id,
            application_id,
            user_id,
            document_type: category.as_str(),
            original_filename: &file.filename,
            content_type: file_type.mime(),
            size_bytes,
            storage_key: &key,
            content_hash: &hash,
        },
    )
    .await;

    let row = match inserted {
        Ok(row) => row,
        Err(e) => {
            // Don't leave an orphaned file behind a failed insert.
            if let Err(cleanup) = state.storage.delete(&key).await {
                warn!("Failed to remove orphaned upload {key}: {cleanup}");
            }
            return Err(e.into());
        }
    };

    info!(
        "Uploaded document {document_id} ({}, {size_bytes} bytes) to application {application_id} via {}",
        category.as_str(),
        state.storage.backend_name()
    );
    Ok(ApiResponse::created(row))
}

/// GET /api/v1/applications/:id/documents?user_id=
pub async fn handle_list_documents(
    State(state): State<AppState>,
    Path(application_id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<ApiResponse<Vec<DocumentRow>>, AppError> {
    applications::load_owned(&state.db, application_id, params.user_id).await?;
    let rows = store::list_for_application(&state.db, application_id).await?;
    Ok(ApiResponse::ok(rows))
}

/// POST /api/v1/applications/:id/documents/process?user_id=
///
/// Analyses every document of the application that has not been processed yet.
pub async fn handle_process_pending(
    State(state): State<AppState>,
    Path(application_id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<ApiResponse<BatchReport>, AppError> {
    applications::load_owned(&state.db, application_id, params.user_id).await?;
    let report = pipeline::process_pending(&state, application_id).await?;
    Ok(ApiResponse::ok(report))
}

/// GET /api/v1/documents/:id?user_id=
pub async fn handle_get_document(
    State(state): State<AppState>,
    Path(document_id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<ApiResponse<DocumentRow>, AppError> {
    let row = load_owned(&state.db, document_id, params.user_id).await?;
    Ok(ApiResponse::ok(row))
}

/// GET /api/v1/documents/:id/download?user_id=
///
/// Raw bytes with the stored content type, as an attachment.
pub async fn handle_download_document(
    State(state): State<AppState>,
    Path(document_id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Response, AppError> {
    let row = load_owned(&state.db, document_id, params.user_id).await?;
    let data: Bytes = state.storage.get(&row.storage_key).await?;

    Ok((
        [
            (header::CONTENT_TYPE, row.content_type.clone()),
            (
                header::CONTENT_DISPOSITION,
                attachment_disposition(&row.original_filename),
            ),
        ],
        data,
    )
        .into_response())
}

/// DELETE /api/v1/documents/:id?user_id=
pub async fn handle_delete_document(
    State(state): State<AppState>,
    Path(document_id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<ApiResponse<()>, AppError> {
    let row = load_owned(&state.db, document_id, params.user_id).await?;

    if !store::delete_document(&state.db, document_id).await? {
        return Err(AppError::NotFound(format!("Document {document_id} not found")));
    }
    if let Err(e) = state.storage.delete(&row.storage_key).await {
        warn!("Stored file for document {document_id} could not be removed: {e}");
    }

    info!("Deleted document {document_id}");
    Ok(ApiResponse::ok(()).with_message("Document deleted"))
}

/// POST /api/v1/documents/:id/analyze?user_id=
pub async fn handle_analyze_document(
    State(state): State<AppState>,
    Path(document_id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<ApiResponse<AnalyzedDocument>, AppError> {
    let row = load_owned(&state.db, document_id, params.user_id).await?;
    let analyzed = pipeline::analyze_document(&state, &row).await?;
    Ok(ApiResponse::ok(analyzed))
}
