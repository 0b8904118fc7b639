pub mod health;

use axum::{
    routing::{get, patch, post, put},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::state::AppState;
use crate::{applications, chat, documents, intelligence, users};

/// `?user_id=` on reads and deletes; the caller's identity.
#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::root_handler))
        .route("/health", get(health::health_handler))
        // Users
        .route("/api/v1/users", post(users::handlers::handle_create_user))
        .route(
            "/api/v1/users/:id",
            get(users::handlers::handle_get_user).patch(users::handlers::handle_update_user),
        )
        // Applications
        .route(
            "/api/v1/applications",
            get(applications::handlers::handle_list_applications)
                .post(applications::handlers::handle_create_application),
        )
        .route(
            "/api/v1/applications/:id",
            get(applications::handlers::handle_get_application)
                .delete(applications::handlers::handle_delete_application),
        )
        .route(
            "/api/v1/applications/:id/steps/:step",
            put(applications::handlers::handle_save_step),
        )
        .route(
            "/api/v1/applications/:id/submit",
            post(applications::handlers::handle_submit_application),
        )
        .route(
            "/api/v1/applications/:id/status",
            patch(applications::handlers::handle_update_status),
        )
        .route(
            "/api/v1/applications/:id/risk",
            get(applications::handlers::handle_assess_risk),
        )
        // Documents
        .route(
            "/api/v1/applications/:id/documents",
            get(documents::handlers::handle_list_documents)
                .post(documents::handlers::handle_upload_document),
        )
        .route(
            "/api/v1/applications/:id/documents/process",
            post(documents::handlers::handle_process_pending),
        )
        .route(
            "/api/v1/documents/:id",
            get(documents::handlers::handle_get_document)
                .delete(documents::handlers::handle_delete_document),
        )
        .route(
            "/api/v1/documents/:id/download",
            get(documents::handlers::handle_download_document),
        )
        .route(
            "/api/v1/documents/:id/analyze",
            post(documents::handlers::handle_analyze_document),
        )
        // Document intelligence (stateless)
        .route(
            "/api/v1/intelligence/extract-text",
            post(intelligence::handlers::handle_extract_text),
        )
        .route(
            "/api/v1/intelligence/analyze-document",
            post(intelligence::handlers::handle_analyze_document),
        )
        // Chat
        .route(
            "/api/v1/chat/conversations",
            get(chat::handlers::handle_list_conversations)
                .post(chat::handlers::handle_create_conversation),
        )
        .route(
            "/api/v1/chat/conversations/:id",
            get(chat::handlers::handle_get_conversation)
                .delete(chat::handlers::handle_delete_conversation),
        )
        .route(
            "/api/v1/chat/conversations/:id/messages",
            post(chat::handlers::handle_send_message),
        )
        .with_state(state)
}
