use axum::{extract::State, Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::state::AppState;

const SERVICE_NAME: &str = "mortgage-api";

/// GET /
pub async fn root_handler() -> Json<Value> {
    Json(json!({
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "message": "Mortgage application intake API",
        "health": "/health"
    }))
}

/// GET /health
/// Service status plus which external extraction tools are installed.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let tools = state.processor.tool_status();
    Json(json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
        "storage": state.storage.backend_name(),
        "tools": tools
    }))
}
