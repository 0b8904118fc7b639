use std::sync::Arc;

use sqlx::PgPool;

use crate::cache::AnalysisCache;
use crate::config::Config;
use crate::intelligence::DocumentProcessor;
use crate::llm_client::LlmClient;
use crate::storage::DocumentStorage;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub cache: AnalysisCache,
    /// Local disk or S3, chosen by STORAGE_BACKEND.
    pub storage: Arc<dyn DocumentStorage>,
    pub llm: LlmClient,
    pub config: Config,
    /// Text extraction chain. Default: Tesseract for OCR.
    pub processor: DocumentProcessor,
}
