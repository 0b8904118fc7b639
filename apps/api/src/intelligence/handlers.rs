//! Axum route handlers for the stateless document intelligence endpoints.
//! Nothing here touches the database; uploads are processed and discarded.

use std::time::Instant;

use axum::extract::{Multipart, State};
use serde::Serialize;

use crate::envelope::ApiResponse;
use crate::errors::AppError;
use crate::intelligence::classify::DocumentKind;
use crate::intelligence::fields::ExtractedFields;
use crate::intelligence::review::{review_document, LlmReview};
use crate::intelligence::SupportedType;
use crate::state::AppState;
use crate::upload::read_multipart;

#[derive(Debug, Serialize)]
pub struct ExtractTextResponse {
    pub filename: String,
    pub file_type: String,
    pub extracted_text: String,
    pub confidence_score: f64,
    pub processing_method: String,
    pub page_count: u32,
    pub word_count: usize,
    pub extraction_time_ms: u64,
    pub total_time_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeDocumentResponse {
    pub filename: String,
    pub document_type: DocumentKind,
    pub extracted_fields: ExtractedFields,
    pub confidence_score: f64,
    pub raw_text: String,
    pub suggestions: Vec<String>,
    pub llm_review: Option<LlmReview>,
}

/// POST /api/v1/intelligence/extract-text
pub async fn handle_extract_text(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<ApiResponse<ExtractTextResponse>, AppError> {
    let started = Instant::now();
    let form = read_multipart(multipart, state.config.max_upload_bytes).await?;
    let file = form.file;
    let file_type = SupportedType::from_content_type(&file.content_type)?;

    let result = state
        .processor
        .extract(file.data, file_type.mime(), &file.filename)
        .await?;

    Ok(ApiResponse::ok(ExtractTextResponse {
        filename: file.filename,
        file_type: file_type.mime().to_string(),
        extracted_text: result.text,
        confidence_score: result.confidence,
        processing_method: result.method,
        page_count: result.page_count,
        word_count: result.word_count,
        extraction_time_ms: result.extraction_time_ms,
        total_time_ms: started.elapsed().as_millis() as u64,
    }))
}

/// POST /api/v1/intelligence/analyze-document
///
/// Extraction, rule-based analysis and, when enabled, an LLM review.
pub async fn handle_analyze_document(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<ApiResponse<AnalyzeDocumentResponse>, AppError> {
    let form = read_multipart(multipart, state.config.max_upload_bytes).await?;
    let file = form.file;
    let file_type = SupportedType::from_content_type(&file.content_type)?;

    let extraction = state
        .processor
        .extract(file.data, file_type.mime(), &file.filename)
        .await?;
    let analysis = state.processor.analyze(&extraction.text, &file.filename);

    let llm_review = if state.config.enable_llm_document_review {
        review_document(&state.llm, &extraction.text, &analysis).await
    } else {
        None
    };

    Ok(ApiResponse::ok(AnalyzeDocumentResponse {
        filename: file.filename,
        document_type: analysis.document_type,
        extracted_fields: analysis.fields,
        confidence_score: analysis.confidence,
        raw_text: extraction.text,
        suggestions: analysis.suggestions,
        llm_review,
    }))
}
