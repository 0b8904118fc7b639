//! Document analysis pipeline: (cache | fetch → extract) → analyse → review → persist.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::documents::store;
use crate::errors::AppError;
use crate::intelligence::classify::DocumentKind;
use crate::intelligence::fields::ExtractedFields;
use crate::intelligence::review::{review_document, LlmReview};
use crate::intelligence::{DocumentAnalysis, ExtractionResult};
use crate::models::document::DocumentRow;
use crate::state::AppState;

/// How the text was obtained. Mirrors `ExtractionResult` minus the text itself,
/// which lives in its own column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionSummary {
    pub method: String,
    pub confidence: f64,
    pub page_count: u32,
    pub word_count: usize,
    pub extraction_time_ms: u64,
}

impl From<&ExtractionResult> for ExtractionSummary {
    fn from(r: &ExtractionResult) -> Self {
        Self {
            method: r.method.clone(),
            confidence: r.confidence,
            page_count: r.page_count,
            word_count: r.word_count,
            extraction_time_ms: r.extraction_time_ms,
        }
    }
}

/// JSON blob stored in `documents.ai_analysis`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub document_type: DocumentKind,
    pub extracted_fields: ExtractedFields,
    pub confidence_score: f64,
    pub suggestions: Vec<String>,
    pub extraction: ExtractionSummary,
    pub llm_review: Option<LlmReview>,
    pub analyzed_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzedDocument {
    pub document_id: Uuid,
    pub cached: bool,
    pub analysis: AnalysisRecord,
}

#[derive(Debug, Serialize)]
pub struct BatchFailure {
    pub document_id: Uuid,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: Vec<BatchFailure>,
}

/// Runs a stored document through extraction and analysis and persists the result.
///
/// The cache holds extraction output only. Classification depends on the filename and
/// the review on the LLM, so both are recomputed for every document.
pub async fn analyze_document(
    state: &AppState,
    document: &DocumentRow,
) -> Result<AnalyzedDocument, AppError> {
    let (extraction, cached) = match state
        .cache
        .get::<ExtractionResult>(&document.content_hash)
        .await
    {
        Some(hit) => {
            info!("Using cached extraction for document {}", document.id);
            (hit, true)
        }
        None => {
            let data = state.storage.get(&document.storage_key).await?;
            let extraction = state
                .processor
                .extract(data, &document.content_type, &document.original_filename)
                .await?;
            (extraction, false)
        }
    };

    let analysis = state
        .processor
        .analyze(&extraction.text, &document.original_filename);
    let llm_review = if state.config.enable_llm_document_review {
        review_document(&state.llm, &extraction.text, &analysis).await
    } else {
        None
    };
    let record = build_record(&extraction, analysis, llm_review, Utc::now());

    let ai_analysis = serde_json::to_value(&record)
        .map_err(|e| AppError::Internal(anyhow::Error::new(e)))?;
    store::save_analysis(&state.db, document.id, &extraction.text, &ai_analysis)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Document {} not found", document.id)))?;

    if !cached {
        state.cache.put(&document.content_hash, &extraction).await;
    }

    info!(
        "Document {} analysed as {} (confidence {:.2})",
        document.id,
        record.document_type.as_str(),
        record.confidence_score
    );

    Ok(AnalyzedDocument {
        document_id: document.id,
        cached,
        analysis: record,
    })
}

fn build_record(
    extraction: &ExtractionResult,
    analysis: DocumentAnalysis,
    llm_review: Option<LlmReview>,
    analyzed_at: DateTime<Utc>,
) -> AnalysisRecord {
    AnalysisRecord {
        document_type: analysis.document_type,
        extracted_fields: analysis.fields,
        confidence_score: analysis.confidence,
        suggestions: analysis.suggestions,
        extraction: ExtractionSummary::from(extraction),
        llm_review,
        analyzed_at,
    }
}

/// Analyses every unprocessed document of an application, one at a time.
pub async fn process_pending(
    state: &AppState,
    application_id: Uuid,
) -> Result<BatchReport, AppError> {
    let pending = store::list_unprocessed(&state.db, application_id).await?;
    info!(
        "Processing {} unprocessed document(s) for application {application_id}",
        pending.len()
    );

    let report = run_batch(pending, |document| async move {
        analyze_document(state, &document).await.map(|_| ())
    })
    .await;

    info!(
        "Batch complete for application {application_id}: {}/{} succeeded",
        report.succeeded, report.total
    );
    Ok(report)
}

/// Applies `step` to each document in order. A failing document is recorded in the
/// report and the batch carries on.
async fn run_batch<F, Fut>(documents: Vec<DocumentRow>, mut step: F) -> BatchReport
where
    F: FnMut(DocumentRow) -> Fut,
    Fut: Future<Output = Result<(), AppError>>,
{
    let mut report = BatchReport {
        total: documents.len(),
        succeeded: 0,
        failed: Vec::new(),
    };

    for document in documents {
        let document_id = document.id;
        match step(document).await {
            Ok(()) => report.succeeded += 1,
            Err(e) => {
                warn!("Analysis failed for document {document_id}: {e}");
                report.failed.push(BatchFailure {
                    document_id,
                    error: e.to_string(),
                });
            }
        }
    }

    report
}
