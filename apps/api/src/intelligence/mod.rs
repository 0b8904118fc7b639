// Document intelligence: text extraction (PDF text layer, poppler, OCR) and
// rule-based structure analysis, with an optional LLM review on top.
// Extraction shells out to blocking tools, so it always runs on the blocking pool.

pub mod classify;
pub mod command;
pub mod fields;
pub mod handlers;
pub mod ocr;
pub mod pdf;
pub mod preprocess;
pub mod prompts;
pub mod review;
pub mod scoring;

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::intelligence::classify::{classify_document, DocumentKind};
use crate::intelligence::fields::{extract_fields, ExtractedFields};
use crate::intelligence::ocr::{run_engines, OcrEngine, TesseractOcr};
use crate::intelligence::scoring::{analysis_confidence, build_suggestions};

/// Direct text shorter than this is treated as "no text layer".
const MIN_DIRECT_TEXT_CHARS: usize = 50;

const DIRECT_TEXT_CONFIDENCE: f64 = 0.95;
const PDFTOTEXT_CONFIDENCE: f64 = 0.90;
const PDF_OCR_CONFIDENCE: f64 = 0.75;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("Tool not available: {0}")]
    ToolNotAvailable(String),

    #[error("PDF processing failed: {0}")]
    Pdf(String),

    #[error("OCR failed: {0}")]
    OcrFailed(String),

    #[error("No OCR engine available or all engines failed")]
    NoOcrResult,

    #[error("Image error: {0}")]
    Image(String),

    #[error("Tool timed out: {0}")]
    TimedOut(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Extraction task aborted: {0}")]
    Aborted(String),
}

/// File types the extraction chain understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportedType {
    Pdf,
    Jpeg,
    Png,
}

impl SupportedType {
    /// Parses a MIME type, ignoring parameters and case.
    pub fn from_content_type(content_type: &str) -> Result<Self, ExtractionError> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "application/pdf" => Ok(SupportedType::Pdf),
            "image/jpeg" | "image/jpg" => Ok(SupportedType::Jpeg),
            "image/png" => Ok(SupportedType::Png),
            _ => Err(ExtractionError::UnsupportedType(content_type.to_string())),
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            SupportedType::Pdf => "application/pdf",
            SupportedType::Jpeg => "image/jpeg",
            SupportedType::Png => "image/png",
        }
    }
}

/// Output of the extraction chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub text: String,
    pub method: String,
    pub confidence: f64,
    pub page_count: u32,
    pub word_count: usize,
    pub extraction_time_ms: u64,
}

/// Output of rule-based structure analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentAnalysis {
    pub document_type: DocumentKind,
    pub fields: ExtractedFields,
    pub confidence: f64,
    pub suggestions: Vec<String>,
}

/// Which external tools are installed on this host.
#[derive(Debug, Clone, Serialize)]
pub struct ToolStatus {
    pub tesseract: bool,
    pub pdftotext: bool,
    pub pdftoppm: bool,
    pub pdfinfo: bool,
}

pub fn check_binary(name: &str) -> bool {
    which::which(name).is_ok()
}

/// Runs the extraction chain and structure analysis.
/// Cheap to clone; engines are shared.
#[derive(Clone)]
pub struct DocumentProcessor {
    engines: Vec<Arc<dyn OcrEngine>>,
}

impl DocumentProcessor {
    pub fn new(engines: Vec<Arc<dyn OcrEngine>>) -> Self {
        Self { engines }
    }

    /// Default setup: Tesseract only.
    pub fn with_tesseract(lang: &str) -> Self {
        let tesseract = TesseractOcr::new(lang);
        if tesseract.is_available() {
            info!("Tesseract OCR available (lang: {lang})");
        } else {
            warn!("Tesseract not available; image OCR will fail until it is installed");
        }
        Self::new(vec![Arc::new(tesseract)])
    }

    pub fn tool_status(&self) -> ToolStatus {
        ToolStatus {
            tesseract: check_binary("tesseract"),
            pdftotext: check_binary("pdftotext"),
            pdftoppm: check_binary("pdftoppm"),
            pdfinfo: check_binary("pdfinfo"),
        }
    }

    /// Extracts text from a PDF or image. Runs on the blocking pool.
    pub async fn extract(
        &self,
        data: Bytes,
        content_type: &str,
        filename: &str,
    ) -> Result<ExtractionResult, ExtractionError> {
        let kind = SupportedType::from_content_type(content_type)?;
        let this = self.clone();
        let filename = filename.to_string();

        tokio::task::spawn_blocking(move || this.extract_blocking(&data, kind, &filename))
            .await
            .map_err(|e| ExtractionError::Aborted(e.to_string()))?
    }

    fn extract_blocking(
        &self,
        data: &[u8],
        kind: SupportedType,
        filename: &str,
    ) -> Result<ExtractionResult, ExtractionError> {
        let started = Instant::now();

        let (text, method, confidence, page_count) = match kind {
            SupportedType::Pdf => self.extract_pdf(data, filename)?,
            SupportedType::Jpeg | SupportedType::Png => {
                let outcome = self.ocr_image_bytes(data)?;
                info!("Image OCR completed with {}: {filename}", outcome.method);
                (outcome.text, outcome.method, outcome.confidence, 1)
            }
        };

        Ok(ExtractionResult {
            word_count: text.split_whitespace().count(),
            text,
            method,
            confidence,
            page_count,
            extraction_time_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// PDF chain: text layer → pdftotext → OCR of rendered pages.
    fn extract_pdf(
        &self,
        data: &[u8],
        filename: &str,
    ) -> Result<(String, String, f64, u32), ExtractionError> {
        let mut temp = tempfile::Builder::new().suffix(".pdf").tempfile()?;
        temp.write_all(data)?;
        temp.flush()?;
        let pdf_path = temp.path();

        let page_count = pdf::page_count(pdf_path).unwrap_or(1);

        if let Some(text) = pdf::extract_text_layer(data) {
            if text.trim().chars().count() > MIN_DIRECT_TEXT_CHARS {
                info!("PDF text extracted from text layer: {filename}");
                return Ok((
                    text.trim().to_string(),
                    "pdf-extract (direct text)".to_string(),
                    DIRECT_TEXT_CONFIDENCE,
                    page_count,
                ));
            }
        }

        match pdf::run_pdftotext(pdf_path) {
            Ok(text) if text.trim().chars().count() > MIN_DIRECT_TEXT_CHARS => {
                info!("PDF text extracted with pdftotext: {filename}");
                return Ok((
                    text.trim().to_string(),
                    "pdftotext (poppler)".to_string(),
                    PDFTOTEXT_CONFIDENCE,
                    page_count,
                ));
            }
            Ok(_) => {}
            Err(e) => warn!("pdftotext unavailable for {filename}: {e}"),
        }

        info!("Attempting OCR on PDF pages: {filename}");
        let page_dir = tempfile::tempdir()?;
        let pages = pdf::render_pages(pdf_path, page_dir.path())?;
        let mut page_texts = Vec::with_capacity(pages.len());
        for page in &pages {
            let outcome = self.ocr_image_file(page)?;
            page_texts.push(outcome.text);
        }

        let rendered = pages.len() as u32;
        Ok((
            page_texts.join("\n").trim().to_string(),
            "OCR on PDF pages".to_string(),
            PDF_OCR_CONFIDENCE,
            page_count.max(rendered),
        ))
    }

    fn ocr_image_file(&self, path: &Path) -> Result<ocr::OcrOutcome, ExtractionError> {
        let data = std::fs::read(path)?;
        self.ocr_image_bytes(&data)
    }

    /// Preprocesses an image and runs every available OCR engine on it.
    fn ocr_image_bytes(&self, data: &[u8]) -> Result<ocr::OcrOutcome, ExtractionError> {
        let processed = preprocess::preprocess_for_ocr(data)?;
        let temp = tempfile::Builder::new().suffix(".png").tempfile()?;
        processed
            .save_with_format(temp.path(), image::ImageFormat::Png)
            .map_err(|e| ExtractionError::Image(e.to_string()))?;
        run_engines(&self.engines, temp.path())
    }

    /// Classifies the document and pulls out structured fields.
    pub fn analyze(&self, text: &str, filename: &str) -> DocumentAnalysis {
        analyze_text(text, filename)
    }
}

/// Pure structure analysis over already-extracted text.
pub fn analyze_text(text: &str, filename: &str) -> DocumentAnalysis {
    let document_type = classify_document(text, filename);
    let fields = extract_fields(text, document_type);
    let confidence = analysis_confidence(&fields, document_type);
    let suggestions = build_suggestions(&fields, document_type);
    DocumentAnalysis {
        document_type,
        fields,
        confidence,
        suggestions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_parsing() {
        assert_eq!(
            SupportedType::from_content_type("application/pdf").unwrap(),
            SupportedType::Pdf
        );
        assert_eq!(
            SupportedType::from_content_type("IMAGE/JPG").unwrap(),
            SupportedType::Jpeg
        );
        assert_eq!(
            SupportedType::from_content_type("image/png; charset=binary").unwrap(),
            SupportedType::Png
        );
    }

    #[test]
    fn test_content_type_rejects_others() {
        let err = SupportedType::from_content_type("text/plain").unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedType(ref ct) if ct == "text/plain"));
        assert!(SupportedType::from_content_type("image/gif").is_err());
    }

    #[test]
    fn test_analyze_text_payslip() {
        let text = "ACME Pty Ltd\nEmployer: Acme Holdings\nGross Pay: $6,250.00\nNet Pay: $4,810.55\nPay date 15/03/2024";
        let analysis = analyze_text(text, "march.pdf");
        assert_eq!(analysis.document_type, DocumentKind::Income);
        assert!(analysis.fields.contains_key("gross_income"));
        assert!(analysis.fields.contains_key("net_income"));
        assert!(analysis.confidence > 0.8, "confidence {}", analysis.confidence);
    }

    #[test]
    fn test_analyze_text_empty_has_zero_confidence() {
        let analysis = analyze_text("", "blank.png");
        assert_eq!(analysis.document_type, DocumentKind::General);
        assert!(analysis.fields.is_empty());
        assert_eq!(analysis.confidence, 0.0);
        assert_eq!(analysis.suggestions.len(), 2);
    }

    #[tokio::test]
    async fn test_extract_rejects_unsupported_before_spawning() {
        let processor = DocumentProcessor::new(vec![]);
        let err = processor
            .extract(Bytes::from_static(b"hello"), "text/plain", "notes.txt")
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedType(_)));
    }

    #[tokio::test]
    async fn test_extract_image_without_engines_fails() {
        let mut buf = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageLuma8(image::GrayImage::from_pixel(8, 8, image::Luma([200])))
            .write_to(&mut buf, image::ImageFormat::Png)
            .unwrap();
        let processor = DocumentProcessor::new(vec![]);
        let err = processor
            .extract(Bytes::from(buf.into_inner()), "image/png", "scan.png")
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::NoOcrResult));
    }
}
