//! OCR engines. Each engine is a blocking call on an image file; the processor
//! runs all available engines and keeps the longest transcription.

use std::path::Path;
use std::sync::Arc;

use tokio::process::Command;
use tracing::warn;

use super::command::{run_with_timeout, tool_error, TOOL_TIMEOUT};
use super::{check_binary, ExtractionError};

pub trait OcrEngine: Send + Sync {
    /// Label reported as the processing method.
    fn name(&self) -> &'static str;

    /// Fixed confidence attributed to this engine's output.
    fn confidence(&self) -> f64;

    fn is_available(&self) -> bool;

    fn recognize(&self, image_path: &Path) -> Result<String, ExtractionError>;
}

/// Text recognised by the winning engine.
#[derive(Debug, Clone)]
pub struct OcrOutcome {
    pub text: String,
    pub method: String,
    pub confidence: f64,
}

/// Tesseract via its command-line binary.
pub struct TesseractOcr {
    lang: String,
}

impl TesseractOcr {
    pub fn new(lang: &str) -> Self {
        Self {
            lang: lang.to_string(),
        }
    }
}

impl OcrEngine for TesseractOcr {
    fn name(&self) -> &'static str {
        "Tesseract OCR"
    }

    fn confidence(&self) -> f64 {
        0.80
    }

    fn is_available(&self) -> bool {
        check_binary("tesseract")
    }

    fn recognize(&self, image_path: &Path) -> Result<String, ExtractionError> {
        // --oem 3: default engine, --psm 6: treat the page as one uniform block
        let output = run_with_timeout(
            "tesseract",
            Command::new("tesseract")
                .arg(image_path)
                .arg("stdout")
                .args(["-l", &self.lang, "--oem", "3", "--psm", "6"]),
            TOOL_TIMEOUT,
        )
        .map_err(|e| tool_error(e, "tesseract not found (install tesseract-ocr)"))?;

        if !output.status.success() {
            return Err(ExtractionError::OcrFailed(format!(
                "tesseract failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Runs every available engine and returns the result with the most text.
/// Ties go to the engine listed first.
pub fn run_engines(
    engines: &[Arc<dyn OcrEngine>],
    image_path: &Path,
) -> Result<OcrOutcome, ExtractionError> {
    let mut best: Option<OcrOutcome> = None;

    for engine in engines.iter().filter(|e| e.is_available()) {
        match engine.recognize(image_path) {
            Ok(text) => {
                let longer = best
                    .as_ref()
                    .map(|b| text.chars().count() > b.text.chars().count())
                    .unwrap_or(true);
                if longer {
                    best = Some(OcrOutcome {
                        text,
                        method: engine.name().to_string(),
                        confidence: engine.confidence(),
                    });
                }
            }
            Err(e) => warn!("{} failed: {e}", engine.name()),
        }
    }

    best.ok_or(ExtractionError::NoOcrResult)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    struct FakeEngine {
        name: &'static str,
        output: Result<&'static str, ()>,
        available: bool,
    }

    impl OcrEngine for FakeEngine {
        fn name(&self) -> &'static str {
            self.name
        }
        fn confidence(&self) -> f64 {
            0.5
        }
        fn is_available(&self) -> bool {
            self.available
        }
        fn recognize(&self, _image_path: &Path) -> Result<String, ExtractionError> {
            self.output
                .map(String::from)
                .map_err(|_| ExtractionError::OcrFailed("boom".to_string()))
        }
    }

    fn engine(name: &'static str, output: Result<&'static str, ()>, available: bool) -> Arc<dyn OcrEngine> {
        Arc::new(FakeEngine {
            name,
            output,
            available,
        })
    }

    #[test]
    fn test_longest_text_wins() {
        let engines = vec![
            engine("short", Ok("Gross"), true),
            engine("long", Ok("Gross Pay: $5,000"), true),
        ];
        let outcome = run_engines(&engines, &PathBuf::from("x.png")).unwrap();
        assert_eq!(outcome.method, "long");
        assert_eq!(outcome.text, "Gross Pay: $5,000");
    }

    #[test]
    fn test_failed_engine_is_skipped() {
        let engines = vec![engine("broken", Err(()), true), engine("ok", Ok("text"), true)];
        let outcome = run_engines(&engines, &PathBuf::from("x.png")).unwrap();
        assert_eq!(outcome.method, "ok");
    }

    #[test]
    fn test_unavailable_engine_is_not_run() {
        let engines = vec![engine("missing", Ok("lots and lots of text"), false)];
        assert!(matches!(
            run_engines(&engines, &PathBuf::from("x.png")),
            Err(ExtractionError::NoOcrResult)
        ));
    }

    #[test]
    fn test_tie_keeps_first() {
        let engines = vec![engine("first", Ok("abc"), true), engine("second", Ok("xyz"), true)];
        let outcome = run_engines(&engines, &PathBuf::from("x.png")).unwrap();
        assert_eq!(outcome.method, "first");
    }
}
