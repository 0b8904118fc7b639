use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::intelligence::prompts::{REVIEW_PROMPT_TEMPLATE, REVIEW_SYSTEM};
use crate::intelligence::DocumentAnalysis;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{LlmClient, LlmError};

/// Text beyond this many characters is not sent for review.
const MAX_REVIEW_CHARS: usize = 8000;

/// Structured LLM opinion on a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmReview {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub key_findings: Vec<String>,
    #[serde(default)]
    pub risk_flags: Vec<String>,
    #[serde(default)]
    pub recommended_actions: Vec<String>,
}

/// Asks the LLM to review extracted text. Never fails: any error is logged and
/// reported as `None` so the rule-based analysis still goes out.
pub async fn review_document(
    llm: &LlmClient,
    text: &str,
    analysis: &DocumentAnalysis,
) -> Option<LlmReview> {
    if text.trim().is_empty() {
        return None;
    }

    match request_review(llm, text, analysis).await {
        Ok(review) => {
            info!(
                "LLM review complete for {}: {} findings, {} flags",
                analysis.document_type.as_str(),
                review.key_findings.len(),
                review.risk_flags.len()
            );
            Some(review)
        }
        Err(e) => {
            warn!("LLM document review failed: {e}");
            None
        }
    }
}

async fn request_review(
    llm: &LlmClient,
    text: &str,
    analysis: &DocumentAnalysis,
) -> Result<LlmReview, LlmError> {
    let prompt = build_review_prompt(text, analysis)?;
    let system = format!("{REVIEW_SYSTEM}\n\n{JSON_ONLY_SYSTEM}");
    llm.call_json(&prompt, &system).await
}

fn build_review_prompt(text: &str, analysis: &DocumentAnalysis) -> Result<String, LlmError> {
    let fields = serde_json::to_string_pretty(&analysis.fields)?;
    Ok(REVIEW_PROMPT_TEMPLATE
        .replace("{document_type}", &analysis.document_type.as_str().replace('_', " "))
        .replace("{fields}", &fields)
        .replace("{text}", truncate_chars(text, MAX_REVIEW_CHARS)))
}

/// Cuts `text` to at most `max` characters without splitting a code point.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intelligence::analyze_text;

    #[test]
    fn test_truncate_short_text_untouched() {
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let text = "ééééé";
        assert_eq!(truncate_chars(text, 3), "ééé");
    }

    #[test]
    fn test_review_prompt_fills_placeholders() {
        let text = "Gross Pay: $6,250.00\nEmployer: Acme Holdings";
        let analysis = analyze_text(text, "payslip.pdf");
        let prompt = build_review_prompt(text, &analysis).unwrap();
        assert!(prompt.contains("income document"));
        assert!(prompt.contains("gross_income"));
        assert!(prompt.contains("Acme Holdings"));
        assert!(!prompt.contains("{text}"));
    }

    #[test]
    fn test_review_tolerates_missing_keys() {
        let review: LlmReview = serde_json::from_str(r#"{"summary": "A payslip."}"#).unwrap();
        assert_eq!(review.summary, "A payslip.");
        assert!(review.risk_flags.is_empty());
    }

    #[tokio::test]
    async fn test_empty_text_skips_review() {
        let llm = LlmClient::new("test-key".to_string()).unwrap();
        let analysis = analyze_text("", "blank.pdf");
        assert!(review_document(&llm, "   ", &analysis).await.is_none());
    }
}
