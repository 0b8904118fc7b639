// Prompt constants for the document review step.
// Reuses cross-cutting fragments from llm_client::prompts.

/// System prompt for document review. Combined with `JSON_ONLY_SYSTEM` at call time.
pub const REVIEW_SYSTEM: &str = "You are a mortgage document analyst. \
    You review text extracted from documents submitted with a home loan application \
    and summarise what an underwriter would want to know.";

/// Review prompt template. Replace `{document_type}`, `{fields}` and `{text}` before sending.
pub const REVIEW_PROMPT_TEMPLATE: &str = r#"Review this {document_type} submitted with a mortgage application.

Fields already extracted by rule-based analysis (may be incomplete or wrong):
{fields}

Document text:
"""
{text}
"""

Return a JSON object with this EXACT schema (no extra fields):
{
  "summary": "One or two sentences describing the document.",
  "key_findings": ["Gross monthly income of $6,250 from Acme Holdings"],
  "risk_flags": ["Pay date is more than 90 days old"],
  "recommended_actions": ["Request the two most recent payslips"]
}

Rules:
- Only state facts present in the document text.
- Use empty arrays when there is nothing to report.
- Do not guess values that are not in the text."#;
