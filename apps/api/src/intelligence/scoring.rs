use crate::intelligence::classify::DocumentKind;
use crate::intelligence::fields::ExtractedFields;

const BASE_CONFIDENCE: f64 = 0.5;
const COMMON_FIELD_BONUS: f64 = 0.05;

/// Per-kind bonus for each key field that was found.
fn key_field_boosts(kind: DocumentKind) -> &'static [(&'static str, f64)] {
    match kind {
        DocumentKind::Identity => &[
            ("full_name", 0.2),
            ("date_of_birth", 0.2),
            ("document_number", 0.1),
        ],
        DocumentKind::Income => &[
            ("gross_income", 0.2),
            ("employer", 0.2),
            ("net_income", 0.1),
        ],
        DocumentKind::BankStatement => &[("account_balance", 0.2), ("account_number", 0.2)],
        DocumentKind::Property | DocumentKind::General => &[],
    }
}

/// Confidence that the analysis captured the document: 0.0 when nothing was found,
/// otherwise a 0.5 base plus field bonuses, capped at 1.0.
pub fn analysis_confidence(fields: &ExtractedFields, kind: DocumentKind) -> f64 {
    if fields.is_empty() {
        return 0.0;
    }

    let mut confidence = BASE_CONFIDENCE;
    for (key, boost) in key_field_boosts(kind) {
        if fields.contains_key(*key) {
            confidence += boost;
        }
    }
    for key in ["dates_found", "phone_numbers", "email_addresses"] {
        if fields.contains_key(key) {
            confidence += COMMON_FIELD_BONUS;
        }
    }

    confidence.min(1.0)
}

/// Human-readable hints for improving a weak extraction.
pub fn build_suggestions(fields: &ExtractedFields, kind: DocumentKind) -> Vec<String> {
    let mut suggestions = Vec::new();

    if fields.len() < 2 {
        suggestions.push(
            "Consider using a higher quality scan or image for better text extraction.".to_string(),
        );
        suggestions
            .push("Ensure the document is well-lit and all text is clearly visible.".to_string());
    }

    let missing_key = match kind {
        DocumentKind::Identity if !fields.contains_key("full_name") => Some(
            "Name not clearly detected. Please ensure the name field is visible and not obscured.",
        ),
        DocumentKind::Income if !fields.contains_key("gross_income") => Some(
            "Income amount not detected. Please ensure salary/wage information is clearly visible.",
        ),
        DocumentKind::BankStatement if !fields.contains_key("account_balance") => Some(
            "Account balance not detected. Please ensure the balance information is clearly visible.",
        ),
        DocumentKind::Property if !fields.contains_key("property_value") => Some(
            "Property value not detected. Please ensure the valuation amount is clearly visible.",
        ),
        _ => None,
    };
    if let Some(hint) = missing_key {
        suggestions.push(hint.to_string());
    }

    if suggestions.is_empty() {
        suggestions.push(
            "Document processed successfully. Review extracted information for accuracy."
                .to_string(),
        );
    }

    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intelligence::fields::FieldValue;

    fn fields_with(keys: &[&str]) -> ExtractedFields {
        keys.iter()
            .map(|k| (k.to_string(), FieldValue::Text("x".to_string())))
            .collect()
    }

    #[test]
    fn test_no_fields_is_zero() {
        assert_eq!(analysis_confidence(&ExtractedFields::new(), DocumentKind::Identity), 0.0);
    }

    #[test]
    fn test_identity_full_house_is_capped() {
        let fields = fields_with(&[
            "full_name",
            "date_of_birth",
            "document_number",
            "dates_found",
            "phone_numbers",
            "email_addresses",
        ]);
        assert_eq!(analysis_confidence(&fields, DocumentKind::Identity), 1.0);
    }

    #[test]
    fn test_bank_partial() {
        let fields = fields_with(&["account_balance", "dates_found"]);
        let c = analysis_confidence(&fields, DocumentKind::BankStatement);
        assert!((c - 0.75).abs() < 1e-9, "confidence was {c}");
    }

    #[test]
    fn test_general_only_common_bonuses() {
        let fields = fields_with(&["amounts_found", "email_addresses"]);
        let c = analysis_confidence(&fields, DocumentKind::General);
        assert!((c - 0.55).abs() < 1e-9, "confidence was {c}");
    }

    #[test]
    fn test_suggestions_for_sparse_result() {
        let s = build_suggestions(&fields_with(&["dates_found"]), DocumentKind::Income);
        assert_eq!(s.len(), 3);
        assert!(s[2].contains("Income amount"));
    }

    #[test]
    fn test_suggestions_success_message() {
        let s = build_suggestions(
            &fields_with(&["full_name", "date_of_birth"]),
            DocumentKind::Identity,
        );
        assert_eq!(s.len(), 1);
        assert!(s[0].starts_with("Document processed successfully"));
    }

    #[test]
    fn test_suggestions_missing_balance() {
        let s = build_suggestions(
            &fields_with(&["account_number", "dates_found"]),
            DocumentKind::BankStatement,
        );
        assert_eq!(s.len(), 1);
        assert!(s[0].contains("Account balance"));
    }
}
