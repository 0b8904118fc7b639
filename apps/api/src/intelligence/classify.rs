use serde::{Deserialize, Serialize};

/// Detected kind of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentKind {
    #[serde(rename = "identity_document")]
    Identity,
    #[serde(rename = "income_document")]
    Income,
    #[serde(rename = "bank_statement")]
    BankStatement,
    #[serde(rename = "property_document")]
    Property,
    #[serde(rename = "general_document")]
    General,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Identity => "identity_document",
            DocumentKind::Income => "income_document",
            DocumentKind::BankStatement => "bank_statement",
            DocumentKind::Property => "property_document",
            DocumentKind::General => "general_document",
        }
    }
}

/// Filename substrings, checked in order. `id` is handled separately as a whole token.
const FILENAME_KEYWORDS: &[(DocumentKind, &[&str])] = &[
    (DocumentKind::Identity, &["passport", "license", "licence", "driver"]),
    (DocumentKind::Income, &["payslip", "salary", "income", "pay"]),
    (DocumentKind::BankStatement, &["bank", "statement", "account"]),
    (DocumentKind::Property, &["property", "valuation", "appraisal"]),
];

const CONTENT_KEYWORDS: &[(DocumentKind, &[&str])] = &[
    (
        DocumentKind::Identity,
        &["passport", "driver license", "driver licence", "identification"],
    ),
    (
        DocumentKind::Income,
        &["gross pay", "net pay", "salary", "wages"],
    ),
    (
        DocumentKind::BankStatement,
        &["account balance", "transaction", "deposit", "withdrawal"],
    ),
    (
        DocumentKind::Property,
        &["property value", "valuation", "appraisal"],
    ),
];

/// Classifies by filename first, then by content keywords.
pub fn classify_document(text: &str, filename: &str) -> DocumentKind {
    classify_by_filename(filename)
        .or_else(|| classify_by_content(text))
        .unwrap_or(DocumentKind::General)
}

fn classify_by_filename(filename: &str) -> Option<DocumentKind> {
    let lower = filename.to_lowercase();
    let has_id_token = lower
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|token| token == "id");

    for (kind, keywords) in FILENAME_KEYWORDS {
        if *kind == DocumentKind::Identity && has_id_token {
            return Some(*kind);
        }
        if keywords.iter().any(|k| lower.contains(k)) {
            return Some(*kind);
        }
    }
    None
}

fn classify_by_content(text: &str) -> Option<DocumentKind> {
    let lower = text.to_lowercase();
    CONTENT_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(kind, _)| *kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_wins_over_content() {
        assert_eq!(
            classify_document("gross pay 5,000", "passport_scan.jpg"),
            DocumentKind::Identity
        );
    }

    #[test]
    fn test_id_must_be_whole_token() {
        assert_eq!(classify_document("", "drivers-id.png"), DocumentKind::Identity);
        assert_eq!(classify_document("", "national_ID_front.jpg"), DocumentKind::Identity);
        // "paid" contains "id" but is not an identity document
        assert_eq!(classify_document("", "paid_invoice.pdf"), DocumentKind::General);
        assert_eq!(classify_document("", "video.png"), DocumentKind::General);
    }

    #[test]
    fn test_filename_income_and_bank() {
        assert_eq!(classify_document("", "Payslip-March.pdf"), DocumentKind::Income);
        assert_eq!(
            classify_document("", "anz_statement_q1.pdf"),
            DocumentKind::BankStatement
        );
        assert_eq!(
            classify_document("", "home-valuation.pdf"),
            DocumentKind::Property
        );
    }

    #[test]
    fn test_content_fallback() {
        assert_eq!(
            classify_document("Closing ACCOUNT BALANCE: $1,200", "scan001.pdf"),
            DocumentKind::BankStatement
        );
        assert_eq!(
            classify_document("Annual salary review letter", "letter.pdf"),
            DocumentKind::Income
        );
        assert_eq!(
            classify_document("Independent appraisal of the dwelling", "doc.pdf"),
            DocumentKind::Property
        );
    }

    #[test]
    fn test_general_when_nothing_matches() {
        assert_eq!(
            classify_document("Lorem ipsum dolor sit amet", "notes.pdf"),
            DocumentKind::General
        );
    }

    #[test]
    fn test_serializes_to_wire_names() {
        assert_eq!(
            serde_json::to_string(&DocumentKind::BankStatement).unwrap(),
            "\"bank_statement\""
        );
        assert_eq!(DocumentKind::Identity.as_str(), "identity_document");
    }
}
