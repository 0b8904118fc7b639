//! Regex field extraction per document kind.
//!
//! Scalar fields take the first pattern that matches; list fields collect every
//! match in pattern order, de-duplicated, and capped.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::intelligence::classify::DocumentKind;

const MAX_DATES: usize = 5;
const MAX_PHONES: usize = 3;
const MAX_EMAILS: usize = 3;
const MAX_AMOUNTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

pub type ExtractedFields = BTreeMap<String, FieldValue>;

fn compile<S: AsRef<str>>(patterns: &[S]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p.as_ref()).expect("field pattern must compile"))
        .collect()
}

const AMOUNT: &str = r"\$?(\d[\d,]*(?:\.\d+)?)";

static NAME: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)name[:\s]+([A-Z][a-z]+ [A-Z][a-z]+)",
        r"(?i)([A-Z][A-Z\s]+)\s+(?:DOB|Date of Birth)",
    ])
});
static DATE_OF_BIRTH: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)(?:DOB|Date of Birth)[:\s]+(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
        r"\b(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})\b",
    ])
});
static DOCUMENT_NUMBER: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)\b(?:licen[cs]e|passport|id)\b(?:\s*(?:no\.?|number|#))?[:\s#]*([A-Z0-9]*\d[A-Z0-9]*)",
        r"(?i)\b([A-Z]{1,2}\d{6,})\b",
    ])
});

static GROSS_INCOME: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        &format!(r"(?i)gross(?:\s+(?:pay|income|salary|earnings))?[:\s]+{AMOUNT}"),
        &format!(r"(?i)total(?:\s+(?:pay|earnings))?[:\s]+{AMOUNT}"),
    ])
});
static NET_INCOME: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        &format!(r"(?i)\bnet(?:\s+(?:pay|income|salary))?[:\s]+{AMOUNT}"),
        &format!(r"(?i)take[\s-]home(?:\s+pay)?[:\s]+{AMOUNT}"),
    ])
});
static EMPLOYER: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)employer(?:\s+name)?[:\t ]+([A-Za-z][A-Za-z &.,']*)",
        r"(?i)company(?:\s+name)?[:\t ]+([A-Za-z][A-Za-z &.,']*)",
    ])
});

static ACCOUNT_BALANCE: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[&format!(
        r"(?i)(?:current\s+|closing\s+|available\s+)?balance[:\s]+{AMOUNT}"
    )])
});
static ACCOUNT_NUMBER: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)account(?:\s*(?:no\.?|number|#))?[:\s#]*(\d{6,})",
        r"(\d{3}-\d{3}-\d{3,})",
    ])
});

static PROPERTY_VALUE: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        &format!(r"(?i)value[:\s]+{AMOUNT}"),
        &format!(r"(?i)valuation(?:\s+amount)?[:\s]+{AMOUNT}"),
    ])
});
static PROPERTY_ADDRESS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)(\d+\s+[A-Za-z ]+?\s(?:Street|St|Road|Rd|Avenue|Ave|Drive|Dr|Lane|Ln|Court|Ct|Place|Pl|Boulevard|Blvd)\b)",
    ])
});

static DATES: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"\b(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})\b",
        r"\b(\d{4}-\d{2}-\d{2})\b",
        r"(?i)\b(\d{1,2}\s+(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\s+\d{2,4})\b",
    ])
});
static PHONES: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"\b(\d{3}[-.\s]?\d{3}[-.\s]?\d{4})\b",
        r"(\(\d{3}\)\s*\d{3}[-.\s]?\d{4})\b",
    ])
});
static EMAILS: Lazy<Vec<Regex>> =
    Lazy::new(|| compile(&[r"([a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,})"]));
static AMOUNTS: Lazy<Vec<Regex>> = Lazy::new(|| compile(&[r"(\$\d[\d,]*(?:\.\d+)?)"]));

/// First capture of the first pattern that matches.
fn first_match(patterns: &[Regex], text: &str) -> Option<String> {
    patterns.iter().find_map(|re| {
        re.captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

/// Every capture of every pattern, in pattern order, de-duplicated.
fn all_matches(patterns: &[Regex], text: &str, limit: usize) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for re in patterns {
        for caps in re.captures_iter(text) {
            if let Some(m) = caps.get(1) {
                let value = m.as_str().trim().to_string();
                if !found.contains(&value) {
                    found.push(value);
                }
            }
        }
    }
    found.truncate(limit);
    found
}

fn put_text(fields: &mut ExtractedFields, key: &str, value: Option<String>) {
    if let Some(v) = value {
        fields.insert(key.to_string(), FieldValue::Text(v));
    }
}

fn put_list(fields: &mut ExtractedFields, key: &str, values: Vec<String>) {
    if !values.is_empty() {
        fields.insert(key.to_string(), FieldValue::List(values));
    }
}

/// Extracts kind-specific fields plus the common ones found in any document.
pub fn extract_fields(text: &str, kind: DocumentKind) -> ExtractedFields {
    let mut fields = ExtractedFields::new();

    match kind {
        DocumentKind::Identity => {
            put_text(&mut fields, "full_name", first_match(&NAME, text));
            put_text(&mut fields, "date_of_birth", first_match(&DATE_OF_BIRTH, text));
            put_text(&mut fields, "document_number", first_match(&DOCUMENT_NUMBER, text));
        }
        DocumentKind::Income => {
            put_text(&mut fields, "gross_income", first_match(&GROSS_INCOME, text));
            put_text(&mut fields, "net_income", first_match(&NET_INCOME, text));
            put_text(
                &mut fields,
                "employer",
                first_match(&EMPLOYER, text).map(|e| clean_name(&e)),
            );
        }
        DocumentKind::BankStatement => {
            put_text(&mut fields, "account_balance", first_match(&ACCOUNT_BALANCE, text));
            put_text(&mut fields, "account_number", first_match(&ACCOUNT_NUMBER, text));
        }
        DocumentKind::Property => {
            put_text(&mut fields, "property_value", first_match(&PROPERTY_VALUE, text));
            put_text(&mut fields, "property_address", first_match(&PROPERTY_ADDRESS, text));
        }
        DocumentKind::General => {}
    }

    put_list(&mut fields, "dates_found", all_matches(&DATES, text, MAX_DATES));
    put_list(&mut fields, "phone_numbers", all_matches(&PHONES, text, MAX_PHONES));
    put_list(&mut fields, "email_addresses", all_matches(&EMAILS, text, MAX_EMAILS));
    put_list(&mut fields, "amounts_found", all_matches(&AMOUNTS, text, MAX_AMOUNTS));

    fields
}

fn clean_name(raw: &str) -> String {
    raw.trim_end_matches(|c: char| c == ',' || c == '.' || c.is_whitespace())
        .to_string()
}
