//! Step layout of the intake form and the pure operations over `form_data`.
//!
//! `form_data` is a JSON object keyed by step (`{"personal": {...}, "loan": {...}}`).
//! Each step object holds whatever the client sent; only the required fields below
//! are checked, extra keys are kept as-is.

use serde::Serialize;
use serde_json::Value;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy)]
pub struct FormStep {
    pub key: &'static str,
    /// 1-based position in the form.
    pub number: i32,
    pub required: &'static [&'static str],
}

pub const STEPS: [FormStep; 5] = [
    FormStep {
        key: "personal",
        number: 1,
        required: &["first_name", "last_name", "date_of_birth", "email"],
    },
    FormStep {
        key: "employment",
        number: 2,
        required: &["employment_status", "employer_name", "years_employed"],
    },
    FormStep {
        key: "financial",
        number: 3,
        required: &["annual_income", "monthly_debts", "credit_score"],
    },
    FormStep {
        key: "property",
        number: 4,
        required: &["property_address", "property_value", "property_type"],
    },
    FormStep {
        key: "loan",
        number: 5,
        required: &["loan_amount", "loan_term_years", "loan_purpose"],
    },
];

pub fn find_step(key: &str) -> Option<&'static FormStep> {
    STEPS.iter().find(|s| s.key == key)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StepProgress {
    pub step: &'static str,
    pub number: i32,
    pub complete: bool,
    pub missing_fields: Vec<&'static str>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FormProgress {
    pub steps: Vec<StepProgress>,
    pub completed_steps: usize,
    pub total_steps: usize,
}

impl FormProgress {
    pub fn is_complete(&self) -> bool {
        self.completed_steps == self.total_steps
    }

    /// Flat `step.field` list of everything still missing.
    pub fn missing(&self) -> Vec<String> {
        self.steps
            .iter()
            .flat_map(|s| s.missing_fields.iter().map(move |f| format!("{}.{}", s.step, f)))
            .collect()
    }
}

/// Null, blank strings and empty arrays/objects count as not filled in.
fn is_filled(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

pub fn progress(form_data: &Value) -> FormProgress {
    let steps: Vec<StepProgress> = STEPS
        .iter()
        .map(|step| {
            let section = form_data.get(step.key);
            let missing_fields: Vec<&'static str> = step
                .required
                .iter()
                .copied()
                .filter(|field| !section.and_then(|s| s.get(*field)).map(is_filled).unwrap_or(false))
                .collect();
            StepProgress {
                step: step.key,
                number: step.number,
                complete: missing_fields.is_empty(),
                missing_fields,
            }
        })
        .collect();

    FormProgress {
        completed_steps: steps.iter().filter(|s| s.complete).count(),
        total_steps: steps.len(),
        steps,
    }
}

/// Checks that the data sent for a step is a JSON object. The store merges it shallowly
/// into `form_data[step]`, keys in `data` overwriting existing ones.
pub fn step_payload(step: &FormStep, data: Value) -> Result<Value, AppError> {
    match data {
        Value::Object(_) => Ok(data),
        _ => Err(AppError::Validation(format!(
            "Data for step '{}' must be a JSON object",
            step.key
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn complete_form() -> Value {
        json!({
            "personal": {"first_name": "Jane", "last_name": "Citizen", "date_of_birth": "1990-04-01", "email": "jane@example.com"},
            "employment": {"employment_status": "full_time", "employer_name": "Acme", "years_employed": 4},
            "financial": {"annual_income": "$120,000", "monthly_debts": 800, "credit_score": 745},
            "property": {"property_address": "1 Main St", "property_value": 600000, "property_type": "house"},
            "loan": {"loan_amount": 480000, "loan_term_years": 30, "loan_purpose": "purchase"}
        })
    }

    #[test]
    fn test_find_step() {
        assert_eq!(find_step("financial").map(|s| s.number), Some(3));
        assert!(find_step("pets").is_none());
    }

    #[test]
    fn test_empty_form_progress() {
        let p = progress(&json!({}));
        assert_eq!(p.completed_steps, 0);
        assert_eq!(p.total_steps, 5);
        assert_eq!(p.missing().len(), 16);
        assert_eq!(p.missing()[0], "personal.first_name");
    }

    #[test]
    fn test_complete_form_progress() {
        let p = progress(&complete_form());
        assert!(p.is_complete());
        assert!(p.missing().is_empty());
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        let mut form = complete_form();
        form["personal"]["email"] = json!("   ");
        form["loan"]["loan_purpose"] = Value::Null;
        let p = progress(&form);
        assert_eq!(p.missing(), vec!["personal.email", "loan.loan_purpose"]);
        assert_eq!(p.completed_steps, 3);
    }

    #[test]
    fn test_step_payload_accepts_objects_only() {
        let step = find_step("loan").unwrap();
        assert_eq!(
            step_payload(step, json!({"loan_amount": 1})).unwrap(),
            json!({"loan_amount": 1})
        );
        assert!(step_payload(step, json!([1, 2])).is_err());
        assert!(step_payload(step, json!("loan")).is_err());
        assert!(step_payload(step, Value::Null).is_err());
    }
}
