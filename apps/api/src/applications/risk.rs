//! Threshold-based risk assessment over the application form.
//!
//! Points accumulate per factor (higher is riskier). Missing or unparsable inputs
//! add a fixed penalty and the ratios that depend on them are skipped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const MISSING_INPUT_POINTS: u32 = 10;
const MAX_SCORE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: u32) -> Self {
        match score {
            0..=24 => RiskLevel::Low,
            25..=49 => RiskLevel::Medium,
            _ => RiskLevel::High,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub factor: String,
    pub points: u32,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    pub loan_to_value: Option<f64>,
    pub debt_to_income: Option<f64>,
    pub loan_to_income: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub score: u32,
    pub level: RiskLevel,
    pub factors: Vec<RiskFactor>,
    pub metrics: RiskMetrics,
    pub assessed_at: DateTime<Utc>,
}

/// Numeric inputs pulled from the form. `None` means missing or invalid.
#[derive(Debug, Default)]
struct RiskInputs {
    loan_amount: Option<f64>,
    property_value: Option<f64>,
    annual_income: Option<f64>,
    monthly_debts: Option<f64>,
    credit_score: Option<f64>,
    years_employed: Option<f64>,
}

/// Parses numbers given as JSON numbers or as strings like `"$450,000"` or `"5.5 years"`.
pub fn parse_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .chars()
                .take_while(|c| !c.is_alphabetic())
                .filter(|c| !matches!(c, '$' | ',' | ' ' | '_'))
                .collect();
            cleaned.parse::<f64>().ok()?
        }
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn field(form: &Value, step: &str, name: &str) -> Option<f64> {
    form.get(step).and_then(|s| s.get(name)).and_then(parse_number)
}

fn positive(v: Option<f64>) -> Option<f64> {
    v.filter(|n| *n > 0.0)
}

fn non_negative(v: Option<f64>) -> Option<f64> {
    v.filter(|n| *n >= 0.0)
}

impl RiskInputs {
    fn from_form(form: &Value) -> Self {
        Self {
            loan_amount: positive(field(form, "loan", "loan_amount")),
            property_value: positive(field(form, "property", "property_value")),
            annual_income: positive(field(form, "financial", "annual_income")),
            monthly_debts: non_negative(field(form, "financial", "monthly_debts")),
            credit_score: positive(field(form, "financial", "credit_score")),
            years_employed: non_negative(field(form, "employment", "years_employed")),
        }
    }
}

/// Walks a descending threshold ladder and returns the points of the first rung exceeded.
fn ladder_above(value: f64, rungs: &[(f64, u32)]) -> Option<u32> {
    rungs.iter().find(|(limit, _)| value > *limit).map(|(_, p)| *p)
}

/// Ascending ladder: points of the first rung `value` is below.
fn ladder_below(value: f64, rungs: &[(f64, u32)]) -> Option<u32> {
    rungs.iter().find(|(limit, _)| value < *limit).map(|(_, p)| *p)
}

pub fn assess(form: &Value, now: DateTime<Utc>) -> RiskAssessment {
    let inputs = RiskInputs::from_form(form);
    let mut factors = Vec::new();

    let missing = [
        ("loan_amount", inputs.loan_amount),
        ("property_value", inputs.property_value),
        ("annual_income", inputs.annual_income),
        ("monthly_debts", inputs.monthly_debts),
        ("credit_score", inputs.credit_score),
        ("years_employed", inputs.years_employed),
    ];
    for (name, value) in missing {
        if value.is_none() {
            factors.push(RiskFactor {
                factor: format!("missing_{name}"),
                points: MISSING_INPUT_POINTS,
                reason: format!("{name} is missing or invalid"),
            });
        }
    }

    let loan_to_value = inputs
        .loan_amount
        .zip(inputs.property_value)
        .map(|(loan, value)| loan / value);
    let debt_to_income = inputs
        .monthly_debts
        .zip(inputs.annual_income)
        .map(|(debts, income)| debts * 12.0 / income);
    let loan_to_income = inputs
        .loan_amount
        .zip(inputs.annual_income)
        .map(|(loan, income)| loan / income);

    if let Some(ltv) = loan_to_value {
        if let Some(points) = ladder_above(ltv, &[(0.95, 30), (0.90, 20), (0.80, 10)]) {
            factors.push(RiskFactor {
                factor: "loan_to_value".to_string(),
                points,
                reason: format!("Loan-to-value ratio of {:.1}%", ltv * 100.0),
            });
        }
    }

    if let Some(dti) = debt_to_income {
        if let Some(points) = ladder_above(dti, &[(0.43, 25), (0.36, 15)]) {
            factors.push(RiskFactor {
                factor: "debt_to_income".to_string(),
                points,
                reason: format!("Debt-to-income ratio of {:.1}%", dti * 100.0),
            });
        }
    }

    if let Some(lti) = loan_to_income {
        if let Some(points) = ladder_above(lti, &[(6.0, 20), (4.5, 10)]) {
            factors.push(RiskFactor {
                factor: "loan_to_income".to_string(),
                points,
                reason: format!("Loan is {lti:.1}x annual income"),
            });
        }
    }

    if let Some(credit) = inputs.credit_score {
        if let Some(points) = ladder_below(credit, &[(580.0, 30), (670.0, 15), (740.0, 5)]) {
            factors.push(RiskFactor {
                factor: "credit_score".to_string(),
                points,
                reason: format!("Credit score of {credit:.0}"),
            });
        }
    }

    if let Some(years) = inputs.years_employed {
        if let Some(points) = ladder_below(years, &[(1.0, 15), (2.0, 5)]) {
            factors.push(RiskFactor {
                factor: "employment_history".to_string(),
                points,
                reason: format!("{years} years with current employer"),
            });
        }
    }

    let score = factors.iter().map(|f| f.points).sum::<u32>().min(MAX_SCORE);

    RiskAssessment {
        score,
        level: RiskLevel::from_score(score),
        factors,
        metrics: RiskMetrics {
            loan_to_value,
            debt_to_income,
            loan_to_income,
        },
        assessed_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form(loan: Value, value: Value, income: Value, debts: Value, credit: Value, years: Value) -> Value {
        json!({
            "loan": {"loan_amount": loan},
            "property": {"property_value": value},
            "financial": {"annual_income": income, "monthly_debts": debts, "credit_score": credit},
            "employment": {"years_employed": years}
        })
    }

    fn factor_points(a: &RiskAssessment, name: &str) -> Option<u32> {
        a.factors.iter().find(|f| f.factor == name).map(|f| f.points)
    }

    #[test]
    fn test_parse_number_lenient() {
        assert_eq!(parse_number(&json!("$450,000")), Some(450000.0));
        assert_eq!(parse_number(&json!(" 5.5 years")), Some(5.5));
        assert_eq!(parse_number(&json!(720)), Some(720.0));
        assert_eq!(parse_number(&json!("n/a")), None);
        assert_eq!(parse_number(&json!(null)), None);
        assert_eq!(parse_number(&json!(true)), None);
    }

    #[test]
    fn test_low_risk_profile() {
        let a = assess(
            &form(json!(400000), json!(600000), json!(120000), json!(500), json!(780), json!(6)),
            Utc::now(),
        );
        assert_eq!(a.score, 0);
        assert_eq!(a.level, RiskLevel::Low);
        assert!(a.factors.is_empty());
        let ltv = a.metrics.loan_to_value.unwrap();
        assert!((ltv - 0.6667).abs() < 1e-3);
    }

    #[test]
    fn test_threshold_ladders() {
        // LTV 0.92, DTI 0.40, LTI 5.0, credit 650, 1.5 years
        let a = assess(
            &form(json!(460000), json!(500000), json!(92000), json!(3066.67), json!(650), json!(1.5)),
            Utc::now(),
        );
        assert_eq!(factor_points(&a, "loan_to_value"), Some(20));
        assert_eq!(factor_points(&a, "debt_to_income"), Some(15));
        assert_eq!(factor_points(&a, "loan_to_income"), Some(10));
        assert_eq!(factor_points(&a, "credit_score"), Some(15));
        assert_eq!(factor_points(&a, "employment_history"), Some(5));
        assert_eq!(a.score, 65);
        assert_eq!(a.level, RiskLevel::High);
    }

    #[test]
    fn test_boundaries_are_strict() {
        // LTV exactly 0.80 and credit exactly 740 add nothing
        let a = assess(
            &form(json!(400000), json!(500000), json!(200000), json!(0), json!(740), json!(2)),
            Utc::now(),
        );
        assert_eq!(a.score, 0);
    }

    #[test]
    fn test_missing_inputs_penalised_and_ratios_skipped() {
        let a = assess(&json!({"loan": {"loan_amount": "$300,000"}}), Utc::now());
        assert_eq!(a.factors.len(), 5);
        assert!(a.factors.iter().all(|f| f.points == 10));
        assert_eq!(a.score, 50);
        assert_eq!(a.level, RiskLevel::High);
        assert_eq!(a.metrics, RiskMetrics::default());
    }

    #[test]
    fn test_zero_income_is_invalid_not_a_division() {
        let a = assess(
            &form(json!(300000), json!(500000), json!(0), json!(100), json!(760), json!(5)),
            Utc::now(),
        );
        assert_eq!(factor_points(&a, "missing_annual_income"), Some(10));
        assert!(a.metrics.debt_to_income.is_none());
        assert!(a.metrics.loan_to_income.is_none());
    }

    #[test]
    fn test_score_is_capped() {
        let a = assess(
            &form(json!(990000), json!(1000000), json!(100000), json!(5000), json!(500), json!(0.5)),
            Utc::now(),
        );
        // 30 + 25 + 20 + 30 + 15 = 120
        assert_eq!(a.score, 100);
        assert_eq!(a.level, RiskLevel::High);
    }

    #[test]
    fn test_level_bands() {
        assert_eq!(RiskLevel::from_score(24), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(25), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(49), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(50), RiskLevel::High);
    }
}
