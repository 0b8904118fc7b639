// Users: applicants, brokers and admins. Identity only; there is no login here,
// callers pass their user id with each request.

pub mod handlers;
pub mod store;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRole {
    Customer,
    Broker,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Customer => "customer",
            UserRole::Broker => "broker",
            UserRole::Admin => "admin",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, AppError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "customer" => Ok(UserRole::Customer),
            "broker" => Ok(UserRole::Broker),
            "admin" => Ok(UserRole::Admin),
            other => Err(AppError::Validation(format!(
                "Invalid role '{other}'. Expected customer, broker or admin"
            ))),
        }
    }
}

/// Lowercased, trimmed email. Rejects anything without a local part and a domain.
pub fn normalize_email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    };
    if !valid {
        return Err(AppError::Validation(format!("Invalid email address: {raw}")));
    }
    Ok(email)
}

pub fn require_name(raw: &str) -> Result<String, AppError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::Validation("full_name cannot be empty".to_string()));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Jane@Example.COM ").unwrap(), "jane@example.com");
        assert!(normalize_email("jane.example.com").is_err());
        assert!(normalize_email("@example.com").is_err());
        assert!(normalize_email("jane@").is_err());
        assert!(normalize_email("a@b@c").is_err());
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(UserRole::parse("Broker").unwrap(), UserRole::Broker);
        assert_eq!(UserRole::parse("customer").unwrap().as_str(), "customer");
        assert!(UserRole::parse("superuser").is_err());
    }

    #[test]
    fn test_require_name() {
        assert_eq!(require_name("  Jane Citizen ").unwrap(), "Jane Citizen");
        assert!(require_name("   ").is_err());
    }
}
