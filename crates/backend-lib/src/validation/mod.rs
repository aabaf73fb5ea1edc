// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Request input validation.

use crate::auth::{validate_password_strength, PasswordRequirements};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

pub const MAX_PASSWORD_LENGTH: usize = 128;
pub const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321 SMTP limit

static EMAIL_REGEX: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}$"));

/// Possible validation errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    #[error("Missing field: {0}")]
    MissingField(&'static str),
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Canonical form used for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate an already normalised email
pub fn validate_email(email: &str) -> ValidationResult<&str> {
    if email.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "Email must not be empty".to_string(),
        ));
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::InvalidEmail(format!(
            "Email must be at most {MAX_EMAIL_LENGTH} characters"
        )));
    }

    let well_formed = EMAIL_REGEX
        .as_ref()
        .is_ok_and(|pattern| pattern.is_match(email));
    if !well_formed {
        return Err(ValidationError::InvalidEmail(
            "Email format is invalid".to_string(),
        ));
    }

    Ok(email)
}

/// Validate a new password against `requirements`
pub fn validate_password<'a>(
    password: &'a str,
    requirements: &PasswordRequirements,
) -> ValidationResult<&'a str> {
    if password.chars().count() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::InvalidPassword(format!(
            "Password must be at most {MAX_PASSWORD_LENGTH} characters"
        )));
    }

    if !validate_password_strength(password, requirements) {
        return Err(ValidationError::InvalidPassword(format!(
            "Password must be at least {} characters and meet the complexity requirements",
            requirements.min_length
        )));
    }

    Ok(password)
}

/// Check a registration request, returning the normalised email
pub fn validate_registration(
    email: &str,
    password: &str,
    requirements: &PasswordRequirements,
) -> ValidationResult<String> {
    let email = normalize_email(email);
    validate_email(&email)?;
    validate_password(password, requirements)?;
    Ok(email)
}

/// Check a login request, returning the normalised email.
///
/// Only presence is checked; anything else is left to credential
/// verification so a malformed email looks like a wrong one.
pub fn validate_login(email: &str, password: &str) -> ValidationResult<String> {
    let email = normalize_email(email);
    if email.is_empty() {
        return Err(ValidationError::MissingField("email"));
    }
    if password.is_empty() {
        return Err(ValidationError::MissingField("password"));
    }
    Ok(email)
}
