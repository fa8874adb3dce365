// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Request field validation module.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

// Common validation constants
const MIN_USERNAME_LENGTH: usize = 3;
const MAX_USERNAME_LENGTH: usize = 50;
const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321 SMTP limit
const MAX_PASSWORD_LENGTH: usize = 128;

// Regex patterns for validation
static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());
static USERNAME_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_]+$").unwrap());

/// Possible validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

impl From<ValidationError> for crate::error::AppError {
    fn from(err: ValidationError) -> Self {
        crate::error::AppError::Validation(err.to_string())
    }
}

/// Validate an email address
pub fn validate_email(email: &str) -> ValidationResult<&str> {
    if email.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "Email address cannot be empty".to_string(),
        ));
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::InvalidEmail(format!(
            "Email address cannot exceed {MAX_EMAIL_LENGTH} characters"
        )));
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::InvalidEmail(
            "Invalid email address format".to_string(),
        ));
    }

    Ok(email)
}

/// Validate a username
pub fn validate_username(username: &str) -> ValidationResult<&str> {
    if username.len() < MIN_USERNAME_LENGTH {
        return Err(ValidationError::InvalidUsername(format!(
            "Username must be at least {MIN_USERNAME_LENGTH} characters long"
        )));
    }

    if username.len() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::InvalidUsername(format!(
            "Username must be between {MIN_USERNAME_LENGTH} and {MAX_USERNAME_LENGTH} characters"
        )));
    }

    if !USERNAME_REGEX.is_match(username) {
        return Err(ValidationError::InvalidUsername(
            "Username can only contain letters, numbers, and underscores".to_string(),
        ));
    }

    Ok(username)
}

/// Upper bound check shared by registration and password changes. Strength
/// requirements themselves live with the hasher.
pub fn validate_password_length(password: &str) -> ValidationResult<&str> {
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::InvalidPassword(format!(
            "Password cannot exceed {MAX_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(password)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        // Valid emails
        assert!(validate_email("test@example.com").is_ok());
        assert!(validate_email("user.name+tag@example.co.uk").is_ok());

        // Invalid email (no @)
        assert!(matches!(
            validate_email("test.example.com"),
            Err(ValidationError::InvalidEmail(_))
        ));

        // Invalid email (no domain)
        assert!(matches!(
            validate_email("test@"),
            Err(ValidationError::InvalidEmail(_))
        ));

        // Invalid email (no TLD)
        assert!(matches!(
            validate_email("test@example"),
            Err(ValidationError::InvalidEmail(_))
        ));

        // Empty email
        assert!(matches!(
            validate_email(""),
            Err(ValidationError::InvalidEmail(_))
        ));

        // Over the RFC length limit
        let long_email = format!("{}@example.com", "a".repeat(250));
        assert!(matches!(
            validate_email(&long_email),
            Err(ValidationError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_validate_username() {
        // Valid usernames
        assert!(validate_username("abc").is_ok());
        assert!(validate_username("patient_42").is_ok());

        // Too short
        assert!(matches!(
            validate_username("ab"),
            Err(ValidationError::InvalidUsername(_))
        ));

        // Too long
        let long_name = "a".repeat(51);
        assert!(matches!(
            validate_username(&long_name),
            Err(ValidationError::InvalidUsername(_))
        ));

        // Invalid characters
        assert!(matches!(
            validate_username("user name"),
            Err(ValidationError::InvalidUsername(_))
        ));
        assert!(matches!(
            validate_username("user@home"),
            Err(ValidationError::InvalidUsername(_))
        ));
    }

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password_length("Str0ng!Pass").is_ok());

        let long_password = "a".repeat(129);
        assert!(matches!(
            validate_password_length(&long_password),
            Err(ValidationError::InvalidPassword(_))
        ));
    }
}
