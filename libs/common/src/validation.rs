//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate a password chosen at sign-up
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.len() < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }

    if password.len() > 72 {
        return Err("Password must be at most 72 characters long".to_string());
    }

    let has_letter = password.chars().any(|c| c.is_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if !has_letter {
        return Err("Password must contain at least one letter".to_string());
    }

    if !has_digit {
        return Err("Password must contain at least one digit".to_string());
    }

    Ok(())
}

/// Validate full name
pub fn validate_full_name(full_name: &str) -> Result<(), String> {
    let trimmed = full_name.trim();

    if trimmed.is_empty() {
        return Err("Full name is required".to_string());
    }

    if trimmed.chars().count() > 120 {
        return Err("Full name must be at most 120 characters long".to_string());
    }

    Ok(())
}

/// Validate student id
pub fn validate_student_id(student_id: &str) -> Result<(), String> {
    if student_id.is_empty() {
        return Err("Student ID is required".to_string());
    }

    static STUDENT_ID_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = STUDENT_ID_REGEX.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9-]{1,32}$").expect("Failed to compile student id regex")
    });

    if !regex.is_match(student_id) {
        return Err(
            "Student ID can only contain letters, numbers, and dashes (max 32)".to_string(),
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ada@example.com").is_ok());
        assert_eq!(validate_email(""), Err("Email is required".to_string()));
        assert_eq!(
            validate_email("not-an-email"),
            Err("Invalid email format".to_string())
        );
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("graduate2024").is_ok());
        assert!(validate_password("short1").is_err());
        assert_eq!(
            validate_password("onlyletters"),
            Err("Password must contain at least one digit".to_string())
        );
        assert_eq!(
            validate_password("1234567890"),
            Err("Password must contain at least one letter".to_string())
        );
    }

    #[test]
    fn test_validate_full_name() {
        assert!(validate_full_name("Ada Lovelace").is_ok());
        assert!(validate_full_name("   ").is_err());
    }

    #[test]
    fn test_validate_student_id() {
        assert!(validate_student_id("A-2024-17").is_ok());
        assert!(validate_student_id("").is_err());
        assert!(validate_student_id("A 1").is_err());
        assert!(validate_student_id(&"9".repeat(33)).is_err());
    }
}
