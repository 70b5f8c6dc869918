//! Input validation for API requests.
//!
//! Each check returns `Err(message)` describing the problem; handlers collect
//! them per field with the `ValidationErrorBuilder` from the `error` module.

use lazy_static::lazy_static;
use regex::Regex;

/// Maximum length of titles, names and links
pub const MAX_TEXT_LENGTH: usize = 255;

lazy_static! {
    /// Loose email shape check: something@something.tld, no whitespace
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();

    /// HTTP/HTTPS URL
    static ref URL_REGEX: Regex = Regex::new(r"^https?://[^\s/$.?#][^\s]*$").unwrap();
}

/// Validate an email address
pub fn validate_email(email: &str) -> Result<(), String> {
    let email = email.trim();
    if email.is_empty() {
        return Err("Email is required".to_string());
    }
    if email.len() > MAX_TEXT_LENGTH {
        return Err(format!(
            "Email is too long (max {} characters)",
            MAX_TEXT_LENGTH
        ));
    }
    if !EMAIL_REGEX.is_match(email) {
        return Err("Enter a valid email address".to_string());
    }
    Ok(())
}

/// Validate a password against the configured minimum length
pub fn validate_password(password: &str, min_length: usize) -> Result<(), String> {
    if password.chars().count() < min_length {
        return Err(format!(
            "Password must be at least {} characters",
            min_length
        ));
    }
    Ok(())
}

/// Validate a required short text such as a title or a tag name
pub fn validate_required_text(label: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} is required", label));
    }
    if value.chars().count() > MAX_TEXT_LENGTH {
        return Err(format!(
            "{} is too long (max {} characters)",
            label, MAX_TEXT_LENGTH
        ));
    }
    Ok(())
}

/// Validate an optional recipe link; an empty string means "no link"
pub fn validate_link(link: &Option<String>) -> Result<(), String> {
    if let Some(l) = link {
        let l = l.trim();
        if l.is_empty() {
            return Ok(());
        }
        if l.len() > MAX_TEXT_LENGTH {
            return Err(format!(
                "Link is too long (max {} characters)",
                MAX_TEXT_LENGTH
            ));
        }
        if !URL_REGEX.is_match(l) {
            return Err("Link must be an http(s) URL".to_string());
        }
    }
    Ok(())
}

/// Validate a preparation time
pub fn validate_time_minutes(minutes: i64) -> Result<(), String> {
    if minutes < 0 {
        return Err("Time must not be negative".to_string());
    }
    if minutes > i32::MAX as i64 {
        return Err("Time is too large".to_string());
    }
    Ok(())
}

/// Parse an integer flag such as `assigned_only=1`; any non-zero value is true
pub fn parse_flag(value: &str) -> Result<bool, String> {
    value
        .trim()
        .parse::<i64>()
        .map(|v| v != 0)
        .map_err(|_| format!("Expected an integer, got '{}'", value))
}

/// Parse a comma-separated id list such as `tags=1,2,3`
pub fn parse_id_list(value: &str) -> Result<Vec<i64>, String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| format!("Invalid id '{}'", s))
        })
        .collect()
}
