//! Input rules shared by handlers.

use validator::ValidateEmail;

use crate::error::CoreError;

pub const MAX_EMAIL_LEN: usize = 254;
pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;
pub const MAX_NAME_LEN: usize = 100;
pub const MAX_CHAT_MESSAGE_LEN: usize = 2000;

/// Trim, lowercase and format-check an email address.
pub fn normalize_email(email: &str) -> Result<String, CoreError> {
    let email = email.trim().to_lowercase();
    if email.len() > MAX_EMAIL_LEN || !email.validate_email() {
        return Err(CoreError::Validation("Please provide a valid email address".into()));
    }
    Ok(email)
}

/// Password policy: 8-128 characters with a lowercase letter, an uppercase
/// letter, and a digit.
pub fn validate_password(password: &str) -> Result<(), CoreError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(CoreError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }
    if len > MAX_PASSWORD_LEN {
        return Err(CoreError::Validation("Password is too long".into()));
    }

    let checks: [(fn(&char) -> bool, &str); 3] = [
        (char::is_ascii_lowercase, "a lowercase letter"),
        (char::is_ascii_uppercase, "an uppercase letter"),
        (char::is_ascii_digit, "a number"),
    ];
    for (check, what) in checks {
        if !password.chars().any(|c| check(&c)) {
            return Err(CoreError::Validation(format!("Password must contain {what}")));
        }
    }
    Ok(())
}

/// Trim and bound an optional display name.
pub fn normalize_name(name: Option<&str>) -> Result<Option<String>, CoreError> {
    let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
        return Ok(None);
    };
    if name.chars().count() > MAX_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "Name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(Some(name.to_string()))
}

/// Chat messages must be non-empty after trimming and at most
/// [`MAX_CHAT_MESSAGE_LEN`] characters.
pub fn validate_chat_message(message: &str) -> Result<String, CoreError> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Message is required".into()));
    }
    if trimmed.chars().count() > MAX_CHAT_MESSAGE_LEN {
        return Err(CoreError::Validation(format!(
            "Message must be at most {MAX_CHAT_MESSAGE_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}
