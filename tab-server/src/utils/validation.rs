//! Input validation helpers

use shared::error::{AppError, ErrorCode};

/// Chat messages
pub const MAX_MESSAGE_LEN: usize = 500;

/// Trim `value` and require it to be non-empty and at most `max_len` chars.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::with_message(
            ErrorCode::RequiredField,
            format!("{field} must not be empty"),
        )
        .with_detail("field", field));
    }
    if trimmed.chars().count() > max_len {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("{field} is too long (max {max_len} characters)"),
        )
        .with_detail("field", field)
        .with_detail("max_len", max_len));
    }
    Ok(trimmed.to_string())
}

/// Ids arrive from clients as plain integers; surrogate keys start at 1.
pub fn validate_id(value: i64, field: &str) -> Result<i64, AppError> {
    if value <= 0 {
        return Err(AppError::validation(format!("{field} must be a positive id"))
            .with_detail("field", field));
    }
    Ok(value)
}
