//! Boundary checks applied to uploaded log files before parsing.

use crate::error::{CoreError, SizeViolation};

/// Default upload ceiling (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Maximum length of a stored filename, in characters.
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Reject empty uploads and uploads above `max_bytes`.
pub fn validate_upload_size(len: usize, max_bytes: usize) -> Result<(), CoreError> {
    if len == 0 {
        return Err(CoreError::EmptyOrOversizedInput(SizeViolation::Empty));
    }
    if len > max_bytes {
        return Err(CoreError::EmptyOrOversizedInput(SizeViolation::Oversized {
            max_bytes,
        }));
    }
    Ok(())
}

/// Check a filename supplied on upload or rename. Returns the trimmed name.
pub fn validate_filename(name: &str) -> Result<&str, CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "Filename must not be empty".to_string(),
        ));
    }
    let len = trimmed.chars().count();
    if len > MAX_FILENAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Filename must be at most {MAX_FILENAME_LENGTH} characters, got {len}"
        )));
    }
    Ok(trimmed)
}
