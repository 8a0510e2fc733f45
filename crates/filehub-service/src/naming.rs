//! Display-name rules shared by folders, uploads and renames.

use filehub_core::error::AppError;

/// Longest accepted display name, in characters.
pub const MAX_NAME_CHARS: usize = 255;

/// Trim a display name and reject it if nothing usable remains.
///
/// Duplicate sibling names are allowed, so this is the only check.
pub fn normalize_name(raw: &str) -> Result<String, AppError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::validation("Name must not be empty"));
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(AppError::validation(format!(
            "Name must be at most {MAX_NAME_CHARS} characters"
        )));
    }
    if name.chars().any(char::is_control) {
        return Err(AppError::validation("Name must not contain control characters"));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Reports ").unwrap(), "Reports");
        assert!(normalize_name("   ").is_err());
        assert!(normalize_name("").is_err());
        assert!(normalize_name("a\nb").is_err());
        assert!(normalize_name(&"x".repeat(MAX_NAME_CHARS)).is_ok());
        assert!(normalize_name(&"x".repeat(MAX_NAME_CHARS + 1)).is_err());
    }
}
