//! Length checks for user-supplied flashcard text.
//!
//! Lengths are counted in characters, not bytes.

use crate::errors::AppError;

pub const MANUAL_FRONT_MAX: usize = 500;
pub const MANUAL_BACK_MAX: usize = 1000;
pub const ACCEPTED_FRONT_MAX: usize = 1000;
pub const ACCEPTED_BACK_MAX: usize = 5000;
pub const SOURCE_TEXT_MIN: usize = 1000;
pub const SOURCE_TEXT_MAX: usize = 10_000;

/// Trims `value` and checks it holds between 1 and `max` characters.
/// Returns the trimmed text.
pub fn required_text<'a>(field: &str, value: &'a str, max: usize) -> Result<&'a str, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_field(field, "must not be empty"));
    }
    if trimmed.chars().count() > max {
        return Err(AppError::invalid_field(
            field,
            format!("must be at most {max} characters"),
        ));
    }
    Ok(trimmed)
}

/// Source text for generation, 1000 to 10000 characters. Not trimmed.
pub fn source_text(value: &str) -> Result<&str, AppError> {
    let len = value.chars().count();
    if !(SOURCE_TEXT_MIN..=SOURCE_TEXT_MAX).contains(&len) {
        return Err(AppError::invalid_field(
            "source_text",
            format!(
                "must be between {SOURCE_TEXT_MIN} and {SOURCE_TEXT_MAX} characters, got {len}"
            ),
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text_trims() {
        assert_eq!(required_text("front", "  What?  ", 500).unwrap(), "What?");
    }

    #[test]
    fn test_blank_is_empty() {
        let err = required_text("back", " \n\t ", 1000).unwrap_err();
        assert!(matches!(err, AppError::InvalidField { ref field, .. } if field == "back"));
    }

    #[test]
    fn test_max_counts_characters() {
        let at_limit = "ż".repeat(500);
        assert!(required_text("front", &at_limit, MANUAL_FRONT_MAX).is_ok());
        let over = "a".repeat(501);
        assert!(required_text("front", &over, MANUAL_FRONT_MAX).is_err());
    }

    #[test]
    fn test_source_text_bounds() {
        assert!(source_text(&"a".repeat(999)).is_err());
        assert!(source_text(&"a".repeat(1000)).is_ok());
        assert!(source_text(&"a".repeat(10_000)).is_ok());
        assert!(source_text(&"a".repeat(10_001)).is_err());
    }
}
