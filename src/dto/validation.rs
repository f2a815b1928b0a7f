//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest team name accepted once surrounding whitespace is removed.
pub const TEAM_NAME_MAX_CHARS: usize = 50;

/// Validates that a team name has 1 to 50 characters after trimming.
///
/// # Examples
///
/// ```ignore
/// validate_team_name("Alpha")     // Ok
/// validate_team_name("   ")       // Err - blank
/// validate_team_name(&"x".repeat(51)) // Err - too long
/// ```
pub fn validate_team_name(name: &str) -> Result<(), ValidationError> {
    let chars = name.trim().chars().count();
    if chars == 0 {
        let mut err = ValidationError::new("team_name_required");
        err.message = Some("Team name is required".into());
        return Err(err);
    }

    if chars > TEAM_NAME_MAX_CHARS {
        let mut err = ValidationError::new("team_name_length");
        err.message = Some(
            format!("Team name must be at most {TEAM_NAME_MAX_CHARS} characters (got {chars})")
                .into(),
        );
        return Err(err);
    }

    Ok(())
}

/// Validates that a question carries exactly four non-blank options.
pub fn validate_options(options: &[String]) -> Result<(), ValidationError> {
    if options.len() != 4 {
        let mut err = ValidationError::new("options_count");
        err.message = Some(format!("Exactly 4 options are required (got {})", options.len()).into());
        return Err(err);
    }

    if options.iter().any(|option| option.trim().is_empty()) {
        let mut err = ValidationError::new("option_blank");
        err.message = Some("Options must not be blank".into());
        return Err(err);
    }

    Ok(())
}

/// Rejects values that are empty once trimmed.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be blank".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_team_name_valid() {
        assert!(validate_team_name("Alpha").is_ok());
        assert!(validate_team_name("  Alpha  ").is_ok());
        assert!(validate_team_name(&"x".repeat(50)).is_ok());
    }

    #[test]
    fn test_validate_team_name_invalid() {
        assert!(validate_team_name("").is_err());
        assert!(validate_team_name("   ").is_err());
        assert!(validate_team_name(&"x".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_team_name_counts_chars_not_bytes() {
        assert!(validate_team_name(&"é".repeat(50)).is_ok());
    }

    #[test]
    fn test_validate_options() {
        let four = vec!["a".to_string(), "b".into(), "c".into(), "d".into()];
        assert!(validate_options(&four).is_ok());
        assert!(validate_options(&four[..3]).is_err());
        let blank = vec!["a".to_string(), " ".into(), "c".into(), "d".into()];
        assert!(validate_options(&blank).is_err());
    }
}
