//! Password policy enforcement.
//!
//! Passwords must be 8-128 characters and contain at least one lowercase
//! letter, one uppercase letter, and one digit.

use thiserror::Error;

const MIN_LENGTH: usize = 8;
const MAX_LENGTH: usize = 128;

/// A specific way a candidate password fails the policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyViolation {
    /// Too short or too long.
    #[error("Password must be {MIN_LENGTH}-{MAX_LENGTH} characters")]
    Length,

    /// Missing a lowercase letter.
    #[error("Password must contain at least one lowercase letter")]
    MissingLowercase,

    /// Missing an uppercase letter.
    #[error("Password must contain at least one uppercase letter")]
    MissingUppercase,

    /// Missing a digit.
    #[error("Password must contain at least one number")]
    MissingDigit,
}

/// Validates a candidate password against the policy.
///
/// # Errors
///
/// Returns the first violation found, length checked before character
/// classes.
pub fn validate_password(password: &str) -> Result<(), PolicyViolation> {
    let length = password.chars().count();
    if !(MIN_LENGTH..=MAX_LENGTH).contains(&length) {
        return Err(PolicyViolation::Length);
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(PolicyViolation::MissingLowercase);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(PolicyViolation::MissingUppercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(PolicyViolation::MissingDigit);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_conforming_password() {
        assert!(validate_password("Passw0rd").is_ok());
        assert!(validate_password("aB3aB3aB3aB3").is_ok());
    }

    #[test]
    fn rejects_short_password() {
        assert_eq!(validate_password("Ab1"), Err(PolicyViolation::Length));
        assert_eq!(validate_password("Abcdef1"), Err(PolicyViolation::Length));
    }

    #[test]
    fn rejects_overlong_password() {
        let long = format!("Aa1{}", "x".repeat(126));
        assert_eq!(validate_password(&long), Err(PolicyViolation::Length));
    }

    #[test]
    fn accepts_max_length_password() {
        let max = format!("Aa1{}", "x".repeat(125));
        assert_eq!(max.len(), 128);
        assert!(validate_password(&max).is_ok());
    }

    #[test]
    fn rejects_missing_character_classes() {
        assert_eq!(
            validate_password("PASSW0RD"),
            Err(PolicyViolation::MissingLowercase)
        );
        assert_eq!(
            validate_password("passw0rd"),
            Err(PolicyViolation::MissingUppercase)
        );
        assert_eq!(
            validate_password("Password"),
            Err(PolicyViolation::MissingDigit)
        );
    }
}
