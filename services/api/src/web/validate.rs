//! services/api/src/web/validate.rs
//!
//! Request body validation, run by each handler before the core is called.

use crate::error::ApiError;

pub trait Validate {
    fn validate(&self) -> Result<(), ApiError>;
}

/// Fails unless `value` has at least one non-whitespace character.
pub fn required(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

/// Fails unless `value` is between `min` and `max` characters long.
pub fn length(field: &str, value: &str, min: usize, max: usize) -> Result<(), ApiError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(ApiError::Validation(format!(
            "{} must be between {} and {} characters",
            field, min, max
        )));
    }
    Ok(())
}

pub fn non_negative(field: &str, value: i32) -> Result<(), ApiError> {
    if value < 0 {
        return Err(ApiError::Validation(format!("{} must not be negative", field)));
    }
    Ok(())
}

/// A shape check only: one `@` with a non-empty local part and a dotted domain.
pub fn email(field: &str, value: &str) -> Result<(), ApiError> {
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .map_or(false, |(name, tld)| !name.is_empty() && !tld.is_empty())
        }
        None => false,
    };
    if !valid {
        return Err(ApiError::Validation(format!("{} must be a valid email address", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape() {
        assert!(email("email", "ana@example.com").is_ok());
        assert!(email("email", "ana@localhost").is_err());
        assert!(email("email", "@example.com").is_err());
        assert!(email("email", "ana@@example.com").is_err());
        assert!(email("email", "ana.example.com").is_err());
    }

    #[test]
    fn length_counts_characters() {
        assert!(length("username", "añá", 3, 32).is_ok());
        assert!(length("username", "an", 3, 32).is_err());
        assert!(required("name", "   ").is_err());
    }
}
