//! Input validation utilities
//!
//! Identifier validation gates every lookup: a malformed reference is a
//! client error and never reaches the store. Field validators return
//! `Result<(), String>` so handlers can collect several messages into one
//! validation failure.

use mongodb::bson::oid::ObjectId;
use regex::Regex;
use std::sync::OnceLock;

use crate::error::ApiError;

/// Parse an entity reference, rejecting anything that is not a well-formed
/// object id
pub fn parse_object_id(value: &str, what: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(value).map_err(|_| ApiError::validation(format!("Invalid {what} id")))
}

/// Require a field to be present with non-whitespace content
pub fn validate_non_blank(value: &str, field: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} is required"));
    }

    Ok(())
}

/// Validate username
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username is required".to_string());
    }

    if username.len() < 3 {
        return Err("Username must be at least 3 characters long".to_string());
    }

    if username.len() > 32 {
        return Err("Username must be at most 32 characters long".to_string());
    }

    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("Failed to compile username regex"));

    if !regex.is_match(username) {
        return Err("Username can only contain letters, numbers, and underscores".to_string());
    }

    Ok(())
}

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

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.len() < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }

    if password.len() > 128 {
        return Err("Password must be at most 128 characters long".to_string());
    }

    Ok(())
}

/// Ownership check: the acting user must be the entity's owner.
///
/// A mismatch is an authorization error, never a silent no-op.
pub fn ensure_owner(owner: &ObjectId, actor: &ObjectId) -> Result<(), ApiError> {
    if owner == actor {
        Ok(())
    } else {
        Err(ApiError::Forbidden("You are not the owner".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_id_validation_gates_lookups() {
        assert!(parse_object_id("662f8c4f9b1e8a5d3c2a1b0f", "video").is_ok());
        assert!(parse_object_id("not-an-id", "video").is_err());
        assert!(parse_object_id("", "video").is_err());
        // Correct length but non-hex content.
        assert!(parse_object_id("zzzzzzzzzzzzzzzzzzzzzzzz", "video").is_err());
    }

    #[test]
    fn blank_fields_are_rejected() {
        assert!(validate_non_blank("hello", "title").is_ok());
        assert!(validate_non_blank("", "title").is_err());
        assert!(validate_non_blank("   ", "title").is_err());
    }

    #[test]
    fn username_rules() {
        assert!(validate_username("nitish_99").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("has space").is_err());
    }

    #[test]
    fn email_rules() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("not-an-email").is_err());
    }

    #[test]
    fn ownership_check_rejects_non_owner() {
        let owner = ObjectId::new();
        let other = ObjectId::new();

        assert!(ensure_owner(&owner, &owner).is_ok());

        let err = ensure_owner(&owner, &other).unwrap_err();
        assert_eq!(
            err.status_code(),
            axum::http::StatusCode::FORBIDDEN
        );
    }
}
