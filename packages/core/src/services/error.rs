//! Service Layer Error Types
//!
//! Every application-level failure carries a stable error code. The `E-1xx`
//! family comes from value validation ([`ValidationError`]); the `E-2xx`
//! family covers access control and request-shape failures; store failures
//! surface as `E-500`.

use thiserror::Error;

use crate::db::DatabaseError;
use crate::models::ValidationError;

/// Service operation errors.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Validation failed for a submitted value or model
    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    /// Database operation failed
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    /// The user lacks a required permission (E-201)
    #[error("Permission denied: requires {permissions:?}")]
    PermissionDenied { permissions: Vec<String> },

    /// Email/password pair did not match an account (E-202)
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// The account exists but has not been verified (E-203)
    #[error("Account {email} has not been verified")]
    AccountInactive { email: String },

    /// An account with this email already exists (E-204)
    #[error("User with email {email} already exists")]
    DuplicateEmail { email: String },

    /// The verification token matched no account (E-205)
    #[error("Verification key invalid")]
    VerificationInvalid,

    /// A referenced record does not exist (E-206)
    #[error("{what} not found: {ident}")]
    NotFound { what: &'static str, ident: String },

    /// A required path argument was absent or empty (E-207)
    #[error("A path is required")]
    MissingPath,

    /// A slot's key does not belong to the node being edited (E-208)
    #[error("Key {key_id} does not belong to node {node_id}")]
    KeyNotInNode { key_id: String, node_id: String },

    /// A row index at or past the node's row counter (E-209)
    #[error("Row {row} is out of range for node {node_id}")]
    RowOutOfRange { node_id: String, row: i64 },

    /// More key fields than a form may carry (E-210)
    #[error("Too many keys: {count} exceeds the form limit {limit}")]
    TooManyKeys { count: usize, limit: usize },

    /// Duplicate key name within one form (E-211)
    #[error("Duplicate key name: {name}")]
    DuplicateKeyName { name: String },

    /// Duplicate name in the type registry (E-212)
    #[error("Type {name} already exists")]
    DuplicateTypeName { name: String },

    /// The target path already addresses a node (E-213)
    #[error("Path {path} already addresses a node")]
    PathOccupied { path: String },

    /// Password hashing or verification failed (E-500)
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),
}

impl ServiceError {
    /// Stable application error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            ServiceError::ValidationFailed(inner) => inner.error_code(),
            ServiceError::PermissionDenied { .. } => "E-201",
            ServiceError::InvalidCredentials => "E-202",
            ServiceError::AccountInactive { .. } => "E-203",
            ServiceError::DuplicateEmail { .. } => "E-204",
            ServiceError::VerificationInvalid => "E-205",
            ServiceError::NotFound { .. } => "E-206",
            ServiceError::MissingPath => "E-207",
            ServiceError::KeyNotInNode { .. } => "E-208",
            ServiceError::RowOutOfRange { .. } => "E-209",
            ServiceError::TooManyKeys { .. } => "E-210",
            ServiceError::DuplicateKeyName { .. } => "E-211",
            ServiceError::DuplicateTypeName { .. } => "E-212",
            ServiceError::PathOccupied { .. } => "E-213",
            ServiceError::Database(_) | ServiceError::PasswordHash(_) => "E-500",
        }
    }

    /// Create a not-found error.
    pub fn not_found(what: &'static str, ident: impl Into<String>) -> Self {
        Self::NotFound {
            what,
            ident: ident.into(),
        }
    }

    /// Create a permission-denied error.
    pub fn permission_denied(permissions: &[&str]) -> Self {
        Self::PermissionDenied {
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ServiceError::permission_denied(&["create_node"]).error_code(),
            "E-201"
        );
        assert_eq!(ServiceError::MissingPath.error_code(), "E-207");
        assert_eq!(
            ServiceError::not_found("Node", "abc").error_code(),
            "E-206"
        );
        assert_eq!(
            ServiceError::ValidationFailed(ValidationError::MissingField("x".to_string()))
                .error_code(),
            "E-103"
        );
    }

    #[test]
    fn test_messages_name_the_subject() {
        let err = ServiceError::DuplicateEmail {
            email: "a@example.com".to_string(),
        };
        assert!(err.to_string().contains("a@example.com"));
    }
}
