//! User and Group Data Structures
//!
//! Accounts authenticate with an email address and an Argon2id password hash.
//! Authorization is group-based: a user belongs to any number of groups, and
//! each group carries a flat set of permission strings. Permission checks are
//! evaluated over the user's resolved groups with `can_any` / `can_all`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::ValidationError;

/// Permission strings understood by the application.
///
/// Groups carry an arbitrary set of these; the constants exist so route
/// handlers and the admin bootstrap agree on spelling.
pub mod permissions {
    /// Create a new node (and its keys) at a path.
    pub const CREATE_NODE: &str = "create_node";
    /// Insert new rows into a node.
    pub const NODE_MODIFY: &str = "node_modify";
    /// Update existing rows of a node.
    pub const NODE_UPDATE: &str = "node_update";
    /// Delete rows (slots) from a node.
    pub const SLOT_DROP: &str = "slot_drop";
    /// Create a type in the registry.
    pub const CREATE_TYPE: &str = "create_type";
    /// Modify a type in the registry.
    pub const UPDATE_TYPE: &str = "update_type";
    /// Delete a type from the registry.
    pub const DELETE_TYPE: &str = "delete_type";

    /// Every permission, in one place for the admin group bootstrap.
    pub const ALL: [&str; 7] = [
        CREATE_NODE,
        NODE_MODIFY,
        NODE_UPDATE,
        SLOT_DROP,
        CREATE_TYPE,
        UPDATE_TYPE,
        DELETE_TYPE,
    ];
}

/// A registered account.
///
/// New accounts start inactive with a fresh verification token; visiting the
/// verification URL flips `is_active`. The password is never stored in the
/// clear: `password_hash` holds an Argon2id PHC-format string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier (UUID)
    pub id: String,

    /// Login email address (unique)
    pub email: String,

    /// Argon2id PHC-format password hash
    pub password_hash: String,

    /// Whether the account has been verified
    pub is_active: bool,

    /// One-time verification token sent to the user
    pub verification: String,

    /// Group memberships (Group ids)
    pub groups: Vec<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub modified_at: DateTime<Utc>,
}

impl User {
    /// Create a new, inactive user with a fresh verification token.
    pub fn new(email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            email,
            password_hash,
            is_active: false,
            verification: Uuid::new_v4().to_string(),
            groups: Vec::new(),
            created_at: now,
            modified_at: now,
        }
    }

    /// Validate structural fields.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::MissingField` when `email` or
    /// `password_hash` is empty.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.email.trim().is_empty() {
            return Err(ValidationError::MissingField("email".to_string()));
        }
        if self.password_hash.is_empty() {
            return Err(ValidationError::MissingField("password".to_string()));
        }
        Ok(())
    }

    /// Mark the account verified.
    pub fn activate(&mut self) {
        self.is_active = true;
        self.modified_at = Utc::now();
    }
}

/// A named group carrying a permission set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// Unique identifier (UUID)
    pub id: String,

    /// Group name (e.g. "admin")
    pub name: String,

    /// Permission strings granted by membership
    pub permissions: Vec<String>,
}

impl Group {
    /// Create a new group with the given permission set.
    pub fn new(name: String, permissions: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            permissions,
        }
    }

    /// Whether this group grants a single permission.
    pub fn grants(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

/// True when at least one required permission is granted by any group.
pub fn can_any(groups: &[Group], required: &[&str]) -> bool {
    required
        .iter()
        .any(|perm| groups.iter().any(|g| g.grants(perm)))
}

/// True when every required permission is granted by some group.
///
/// An empty requirement list is vacuously satisfied.
pub fn can_all(groups: &[Group], required: &[&str]) -> bool {
    required
        .iter()
        .all(|perm| groups.iter().any(|g| g.grants(perm)))
}
