//! Node, Key and Slot Data Structures
//!
//! A `Node` is a user-defined record container: an ordered set of `Key`
//! field definitions plus a monotonically assigned row counter. Each
//! populated cell is a `Slot` (one slot per (key, row) pair), and all slots
//! sharing a row index form one logical record of the node.
//!
//! Row indexes only ever grow: dropping rows deletes slots but never
//! decrements `row_count`, so an index is never reused.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::ValidationError;

/// Maximum number of key fields a single request-rendered form may carry.
///
/// Key names must be unique within this limit per form.
pub const MAX_FORM_KEYS: usize = 2048;

/// A user-defined record container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique identifier (UUID)
    pub id: String,

    /// Display title
    pub title: String,

    /// Free-form description
    pub description: String,

    /// Ordered Key ids (field order of the node)
    pub keys: Vec<String>,

    /// Monotonic row counter; the next inserted row takes this index
    pub row_count: i64,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub modified_at: DateTime<Utc>,
}

impl Node {
    /// Create a new, empty node.
    pub fn new(title: String, description: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            description,
            keys: Vec::new(),
            row_count: 0,
            created_at: now,
            modified_at: now,
        }
    }

    /// Validate structural fields.
    ///
    /// # Errors
    ///
    /// - `MissingField` when the title is blank
    /// - `SizeExceeded` when the node carries more than [`MAX_FORM_KEYS`] keys
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingField("title".to_string()));
        }
        if self.keys.len() > MAX_FORM_KEYS {
            return Err(ValidationError::SizeExceeded {
                size: MAX_FORM_KEYS,
                length: self.keys.len(),
            });
        }
        Ok(())
    }

    /// Whether a key id belongs to this node.
    pub fn owns_key(&self, key_id: &str) -> bool {
        self.keys.iter().any(|k| k == key_id)
    }
}

/// A field definition belonging to exactly one node.
///
/// Ownership is expressed by the node's ordered `keys` list; a key id
/// appears in exactly one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Key {
    /// Unique identifier (UUID)
    pub id: String,

    /// Field name (unique within the owning node's form)
    pub name: String,

    /// Declared type (SoftType id)
    pub soft_type: String,

    /// Maximum value length in characters, when constrained
    pub size: Option<usize>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Key {
    /// Create a new key definition.
    pub fn new(name: String, soft_type: String, size: Option<usize>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            soft_type,
            size,
            created_at: Utc::now(),
        }
    }

    /// Validate structural fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name".to_string()));
        }
        if self.soft_type.is_empty() {
            return Err(ValidationError::MissingField("type".to_string()));
        }
        Ok(())
    }
}

/// One cell value: the value of a key at a row index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    /// Unique identifier (UUID)
    pub id: String,

    /// Owning key id
    pub key_id: String,

    /// Row index within the node
    pub row: i64,

    /// Stored value (raw form input, already validated against the key's type)
    pub value: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub modified_at: DateTime<Utc>,
}

impl Slot {
    /// Create a new slot.
    pub fn new(key_id: String, row: i64, value: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            key_id,
            row,
            value,
            created_at: now,
            modified_at: now,
        }
    }
}

/// One logical record of a node: values aligned to the node's key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowRecord {
    /// Row index
    pub row: i64,

    /// One entry per key, in key order; `None` when no slot exists
    pub values: Vec<Option<String>>,
}

/// A paginated selection of a node's rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowSet {
    /// Selected rows, in ascending row order
    pub rows: Vec<RowRecord>,

    /// Pagination window start (row offset requested)
    pub start: i64,

    /// Pagination window end (exclusive)
    pub end: i64,

    /// Total row counter of the node
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_creation() {
        let node = Node::new("People".to_string(), "Contact records".to_string());
        assert!(!node.id.is_empty());
        assert_eq!(node.row_count, 0);
        assert!(node.keys.is_empty());
        assert!(node.validate().is_ok());
    }

    #[test]
    fn test_node_validation_requires_title() {
        let node = Node::new("   ".to_string(), String::new());
        assert!(matches!(
            node.validate(),
            Err(ValidationError::MissingField(_))
        ));
    }

    #[test]
    fn test_node_validation_caps_keys() {
        let mut node = Node::new("Big".to_string(), String::new());
        node.keys = (0..=MAX_FORM_KEYS).map(|i| format!("key-{i}")).collect();
        assert!(matches!(
            node.validate(),
            Err(ValidationError::SizeExceeded { .. })
        ));
    }

    #[test]
    fn test_node_owns_key() {
        let mut node = Node::new("People".to_string(), String::new());
        let key = Key::new("name".to_string(), "type-id".to_string(), Some(64));
        node.keys.push(key.id.clone());
        assert!(node.owns_key(&key.id));
        assert!(!node.owns_key("someone-elses-key"));
    }

    #[test]
    fn test_key_validation() {
        let key = Key::new("name".to_string(), "type-id".to_string(), None);
        assert!(key.validate().is_ok());

        let unnamed = Key::new(String::new(), "type-id".to_string(), None);
        assert!(unnamed.validate().is_err());

        let untyped = Key::new("name".to_string(), String::new(), None);
        assert!(untyped.validate().is_err());
    }

    #[test]
    fn test_slot_serialization() {
        let slot = Slot::new("key-1".to_string(), 3, "hello".to_string());
        let json = serde_json::to_string(&slot).unwrap();
        let back: Slot = serde_json::from_str(&json).unwrap();
        assert_eq!(slot, back);
    }
}
