//! Path Data Structures
//!
//! Paths form a directory-like namespace over nodes. Each document stores a
//! single segment plus a parent reference; a slash-delimited string like
//! `people/contacts` resolves segment-by-segment from the roots. A path may
//! point at a node, in which case browsing it lands on the node view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::ValidationError;

/// One segment of the hierarchical namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Path {
    /// Unique identifier (UUID)
    pub id: String,

    /// Segment name (no slashes)
    pub name: String,

    /// Parent path id; `None` for roots
    pub parent: Option<String>,

    /// Node this path addresses, if any
    pub node: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Path {
    /// Create a new path segment.
    pub fn new(name: String, parent: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            parent,
            node: None,
            created_at: Utc::now(),
        }
    }

    /// Split a slash-delimited path string into segments.
    ///
    /// Leading, trailing and repeated slashes are tolerated; empty segments
    /// are dropped, so `"/people//contacts/"` splits to
    /// `["people", "contacts"]`.
    pub fn split(path: &str) -> Vec<String> {
        path.split('/')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Validate a single segment name.
    pub fn validate_segment(segment: &str) -> Result<(), ValidationError> {
        if segment.trim().is_empty() {
            return Err(ValidationError::MissingField("path segment".to_string()));
        }
        if segment.contains('/') {
            return Err(ValidationError::InvalidValue {
                repr: "path segment".to_string(),
                value: segment.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_normalizes_slashes() {
        assert_eq!(Path::split("people/contacts"), vec!["people", "contacts"]);
        assert_eq!(Path::split("/people//contacts/"), vec!["people", "contacts"]);
        assert!(Path::split("").is_empty());
        assert!(Path::split("///").is_empty());
    }

    #[test]
    fn test_segment_validation() {
        assert!(Path::validate_segment("people").is_ok());
        assert!(Path::validate_segment("").is_err());
        assert!(Path::validate_segment("a/b").is_err());
    }

    #[test]
    fn test_root_path_has_no_parent() {
        let root = Path::new("people".to_string(), None);
        assert!(root.parent.is_none());
        assert!(root.node.is_none());

        let child = Path::new("contacts".to_string(), Some(root.id.clone()));
        assert_eq!(child.parent.as_deref(), Some(root.id.as_str()));
    }
}
