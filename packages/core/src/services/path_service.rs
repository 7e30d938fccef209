//! Path Service - Hierarchical Node Addressing
//!
//! Resolves slash-delimited path strings to stored [`Path`] segments and
//! attaches freshly created nodes at a path, creating intermediate segments
//! on demand.

use std::sync::Arc;

use tracing::debug;

use crate::db::DocumentStore;
use crate::models::Path;
use crate::services::ServiceError;

/// Namespace operations over path segments.
pub struct PathService {
    store: Arc<DocumentStore>,
}

impl PathService {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }

    /// Resolve a path string to its leaf segment, walking from the roots.
    ///
    /// Returns `None` as soon as any segment is missing. An empty string
    /// resolves to `None`.
    pub async fn find(&self, path: &str) -> Result<Option<Path>, ServiceError> {
        let segments = Path::split(path);
        if segments.is_empty() {
            return Ok(None);
        }

        let mut current: Option<Path> = None;
        for segment in &segments {
            let parent_id = current.as_ref().map(|p| p.id.clone());
            match self.store.path_child(parent_id.as_deref(), segment).await? {
                Some(child) => current = Some(child),
                None => return Ok(None),
            }
        }
        Ok(current)
    }

    /// List the children of a path string; the roots for an empty path.
    ///
    /// Returns `(resolved leaf, children)`; the leaf is `None` when listing
    /// roots or when the path does not resolve (no children either way).
    pub async fn children(
        &self,
        path: &str,
    ) -> Result<(Option<Path>, Vec<Path>), ServiceError> {
        if Path::split(path).is_empty() {
            let roots = self.store.path_children(None).await?;
            return Ok((None, roots));
        }
        match self.find(path).await? {
            Some(current) => {
                let children = self.store.path_children(Some(&current.id)).await?;
                Ok((Some(current), children))
            }
            None => Ok((None, Vec::new())),
        }
    }

    /// Attach a node at a path, creating missing intermediate segments.
    ///
    /// # Errors
    ///
    /// - `MissingPath` (E-207) for an empty path string
    /// - `PathOccupied` (E-213) when the leaf already addresses a node
    pub async fn create_node_at_path(
        &self,
        path: &str,
        node_id: &str,
    ) -> Result<Path, ServiceError> {
        let segments = Path::split(path);
        if segments.is_empty() {
            return Err(ServiceError::MissingPath);
        }
        for segment in &segments {
            Path::validate_segment(segment)?;
        }

        let mut current: Option<Path> = None;
        for segment in &segments {
            let parent_id = current.as_ref().map(|p| p.id.clone());
            let existing = self.store.path_child(parent_id.as_deref(), segment).await?;
            current = Some(match existing {
                Some(found) => found,
                None => {
                    let created = self
                        .store
                        .create_path(Path::new(segment.clone(), parent_id))
                        .await?;
                    debug!(path = %segment, "path segment created");
                    created
                }
            });
        }

        let mut leaf = current.expect("non-empty path resolves to a leaf");
        if leaf.node.is_some() {
            return Err(ServiceError::PathOccupied {
                path: path.to_string(),
            });
        }
        self.store.set_path_node(&leaf.id, node_id).await?;
        leaf.node = Some(node_id.to_string());
        debug!(path, node = %node_id, "node attached at path");
        Ok(leaf)
    }
}
