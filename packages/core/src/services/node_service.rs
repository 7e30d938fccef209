//! Node Service - Dynamic Schema Operations
//!
//! The heart of the dynamic schema model: node creation with its ordered
//! key definitions, and row operations over slots. Every submitted value is
//! validated against the owning key's type before a slot is written, and
//! slots are only ever written through keys that belong to the node being
//! edited.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::db::DocumentStore;
use crate::models::{Key, Node, RowRecord, RowSet, Slot, SoftType, MAX_FORM_KEYS};
use crate::services::ServiceError;

/// A key definition as submitted on the node-creation form.
#[derive(Debug, Clone)]
pub struct KeyDraft {
    /// Field name (unique within the form)
    pub name: String,
    /// SoftType id
    pub soft_type: String,
    /// Optional maximum value length
    pub size: Option<usize>,
}

/// Node, key and row operations.
pub struct NodeService {
    store: Arc<DocumentStore>,
}

impl NodeService {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }

    /// Fetch a node by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` (E-206) for an unknown id.
    pub async fn get(&self, id: &str) -> Result<Node, ServiceError> {
        self.store
            .node_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Node", id))
    }

    /// Create a node with its ordered key definitions.
    ///
    /// # Errors
    ///
    /// - `TooManyKeys` (E-210) past the form limit
    /// - `DuplicateKeyName` (E-211) on a repeated field name
    /// - `NotFound` (E-206) when a draft references an unknown type
    pub async fn create_node(
        &self,
        title: &str,
        description: &str,
        drafts: Vec<KeyDraft>,
    ) -> Result<Node, ServiceError> {
        if drafts.len() > MAX_FORM_KEYS {
            return Err(ServiceError::TooManyKeys {
                count: drafts.len(),
                limit: MAX_FORM_KEYS,
            });
        }

        let mut seen = Vec::with_capacity(drafts.len());
        for draft in &drafts {
            if seen.contains(&draft.name.as_str()) {
                return Err(ServiceError::DuplicateKeyName {
                    name: draft.name.clone(),
                });
            }
            seen.push(draft.name.as_str());
        }

        // Every referenced type must exist before any key is written.
        let type_ids: Vec<String> = drafts.iter().map(|d| d.soft_type.clone()).collect();
        let types = self.store.soft_types_by_ids(&type_ids).await?;
        for draft in &drafts {
            if !types.iter().any(|t| t.id == draft.soft_type) {
                return Err(ServiceError::not_found("Type", draft.soft_type.clone()));
            }
        }

        let mut node = Node::new(title.to_string(), description.to_string());
        for draft in drafts {
            let key = Key::new(draft.name, draft.soft_type, draft.size);
            key.validate()?;
            let key = self.store.create_key(key).await?;
            node.keys.push(key.id);
        }
        node.validate()?;

        let node = self.store.create_node(node).await?;
        debug!(node = %node.id, keys = node.keys.len(), "node created");
        Ok(node)
    }

    /// Fetch a node's key definitions in field order.
    pub async fn get_keys(&self, node: &Node) -> Result<Vec<Key>, ServiceError> {
        let fetched = self.store.keys_by_ids(&node.keys).await?;
        // Store order is unspecified; re-align to the node's key list.
        let mut ordered = Vec::with_capacity(node.keys.len());
        for key_id in &node.keys {
            let key = fetched
                .iter()
                .find(|k| &k.id == key_id)
                .cloned()
                .ok_or_else(|| ServiceError::not_found("Key", key_id.clone()))?;
            ordered.push(key);
        }
        Ok(ordered)
    }

    /// Fetch the types of a node's keys, indexed by type id.
    pub async fn key_types(&self, keys: &[Key]) -> Result<HashMap<String, SoftType>, ServiceError> {
        let ids: Vec<String> = keys.iter().map(|k| k.soft_type.clone()).collect();
        let types = self.store.soft_types_by_ids(&ids).await?;
        Ok(types.into_iter().map(|t| (t.id.clone(), t)).collect())
    }

    /// Validate a value map against the node's keys without writing.
    ///
    /// Missing entries validate as the empty string, mirroring how an empty
    /// form field is submitted.
    pub async fn validate_values(
        &self,
        keys: &[Key],
        values: &HashMap<String, String>,
    ) -> Result<(), ServiceError> {
        let types = self.key_types(keys).await?;
        for key in keys {
            let soft_type = types
                .get(&key.soft_type)
                .ok_or_else(|| ServiceError::not_found("Type", key.soft_type.clone()))?;
            let empty = String::new();
            let value = values.get(&key.name).unwrap_or(&empty);
            soft_type.validate_value(value, key.size)?;
        }
        Ok(())
    }

    /// Insert one row: one slot per key at the next row index.
    ///
    /// Returns the assigned row index. The node's row counter increments
    /// monotonically and is never reused.
    pub async fn insert_row(
        &self,
        node: &Node,
        values: &HashMap<String, String>,
    ) -> Result<i64, ServiceError> {
        let keys = self.get_keys(node).await?;
        self.validate_values(&keys, values).await?;

        let row = node.row_count;
        for key in &keys {
            let empty = String::new();
            let value = values.get(&key.name).unwrap_or(&empty);
            self.write_slot(node, key, row, value).await?;
        }

        let mut updated = node.clone();
        updated.row_count = row + 1;
        updated.modified_at = chrono::Utc::now();
        self.store.update_node(&updated).await?;
        debug!(node = %node.id, row, "row inserted");
        Ok(row)
    }

    /// Update an existing row's slot values in place.
    ///
    /// # Errors
    ///
    /// Returns `RowOutOfRange` (E-209) for an index the counter never
    /// assigned.
    pub async fn update_row(
        &self,
        node: &Node,
        row: i64,
        values: &HashMap<String, String>,
    ) -> Result<(), ServiceError> {
        if row < 0 || row >= node.row_count {
            return Err(ServiceError::RowOutOfRange {
                node_id: node.id.clone(),
                row,
            });
        }
        let keys = self.get_keys(node).await?;
        self.validate_values(&keys, values).await?;

        for key in &keys {
            let empty = String::new();
            let value = values.get(&key.name).unwrap_or(&empty);
            self.write_slot(node, key, row, value).await?;
        }
        debug!(node = %node.id, row, "row updated");
        Ok(())
    }

    /// Create or update the slot for (key, row).
    ///
    /// The key must belong to the node being edited.
    async fn write_slot(
        &self,
        node: &Node,
        key: &Key,
        row: i64,
        value: &str,
    ) -> Result<(), ServiceError> {
        if !node.owns_key(&key.id) {
            return Err(ServiceError::KeyNotInNode {
                key_id: key.id.clone(),
                node_id: node.id.clone(),
            });
        }
        match self.store.slot_for(&key.id, row).await? {
            Some(existing) => self.store.update_slot_value(&existing.id, value).await?,
            None => {
                self.store
                    .create_slot(Slot::new(key.id.clone(), row, value.to_string()))
                    .await?;
            }
        }
        Ok(())
    }

    /// Select a window of the node's populated rows.
    ///
    /// Rows are the distinct row indexes that still have slots (dropped rows
    /// leave gaps); `total` reports the node's monotonic row counter.
    pub async fn select(
        &self,
        node: &Node,
        offset: usize,
        limit: usize,
    ) -> Result<RowSet, ServiceError> {
        let keys = self.get_keys(node).await?;
        let key_ids: Vec<String> = keys.iter().map(|k| k.id.clone()).collect();
        let slots = self.store.slots_for_keys(&key_ids).await?;

        let mut by_row: HashMap<i64, HashMap<&str, &str>> = HashMap::new();
        for slot in &slots {
            by_row
                .entry(slot.row)
                .or_default()
                .insert(slot.key_id.as_str(), slot.value.as_str());
        }

        let mut row_indexes: Vec<i64> = by_row.keys().copied().collect();
        row_indexes.sort_unstable();

        let rows = row_indexes
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|row| {
                let cells = &by_row[&row];
                RowRecord {
                    row,
                    values: keys
                        .iter()
                        .map(|k| cells.get(k.id.as_str()).map(|v| v.to_string()))
                        .collect(),
                }
            })
            .collect();

        Ok(RowSet {
            rows,
            start: offset as i64,
            end: (offset + limit) as i64,
            total: node.row_count,
        })
    }

    /// Fetch one row as a key-name → value map (form prefill).
    pub async fn row_values(
        &self,
        node: &Node,
        row: i64,
    ) -> Result<HashMap<String, String>, ServiceError> {
        if row < 0 || row >= node.row_count {
            return Err(ServiceError::RowOutOfRange {
                node_id: node.id.clone(),
                row,
            });
        }
        let keys = self.get_keys(node).await?;
        let key_ids: Vec<String> = keys.iter().map(|k| k.id.clone()).collect();
        let slots = self.store.slots_for_rows(&key_ids, &[row]).await?;

        let mut values = HashMap::new();
        for key in &keys {
            if let Some(slot) = slots.iter().find(|s| s.key_id == key.id) {
                values.insert(key.name.clone(), slot.value.clone());
            }
        }
        Ok(values)
    }

    /// Fetch several rows aligned to key order (drop confirmation page).
    pub async fn rows_preview(
        &self,
        node: &Node,
        rows: &[i64],
    ) -> Result<Vec<RowRecord>, ServiceError> {
        let keys = self.get_keys(node).await?;
        let key_ids: Vec<String> = keys.iter().map(|k| k.id.clone()).collect();
        let slots = self.store.slots_for_rows(&key_ids, rows).await?;

        let mut records = Vec::with_capacity(rows.len());
        for &row in rows {
            let values = keys
                .iter()
                .map(|k| {
                    slots
                        .iter()
                        .find(|s| s.key_id == k.id && s.row == row)
                        .map(|s| s.value.clone())
                })
                .collect();
            records.push(RowRecord { row, values });
        }
        Ok(records)
    }

    /// Delete every slot of the given rows.
    ///
    /// The row counter is left untouched: indexes are assigned
    /// monotonically and never reused.
    pub async fn drop_rows(&self, node: &Node, rows: &[i64]) -> Result<(), ServiceError> {
        for &row in rows {
            if row < 0 || row >= node.row_count {
                return Err(ServiceError::RowOutOfRange {
                    node_id: node.id.clone(),
                    row,
                });
            }
        }
        let keys = self.get_keys(node).await?;
        let key_ids: Vec<String> = keys.iter().map(|k| k.id.clone()).collect();
        self.store.delete_slots_for_rows(&key_ids, rows).await?;
        debug!(node = %node.id, rows = rows.len(), "rows dropped");
        Ok(())
    }
}
