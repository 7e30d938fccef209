//! Type Registry Service
//!
//! CRUD over the catalog of [`SoftType`] entries plus the select-option
//! helper the node-creation form uses to offer a type per key.

use std::sync::Arc;

use tracing::debug;

use crate::db::DocumentStore;
use crate::models::SoftType;
use crate::services::ServiceError;

/// Registry operations for the named data types assignable to keys.
pub struct TypeService {
    store: Arc<DocumentStore>,
}

impl TypeService {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }

    /// List the registry, ordered by name.
    pub async fn list(&self) -> Result<Vec<SoftType>, ServiceError> {
        Ok(self.store.list_soft_types().await?)
    }

    /// Fetch one type by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` (E-206) for an unknown id.
    pub async fn get(&self, id: &str) -> Result<SoftType, ServiceError> {
        self.store
            .soft_type_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Type", id))
    }

    /// Create a new registry entry.
    ///
    /// # Errors
    ///
    /// - `DuplicateTypeName` (E-212) when the name is taken
    /// - `MissingField` (E-103) when the name is blank
    pub async fn create(
        &self,
        name: &str,
        repr: &str,
        is_primitive: bool,
        validator: Option<String>,
    ) -> Result<SoftType, ServiceError> {
        if self.store.soft_type_by_name(name).await?.is_some() {
            return Err(ServiceError::DuplicateTypeName {
                name: name.to_string(),
            });
        }
        let soft_type = SoftType::new(name.to_string(), repr.to_string(), is_primitive, validator);
        soft_type.validate()?;
        let created = self.store.create_soft_type(soft_type).await?;
        debug!(soft_type = %created.id, name = %created.name, "type created");
        Ok(created)
    }

    /// Update an existing registry entry.
    ///
    /// # Errors
    ///
    /// - `NotFound` (E-206) for an unknown id
    /// - `DuplicateTypeName` (E-212) when renaming onto a taken name
    pub async fn update(
        &self,
        id: &str,
        name: &str,
        repr: &str,
        is_primitive: bool,
        validator: Option<String>,
    ) -> Result<SoftType, ServiceError> {
        let mut soft_type = self.get(id).await?;

        if name != soft_type.name {
            if let Some(other) = self.store.soft_type_by_name(name).await? {
                if other.id != soft_type.id {
                    return Err(ServiceError::DuplicateTypeName {
                        name: name.to_string(),
                    });
                }
            }
        }

        soft_type.name = name.to_string();
        soft_type.repr = repr.to_string();
        soft_type.is_primitive = is_primitive;
        soft_type.validator = validator;
        soft_type.modified_at = chrono::Utc::now();
        soft_type.validate()?;

        self.store.update_soft_type(&soft_type).await?;
        Ok(soft_type)
    }

    /// Delete a registry entry.
    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        let soft_type = self.get(id).await?;
        self.store.delete_soft_type(&soft_type.id).await?;
        debug!(soft_type = %soft_type.id, name = %soft_type.name, "type deleted");
        Ok(())
    }

    /// `(id, name)` option pairs for a select field, in registry order.
    pub async fn as_select(&self) -> Result<Vec<(String, String)>, ServiceError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .map(|t| (t.id, t.name))
            .collect())
    }
}
