//! Data Structures
//!
//! This module defines the persistent document shapes of 1Base:
//!
//! - [`user`] - Accounts and permission groups
//! - [`soft_type`] - The type registry and value validation
//! - [`node`] - Nodes, keys and slots (the dynamic schema model)
//! - [`path`] - The hierarchical browsing namespace

pub mod node;
pub mod path;
pub mod soft_type;
pub mod user;

pub use node::{Key, Node, RowRecord, RowSet, Slot, MAX_FORM_KEYS};
pub use path::Path;
pub use soft_type::{PrimitiveRepr, SoftType, ValidationError};
pub use user::{can_all, can_any, permissions, Group, User};
