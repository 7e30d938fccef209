//! Business Services
//!
//! This module contains the core business logic services:
//!
//! - `AuthService` - Accounts, sessions material and permission resolution
//! - `TypeService` - The type registry
//! - `NodeService` - Nodes, keys and row/slot operations
//! - `PathService` - Hierarchical node addressing
//!
//! Services coordinate between the document store and application logic,
//! implementing the validation pipeline and the dynamic-schema invariants.

pub mod auth_service;
pub mod error;
pub mod node_service;
pub mod path_service;
pub mod type_service;

pub use auth_service::{
    hash_password, verify_password, Authenticated, AuthService, ADMIN_EMAIL, ADMIN_GROUP,
};
pub use error::ServiceError;
pub use node_service::{KeyDraft, NodeService};
pub use path_service::PathService;
pub use type_service::TypeService;
