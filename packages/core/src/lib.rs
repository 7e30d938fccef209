//! 1Base Core Business Logic Layer
//!
//! This crate provides the data model, validation pipeline and service
//! orchestration for 1Base, a small self-hosted document/record database.
//!
//! # Architecture
//!
//! - **Dynamic schema**: Nodes own ordered Key definitions; populated cells
//!   are Slots, one per (key, row) pair
//! - **Type registry**: Keys are typed by registry-managed SoftTypes with a
//!   coded validation pipeline
//! - **Embedded SurrealDB**: Document storage behind a thin record mapper
//!
//! # Modules
//!
//! - [`models`] - Data structures (User, Group, SoftType, Node, Key, Slot, Path)
//! - [`services`] - Business services (AuthService, TypeService, NodeService, PathService)
//! - [`db`] - Document-store layer

pub mod db;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use db::*;
pub use models::*;
pub use services::*;
