//! Database Layer
//!
//! Persistence for 1Base lives in an embedded SurrealDB instance, treated
//! strictly as an external document store: the application never leans on
//! engine features beyond SCHEMALESS tables and plain queries, and all
//! translation between domain structs and stored documents happens in
//! [`DocumentStore`].

mod error;
mod store;

pub use error::DatabaseError;
pub use store::DocumentStore;
