//! Database Layer Error Types

use thiserror::Error;

/// Errors raised by the document-store layer.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Store initialization or connection failed
    #[error("Database connection failed: {0}")]
    ConnectionFailed(String),

    /// A query failed to execute
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A record could not be (de)serialized
    #[error("Record serialization failed: {0}")]
    Serialization(String),
}

impl From<surrealdb::Error> for DatabaseError {
    fn from(err: surrealdb::Error) -> Self {
        DatabaseError::QueryFailed(err.to_string())
    }
}
