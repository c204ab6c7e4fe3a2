//! Bridge error types.

use thiserror::Error;

/// Errors surfaced by the bridge.
///
/// Messages are copied out of the engine's own error state before the
/// boundary lock is released, so they always describe the failing call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolsError {
    /// The engine rejected the query or failed while evaluating it.
    #[error("Query failed: {0}")]
    Query(String),

    /// The engine could not construct a traversal cursor.
    #[error("Iterator creation failed: {0}")]
    Iterator(String),

    /// The iterator was used after it reported the end or was disposed.
    #[error("Invalid iterator state: {0}")]
    State(String),
}

impl ToolsError {
    /// Creates a query error.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query(message.into())
    }

    /// Creates an iterator error.
    pub fn iterator(message: impl Into<String>) -> Self {
        Self::Iterator(message.into())
    }

    /// Creates a state error.
    pub fn state(message: impl Into<String>) -> Self {
        Self::State(message.into())
    }
}
