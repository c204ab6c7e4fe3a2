//! Bridge configuration.

use serde::{Deserialize, Serialize};

/// Bytes reserved up front for each boundary's string arena.
pub const DEFAULT_ARENA_CAPACITY: usize = 4 * 1024;

/// Tunables for a [`Bridge`](crate::Bridge).
///
/// Meant to be embedded in the host application's own configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Initial capacity, in bytes, of the string arena kept by each of the
    /// two boundaries. The arena grows past this when a call exports more.
    pub arena_capacity: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            arena_capacity: DEFAULT_ARENA_CAPACITY,
        }
    }
}
