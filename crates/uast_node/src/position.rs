//! Source positions attached to nodes.

use serde::{Deserialize, Serialize};

/// A position in source text.
///
/// A node either carries a complete position record for a side (start or
/// end) or none at all; individual fields are never missing on their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// Byte offset (0-indexed).
    pub offset: u32,
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed).
    pub col: u32,
}

impl Position {
    /// Creates a new position.
    #[inline]
    pub const fn new(offset: u32, line: u32, col: u32) -> Self {
        Self { offset, line, col }
    }
}
