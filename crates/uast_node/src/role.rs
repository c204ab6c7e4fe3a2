//! Role tags.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A role tag annotating what a node means independently of its language.
///
/// Roles are small integers; their meaning is assigned by whoever built the
/// tree. The bridge passes them through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(pub u16);

impl Role {
    /// Creates a role from its numeric tag.
    #[inline]
    pub const fn new(tag: u16) -> Self {
        Self(tag)
    }

    /// Returns the numeric tag.
    #[inline]
    pub const fn tag(self) -> u16 {
        self.0
    }
}

impl From<u16> for Role {
    fn from(tag: u16) -> Self {
        Self(tag)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
