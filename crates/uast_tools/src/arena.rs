//! String arena for text exported across the boundary.
//!
//! Uses `bumpalo` so every string handed to the engine during one boundary
//! call lives in the same arena and is freed together when the call ends.

use std::cell::Cell;
use std::ffi::CStr;

use bumpalo::Bump;
use tracing::trace;

/// Batch-release arena of NUL-terminated string copies.
///
/// [`export`](Self::export) borrows the arena and [`release`](Self::release)
/// needs `&mut`, so an exported string can never be used after the arena
/// that owns it was released.
///
/// # Example
///
/// ```rust
/// use uast_tools::StringArena;
///
/// let mut arena = StringArena::new();
/// let exported = arena.export("Identifier");
/// assert_eq!(exported.to_bytes(), b"Identifier");
///
/// arena.release();
/// assert_eq!(arena.len(), 0);
/// ```
pub struct StringArena {
    bump: Bump,
    exported: Cell<usize>,
}

impl StringArena {
    /// Creates an empty arena.
    #[inline]
    pub fn new() -> Self {
        Self {
            bump: Bump::new(),
            exported: Cell::new(0),
        }
    }

    /// Creates an arena with `capacity` bytes reserved up front.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bump: Bump::with_capacity(capacity),
            exported: Cell::new(0),
        }
    }

    /// Copies `text` into the arena as a C string.
    ///
    /// A C reader stops at the first NUL byte, so text with an interior NUL
    /// is exported up to that byte.
    pub fn export(&self, text: &str) -> &CStr {
        let bytes = text.as_bytes();
        let len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());

        let buf = self.bump.alloc_slice_fill_copy(len + 1, 0u8);
        buf[..len].copy_from_slice(&bytes[..len]);
        self.exported.set(self.exported.get() + 1);
        trace!("Exported {} bytes across the boundary", len);

        // SAFETY: `buf` holds `len` non-NUL bytes followed by exactly one NUL.
        unsafe { CStr::from_bytes_with_nul_unchecked(buf) }
    }

    /// Number of strings exported since the last release.
    #[inline]
    pub fn len(&self) -> usize {
        self.exported.get()
    }

    /// Returns true if nothing was exported since the last release.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total bytes held by the arena, including reserved capacity.
    #[inline]
    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }

    /// Frees every string exported since the last release.
    ///
    /// The memory is kept for reuse by the next boundary call.
    pub fn release(&mut self) {
        self.bump.reset();
        self.exported.set(0);
    }
}

impl Default for StringArena {
    fn default() -> Self {
        Self::new()
    }
}
