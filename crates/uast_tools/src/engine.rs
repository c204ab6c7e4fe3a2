//! Query engine abstraction.
//!
//! These traits describe the foreign engine the bridge drives. They mirror a
//! C API with implicit global state: a call reports success as a flag or a
//! null result, and the reason for a failure is fetched afterwards with
//! `last_error`. The bridge keeps each engine behind its own lock, so an
//! implementation is never entered by two threads at once and never
//! reentered from inside one of its own calls.
//!
//! Two engines are used:
//!
//! - [`QueryEngine`]: evaluates a path query and exposes the result set
//! - [`TraversalEngine`]: owns traversal cursors and steps them one node at a time

use std::ffi::{CStr, CString, c_int};

use crate::{Cursor, Handle, NodeAccess};

/// An engine that evaluates path queries.
///
/// # Safety
///
/// Every handle the engine passes to a [`NodeAccess`] reader or returns from
/// [`result_at`](Self::result_at) must be one the bridge issued during the
/// same call: the `root` argument or a handle obtained through `child_at`.
/// The bridge turns returned handles back into node references without
/// checking them.
pub unsafe trait QueryEngine: Send {
    /// Evaluates `query` against the tree rooted at `root`.
    ///
    /// Returns `false` on failure, leaving the reason in
    /// [`last_error`](Self::last_error). On success the results are readable
    /// through [`result_count`](Self::result_count) and
    /// [`result_at`](Self::result_at) until the next call.
    fn filter(&mut self, access: &NodeAccess<'_>, root: Handle, query: &CStr) -> bool;

    /// Number of results of the last successful [`filter`](Self::filter).
    fn result_count(&self) -> usize;

    /// Result at `index`, in the engine's own order.
    fn result_at(&self, index: usize) -> Option<Handle>;

    /// Takes the message describing the last failure.
    fn last_error(&mut self) -> Option<CString>;
}

/// An engine that walks trees through cursors.
///
/// # Safety
///
/// Cursors may hold handles between calls; the bridge keeps the tree alive
/// until the cursor is freed. Every handle the engine reads through a
/// [`NodeAccess`] or returns from [`iterator_next`](Self::iterator_next)
/// must come from the `root` given to [`iterator_new`](Self::iterator_new)
/// for the same cursor or from `child_at` on such a handle.
pub unsafe trait TraversalEngine: Send {
    /// Creates a cursor over the tree rooted at `root`.
    ///
    /// `order` is a raw [`TreeOrder`](crate::TreeOrder) value, passed through
    /// unmodified. Returns `None` on failure, leaving the reason in
    /// [`last_error`](Self::last_error).
    fn iterator_new(&mut self, access: &NodeAccess<'_>, root: Handle, order: c_int)
    -> Option<Cursor>;

    /// Advances the cursor. Returns `None` once the traversal is over.
    fn iterator_next(&mut self, access: &NodeAccess<'_>, cursor: Cursor) -> Option<Handle>;

    /// Releases the cursor. Freeing an unknown cursor must be harmless.
    fn iterator_free(&mut self, cursor: Cursor);

    /// Takes the message describing the last failure.
    fn last_error(&mut self) -> Option<CString>;
}

/// Copies an engine error message into an owned string.
///
/// The engine's buffer is dropped here, before the caller releases the
/// boundary lock.
pub(crate) fn take_message(error: Option<CString>, fallback: &str) -> String {
    match error {
        Some(message) => message.to_string_lossy().into_owned(),
        None => fallback.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_message_copies_engine_text() {
        let message = CString::new("bad step").unwrap();
        assert_eq!(take_message(Some(message), "unknown"), "bad step");
    }

    #[test]
    fn test_take_message_falls_back() {
        assert_eq!(take_message(None, "unknown error"), "unknown error");
    }
}
