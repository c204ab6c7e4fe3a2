//! Opaque node handles.
//!
//! A [`Handle`] is the address of a host [`Node`] disguised as an integer.
//! There is no registry: converting a node to a handle and back is a pure
//! address cast. That only works because nodes never move. Every node lives
//! inside an `Arc` allocation, and the bridge keeps the root of the tree
//! alive (borrowed for a filter call, cloned into an iterator) for as long as
//! the engine may hold handles into it.

use std::num::NonZeroUsize;
use std::sync::Arc;

use uast_node::Node;

/// Non-owning, call-scoped alias for a host node.
///
/// Handles are never null, so `Option<Handle>` has the same layout as a
/// plain integer and `None` travels across the boundary as `0`.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(NonZeroUsize);

impl Handle {
    /// Rebuilds a handle from its integer form. Returns `None` for `0`.
    #[inline]
    pub const fn from_raw(raw: usize) -> Option<Self> {
        match NonZeroUsize::new(raw) {
            Some(raw) => Some(Self(raw)),
            None => None,
        }
    }

    /// Returns the integer form of the handle.
    #[inline]
    pub const fn into_raw(self) -> usize {
        self.0.get()
    }

    pub(crate) fn from_node(node: &Node) -> Self {
        let addr = (node as *const Node).expose_provenance();
        // SAFETY: references are never null.
        Self(unsafe { NonZeroUsize::new_unchecked(addr) })
    }

    /// # Safety
    ///
    /// The handle must come from [`Handle::from_node`] and the node must still
    /// be alive for `'a`.
    pub(crate) unsafe fn as_node<'a>(self) -> &'a Node {
        let ptr = std::ptr::with_exposed_provenance::<Node>(self.0.get());
        unsafe { &*ptr }
    }

    /// Returns a new strong reference to the aliased node.
    ///
    /// # Safety
    ///
    /// Same as [`Handle::as_node`], and the node must live inside an
    /// `Arc<Node>` allocation. Both hold for every node reachable from an
    /// `Arc<Node>` root because children are themselves `Arc<Node>`.
    pub(crate) unsafe fn to_shared(self) -> Arc<Node> {
        let ptr = std::ptr::with_exposed_provenance::<Node>(self.0.get());
        unsafe {
            Arc::increment_strong_count(ptr);
            Arc::from_raw(ptr)
        }
    }
}
