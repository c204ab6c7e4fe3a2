//! Incremental traversal over a host tree.

use std::iter::FusedIterator;
use std::sync::Arc;

use tracing::debug;
use uast_node::Node;

use crate::boundary::Boundary;
use crate::{Cursor, ToolsError, TraversalEngine};

/// Lifecycle of a [`TreeIterator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IteratorState {
    /// The cursor can be advanced.
    Active,
    /// The engine reported the end of the traversal.
    Finished,
    /// The cursor was released.
    Disposed,
}

/// A traversal in progress, backed by a cursor owned by the engine.
///
/// Every step is a separate call into the engine under the iteration lock.
/// The iterator holds a strong reference to the root, so the engine's
/// cursor can keep handles into the tree between steps.
///
/// The cursor is released by [`dispose`](Self::dispose) or, failing that,
/// when the iterator is dropped.
pub struct TreeIterator<'b, T: TraversalEngine> {
    boundary: &'b Boundary<T>,
    root: Arc<Node>,
    cursor: Option<Cursor>,
    state: IteratorState,
}

impl<'b, T: TraversalEngine> TreeIterator<'b, T> {
    pub(crate) fn new(boundary: &'b Boundary<T>, root: Arc<Node>, cursor: Cursor) -> Self {
        Self {
            boundary,
            root,
            cursor: Some(cursor),
            state: IteratorState::Active,
        }
    }

    /// Returns the root of the traversal.
    pub fn root(&self) -> &Arc<Node> {
        &self.root
    }

    /// Returns the current state.
    pub fn state(&self) -> IteratorState {
        self.state
    }

    /// Returns the next node, or `None` once the traversal is over.
    ///
    /// # Errors
    ///
    /// [`ToolsError::State`] when called again after returning `None`, or
    /// after [`dispose`](Self::dispose). Stop at the first `None`.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<Option<Arc<Node>>, ToolsError> {
        let cursor = match (self.state, self.cursor) {
            (IteratorState::Active, Some(cursor)) => cursor,
            (IteratorState::Disposed, _) => {
                return Err(ToolsError::state("next() called on disposed iterator"));
            }
            _ => return Err(ToolsError::state("next() called on finished iterator")),
        };

        let mut call = self.boundary.enter();
        let (engine, scope) = call.split();
        let access = scope.access();

        match engine.iterator_next(&access, cursor) {
            // SAFETY: the cursor only yields handles into the tree under
            // `self.root`, which is alive for as long as `self`.
            Some(handle) => Ok(Some(unsafe { handle.to_shared() })),
            None => {
                debug!("Iterator {} reached the end", cursor.get());
                self.state = IteratorState::Finished;
                Ok(None)
            }
        }
    }

    /// Lazily yields the remaining nodes.
    ///
    /// The sequence ends at the first end-of-traversal or error and does not
    /// dispose the iterator.
    pub fn nodes(&mut self) -> Nodes<'_, 'b, T> {
        let done = self.state != IteratorState::Active;
        Nodes { iter: self, done }
    }

    /// Releases the engine's cursor.
    ///
    /// Safe to call any number of times, before or after the traversal
    /// finished. Further calls to [`next`](Self::next) fail.
    pub fn dispose(&mut self) {
        if let Some(cursor) = self.cursor.take() {
            let mut call = self.boundary.enter();
            let (engine, _scope) = call.split();
            engine.iterator_free(cursor);
            debug!("Disposed iterator {}", cursor.get());
        }
        self.state = IteratorState::Disposed;
    }
}

impl<T: TraversalEngine> Drop for TreeIterator<'_, T> {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Streaming view returned by [`TreeIterator::nodes`].
pub struct Nodes<'i, 'b, T: TraversalEngine> {
    iter: &'i mut TreeIterator<'b, T>,
    done: bool,
}

impl<T: TraversalEngine> Iterator for Nodes<'_, '_, T> {
    type Item = Arc<Node>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.iter.next() {
            Ok(Some(node)) => Some(node),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                debug!("Node stream stopped: {}", e);
                self.done = true;
                None
            }
        }
    }
}

impl<T: TraversalEngine> FusedIterator for Nodes<'_, '_, T> {}
