//! The bridge between host trees and a query engine.
//!
//! This module provides [`Bridge`], which hands host trees to a
//! [`QueryEngine`] and a [`TraversalEngine`] without copying them. Each
//! engine sits behind its own lock, so a query and a traversal can run at
//! the same time while calls of the same kind queue up.

use std::ffi::c_int;
use std::sync::Arc;

use tracing::{debug, warn};
use uast_node::Node;

use crate::boundary::Boundary;
use crate::engine::take_message;
use crate::{
    BridgeConfig, Handle, QueryEngine, ToolsError, TraversalEngine, TreeIterator, TreeOrder,
};

/// Host for a query engine and a traversal engine.
///
/// A `Bridge` is `Sync` and is normally created once and shared, the way a
/// process would load a single instance of the engine library.
///
/// # Example
///
/// ```rust,ignore
/// use uast_node::Node;
/// use uast_tools::{Bridge, TreeOrder};
///
/// let bridge = Bridge::new(query_engine, traversal_engine);
/// let root = Node::new("Module").with_child(Node::new("Identifier")).into_shared();
///
/// let identifiers = bridge.filter(&root, "//Identifier")?;
///
/// let mut iter = bridge.iterate(&root, TreeOrder::PreOrder)?;
/// for node in iter.nodes() {
///     println!("{}", node.internal_type);
/// }
/// iter.dispose();
/// ```
pub struct Bridge<Q, T> {
    evaluation: Boundary<Q>,
    iteration: Boundary<T>,
    config: BridgeConfig,
}

impl<Q: QueryEngine, T: TraversalEngine> Bridge<Q, T> {
    /// Creates a bridge with the default configuration.
    pub fn new(query: Q, traversal: T) -> Self {
        Self::with_config(query, traversal, BridgeConfig::default())
    }

    /// Creates a bridge with the given configuration.
    pub fn with_config(query: Q, traversal: T, config: BridgeConfig) -> Self {
        Self {
            evaluation: Boundary::new("evaluation", query, config.arena_capacity),
            iteration: Boundary::new("iteration", traversal, config.arena_capacity),
            config,
        }
    }

    /// Returns the configuration the bridge was created with.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Returns the nodes under `root` that satisfy `query`.
    ///
    /// The nodes are the tree's own nodes, not copies, in the order the
    /// engine reports them. An empty query matches nothing and does not
    /// reach the engine.
    ///
    /// The engine sees `query` as a C string, so it is cut at the first NUL
    /// byte: `"//Call\0junk"` runs as `"//Call"`, and `"\0//Call"` reaches
    /// the engine as an empty query rather than short-circuiting here.
    ///
    /// # Errors
    ///
    /// [`ToolsError::Query`] with the engine's message when the query is
    /// rejected or evaluation fails. No partial result is returned.
    pub fn filter(&self, root: &Arc<Node>, query: &str) -> Result<Vec<Arc<Node>>, ToolsError> {
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let mut call = self.evaluation.enter();
        let (engine, scope) = call.split();
        let exported = scope.export(query);
        let access = scope.access();

        debug!("Filtering {} with query {:?}", root.internal_type, query);
        if !engine.filter(&access, Handle::from_node(root), exported) {
            let message = take_message(engine.last_error(), "unknown error");
            warn!("Query {:?} failed: {}", query, message);
            return Err(ToolsError::query(message));
        }

        let count = engine.result_count();
        let mut nodes = Vec::with_capacity(count);
        for index in 0..count {
            let handle = engine.result_at(index).ok_or_else(|| {
                ToolsError::query(format!("engine reported {count} results but #{index} is missing"))
            })?;
            // SAFETY: `QueryEngine` only returns handles issued during this
            // call, and `root` keeps every node reachable from it alive.
            nodes.push(unsafe { handle.to_shared() });
        }

        debug!("Query {:?} matched {} nodes", query, nodes.len());
        Ok(nodes)
    }

    /// Starts a traversal of the tree rooted at `root`.
    ///
    /// The iterator keeps the tree alive until it is dropped. Dispose it (or
    /// drop it) once done so the engine can free its cursor.
    ///
    /// # Errors
    ///
    /// [`ToolsError::Iterator`] with the engine's message when the cursor
    /// cannot be created.
    pub fn iterate(
        &self,
        root: &Arc<Node>,
        order: TreeOrder,
    ) -> Result<TreeIterator<'_, T>, ToolsError> {
        self.iterate_raw(root, order.as_raw())
    }

    /// Like [`iterate`](Self::iterate), with the order given as the raw value
    /// the engine receives. Values outside [`TreeOrder`] are passed through
    /// and left for the engine to reject.
    pub fn iterate_raw(
        &self,
        root: &Arc<Node>,
        order: c_int,
    ) -> Result<TreeIterator<'_, T>, ToolsError> {
        let root = Arc::clone(root);

        let cursor = {
            let mut call = self.iteration.enter();
            let (engine, scope) = call.split();
            let access = scope.access();

            match engine.iterator_new(&access, Handle::from_node(&root), order) {
                Some(cursor) => cursor,
                None => {
                    let message = take_message(engine.last_error(), "unknown error");
                    warn!("Creating iterator with order {} failed: {}", order, message);
                    return Err(ToolsError::iterator(message));
                }
            }
        };

        debug!(
            "Created iterator {} with order {} over {}",
            cursor.get(),
            order,
            root.internal_type
        );
        Ok(TreeIterator::new(&self.iteration, root, cursor))
    }
}
