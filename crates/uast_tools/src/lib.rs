//! # uast_tools
//!
//! Call bridge between host UAST trees and a foreign query engine.
//!
//! This crate provides:
//! - Path-query filtering that returns the tree's own nodes
//! - Incremental tree traversal in pre-, post- and level order
//! - The C callback table the engine reads nodes through
//! - Per-call string export with bulk release
//!
//! ## Architecture
//!
//! The engine never receives a copy of the tree. It gets a [`Handle`] for the
//! root and a [`NodeIface`] of `extern "C"` callbacks, and reads one field of
//! one node at a time. Strings it reads are exported into a [`StringArena`]
//! that is released when the boundary call returns.
//!
//! Filtering and traversal each go through their own lock:
//!
//! - **evaluation**: one [`QueryEngine`] call at a time
//! - **iteration**: one [`TraversalEngine`] call at a time
//!
//! Nodes stay alive across the boundary through shared ownership: a filter
//! borrows the caller's root for the duration of the call, and a
//! [`TreeIterator`] holds its own reference to the root until dropped.
//!
//! ## Example
//!
//! ```rust,ignore
//! use uast_node::Node;
//! use uast_tools::{Bridge, TreeOrder};
//!
//! let bridge = Bridge::new(query_engine, traversal_engine);
//! let root = Node::new("Module").with_child(Node::new("Identifier")).into_shared();
//!
//! let identifiers = bridge.filter(&root, "//Identifier")?;
//! let mut iter = bridge.iterate(&root, TreeOrder::LevelOrder)?;
//! while let Some(node) = iter.next()? {
//!     println!("{}", node.internal_type);
//! }
//! ```

mod arena;
mod boundary;
mod bridge;
mod callbacks;
mod config;
mod engine;
mod error;
mod ffi;
mod handle;
mod iterator;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use arena::StringArena;
pub use bridge::Bridge;
pub use config::{BridgeConfig, DEFAULT_ARENA_CAPACITY};
pub use engine::{QueryEngine, TraversalEngine};
pub use error::ToolsError;
pub use ffi::{Cursor, NodeAccess, NodeIface, RawPosition, TreeOrder};
pub use handle::Handle;
pub use iterator::{IteratorState, Nodes, TreeIterator};
pub use uast_node::Node;
