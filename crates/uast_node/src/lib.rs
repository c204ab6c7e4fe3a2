//! # uast_node
//!
//! UAST node definitions for the query bridge.
//!
//! This crate provides the host-side tree that `uast_tools` exposes to a
//! foreign query engine. Nodes are immutable once built and are shared
//! through [`std::sync::Arc`], so a child may be referenced by more than one
//! parent and the address of every node stays stable for as long as anything
//! holds the tree.
//!
//! ## Example
//!
//! ```rust
//! use uast_node::{Node, Position, Role};
//!
//! let ident = Node::new("Identifier")
//!     .with_token("main")
//!     .with_role(Role::new(18))
//!     .with_start(Position::new(4, 1, 5));
//!
//! let root = Node::new("Module").with_child(ident).into_shared();
//! assert_eq!(root.subtree_size(), 2);
//! ```

mod node;
mod position;
mod role;

pub use node::Node;
pub use position::Position;
pub use role::Role;
