//! # uast_engine
//!
//! A query and traversal engine that reads UAST trees only through the
//! `uast_tools` callback table.
//!
//! - [`XPathEngine`]: evaluates an XPath 1.0 flavoured path language
//! - [`Walker`]: pre-, post- and level-order cursors
//!
//! The free functions [`filter`] and [`iterate`] go through one shared
//! [`Bridge`] created on first use, the way a process loads one copy of an
//! engine library.
//!
//! ## Example
//!
//! ```rust,ignore
//! use uast_tools::{Node, TreeOrder};
//!
//! let root = Node::new("Module")
//!     .with_child(Node::new("Identifier").with_token("x"))
//!     .into_shared();
//!
//! let found = uast_engine::filter(&root, "//Identifier[@token = 'x']")?;
//! assert_eq!(found.len(), 1);
//!
//! let mut iter = uast_engine::iterate(&root, TreeOrder::PostOrder)?;
//! let order: Vec<_> = iter.nodes().map(|n| n.internal_type.clone()).collect();
//! iter.dispose();
//! ```

mod ast;
mod document;
mod error;
mod eval;
mod functions;
mod parser;
mod walker;
mod xpath;

use std::sync::{Arc, OnceLock};

use tracing::info;
use uast_tools::{Bridge, Node, ToolsError, TreeIterator, TreeOrder};

pub use error::XPathError;
pub use walker::Walker;
pub use xpath::XPathEngine;

/// The bridge type behind [`bridge`].
pub type DefaultBridge = Bridge<XPathEngine, Walker>;

static BRIDGE: OnceLock<DefaultBridge> = OnceLock::new();

/// Returns the process-wide bridge, creating it on first use.
pub fn bridge() -> &'static DefaultBridge {
    BRIDGE.get_or_init(|| {
        info!("Initializing shared query bridge");
        Bridge::new(XPathEngine::new(), Walker::new())
    })
}

/// Runs `query` against the tree rooted at `root` on the shared bridge.
///
/// See [`Bridge::filter`].
pub fn filter(root: &Arc<Node>, query: &str) -> Result<Vec<Arc<Node>>, ToolsError> {
    bridge().filter(root, query)
}

/// Starts a traversal on the shared bridge.
///
/// See [`Bridge::iterate`].
pub fn iterate(
    root: &Arc<Node>,
    order: TreeOrder,
) -> Result<TreeIterator<'static, Walker>, ToolsError> {
    bridge().iterate(root, order)
}
