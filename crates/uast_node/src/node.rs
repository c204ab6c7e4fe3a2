//! Node definition.
//!
//! The core tree type handed to the query bridge.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{Position, Role};

/// A node in a UAST.
///
/// Children are shared (`Arc`) rather than owned exclusively by their parent,
/// so the same subtree can appear under several parents and a tree can be
/// handed out while other code still holds parts of it.
///
/// # Example
///
/// ```rust
/// use uast_node::Node;
///
/// let call = Node::new("Call")
///     .with_child(Node::new("Identifier").with_token("print"))
///     .with_property("arity", "1");
///
/// assert!(call.has_children());
/// assert_eq!(call.properties["arity"], "1");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Language-specific type of this node.
    pub internal_type: String,

    /// Source token; empty for nodes that do not carry one.
    #[serde(default)]
    pub token: String,

    /// Child nodes, in source order.
    #[serde(default)]
    pub children: Vec<Arc<Node>>,

    /// Role tags, in the order they were assigned.
    #[serde(default)]
    pub roles: Vec<Role>,

    /// Arbitrary key/value annotations. No ordering is implied.
    #[serde(default)]
    pub properties: HashMap<String, String>,

    /// Where the node starts in the source, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_position: Option<Position>,

    /// Where the node ends in the source, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_position: Option<Position>,
}

impl Node {
    /// Creates a node with the given internal type and nothing else.
    pub fn new(internal_type: impl Into<String>) -> Self {
        Self {
            internal_type: internal_type.into(),
            ..Self::default()
        }
    }

    /// Sets the token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    /// Appends a child.
    pub fn with_child(mut self, child: impl Into<Arc<Node>>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Appends several children.
    pub fn with_children<I, C>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Arc<Node>>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    /// Appends a role.
    pub fn with_role(mut self, role: impl Into<Role>) -> Self {
        self.roles.push(role.into());
        self
    }

    /// Inserts a property, replacing any previous value for `key`.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Sets the start position.
    pub fn with_start(mut self, position: Position) -> Self {
        self.start_position = Some(position);
        self
    }

    /// Sets the end position.
    pub fn with_end(mut self, position: Position) -> Self {
        self.end_position = Some(position);
        self
    }

    /// Moves the node behind an `Arc` so it can be handed to the bridge.
    #[inline]
    pub fn into_shared(self) -> Arc<Node> {
        Arc::new(self)
    }

    /// Returns true if this node has children.
    #[inline]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Number of nodes in the subtree rooted here, counting this node.
    ///
    /// A child shared by several parents is counted once per occurrence,
    /// which is what a traversal visits.
    pub fn subtree_size(&self) -> usize {
        let mut count = 0;
        let mut stack: Vec<&Node> = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter().map(|child| child.as_ref()));
        }
        count
    }
}
