//! The engine's read-only view of a host tree.
//!
//! A [`Document`] is rebuilt for every query by walking the tree through the
//! callback table. It copies what the query language can see (names, tokens,
//! attributes) and keeps each element's [`Handle`] so results can be handed
//! back to the bridge.

use std::ffi::CStr;

use uast_tools::{Handle, NodeAccess, RawPosition};

/// Index of a node in a [`Document`]. Index order is document order.
pub type NodeId = usize;

/// The synthetic document node above the root element.
pub const DOCUMENT: NodeId = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct DocNode {
    /// `None` only for the document node.
    pub handle: Option<Handle>,
    pub name: String,
    pub token: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub attributes: Vec<Attribute>,
}

/// A node or attribute of a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef {
    Node(NodeId),
    Attribute(NodeId, usize),
}

impl NodeRef {
    /// Sort key for document order: an element comes before its attributes,
    /// which come before its children.
    pub fn order_key(self) -> (NodeId, usize) {
        match self {
            NodeRef::Node(id) => (id, 0),
            NodeRef::Attribute(id, index) => (id, index + 1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<DocNode>,
}

impl Document {
    /// Reads the tree rooted at `root` into a document, in pre-order.
    ///
    /// # Safety
    ///
    /// `root` must be the handle the bridge passed in with `access`.
    pub unsafe fn load(access: &NodeAccess<'_>, root: Handle) -> Self {
        let mut nodes = vec![DocNode {
            handle: None,
            name: String::new(),
            token: String::new(),
            parent: None,
            children: Vec::new(),
            attributes: Vec::new(),
        }];

        let mut stack = vec![(root, DOCUMENT)];
        while let Some((handle, parent)) = stack.pop() {
            let id = nodes.len();
            // SAFETY: `handle` is `root` or came from `child_at`.
            let node = unsafe { read_node(access, handle, parent) };
            nodes.push(node);
            nodes[parent].children.push(id);

            let size = unsafe { access.children_size(handle) };
            for index in (0..size).rev() {
                if let Some(child) = unsafe { access.child_at(handle, index) } {
                    stack.push((child, id));
                }
            }
        }

        Self { nodes }
    }

    pub fn node(&self, id: NodeId) -> &DocNode {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn attribute(&self, id: NodeId, index: usize) -> &Attribute {
        &self.nodes[id].attributes[index]
    }

    /// The string value used by comparisons and `string()`.
    ///
    /// An element's value is its token; an attribute's is its value.
    pub fn string_value(&self, node: NodeRef) -> &str {
        match node {
            NodeRef::Node(id) => &self.nodes[id].token,
            NodeRef::Attribute(id, index) => &self.attribute(id, index).value,
        }
    }

    pub fn name(&self, node: NodeRef) -> &str {
        match node {
            NodeRef::Node(id) => &self.nodes[id].name,
            NodeRef::Attribute(id, index) => &self.attribute(id, index).name,
        }
    }

    /// All descendants of `id`, in document order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[id].children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.nodes[next].children.iter().rev());
        }
        out
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.nodes[id].parent;
        while let Some(parent) = current {
            out.push(parent);
            current = self.nodes[parent].parent;
        }
        out
    }
}

fn owned(text: Option<&CStr>) -> String {
    text.map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn push_position(attributes: &mut Vec<Attribute>, prefix: &str, position: Option<RawPosition>) {
    if let Some(pos) = position {
        for (field, value) in [("Offset", pos.offset), ("Line", pos.line), ("Col", pos.col)] {
            attributes.push(Attribute {
                name: format!("{prefix}{field}"),
                value: value.to_string(),
            });
        }
    }
}

unsafe fn read_node(access: &NodeAccess<'_>, handle: Handle, parent: NodeId) -> DocNode {
    let token = owned(unsafe { access.token(handle) });

    let mut attributes = Vec::new();
    if !token.is_empty() {
        attributes.push(Attribute {
            name: "token".to_string(),
            value: token.clone(),
        });
    }
    for role in unsafe { access.roles(handle) } {
        attributes.push(Attribute {
            name: "role".to_string(),
            value: role.to_string(),
        });
    }
    for index in 0..unsafe { access.properties_size(handle) } {
        if let Some((key, value)) = unsafe { access.property_at(handle, index) } {
            attributes.push(Attribute {
                name: owned(Some(key)),
                value: owned(Some(value)),
            });
        }
    }
    push_position(&mut attributes, "start", unsafe { access.start(handle) });
    push_position(&mut attributes, "end", unsafe { access.end(handle) });

    DocNode {
        handle: Some(handle),
        name: owned(unsafe { access.internal_type(handle) }),
        token,
        parent: Some(parent),
        children: Vec::new(),
        attributes,
    }
}
