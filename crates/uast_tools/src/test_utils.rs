//! Test utilities for uast_tools.
//!
//! Small engines that drive the bridge exactly like a real one would, through
//! the callback table only, and record what they saw.

use std::collections::HashMap;
use std::ffi::{CStr, CString, c_int};
use std::sync::{Arc, Barrier};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use uast_node::{Node, Position, Role};

use crate::{Cursor, Handle, NodeAccess, QueryEngine, RawPosition, TraversalEngine};

/// A seven-node tree:
///
/// ```text
/// Module
/// ├── FunctionDef "main"
/// │   ├── Identifier "main"
/// │   └── Body
/// │       └── Call "print"
/// │           └── Identifier "x"
/// └── Comment "# done"
/// ```
pub fn sample_tree() -> Arc<Node> {
    let call = Node::new("Call")
        .with_token("print")
        .with_role(Role(3))
        .with_child(Node::new("Identifier").with_token("x"));

    let function = Node::new("FunctionDef")
        .with_token("main")
        .with_role(Role(1))
        .with_role(Role(2))
        .with_property("b", "2")
        .with_property("a", "1")
        .with_start(Position::new(0, 1, 1))
        .with_end(Position::new(38, 3, 14))
        .with_child(
            Node::new("Identifier")
                .with_token("main")
                .with_start(Position::new(4, 1, 5))
                .with_end(Position::new(8, 1, 9)),
        )
        .with_child(Node::new("Body").with_child(call));

    Node::new("Module")
        .with_property("language", "python")
        .with_start(Position::new(0, 1, 1))
        .with_end(Position::new(40, 4, 1))
        .with_child(function)
        .with_child(Node::new("Comment").with_token("# done"))
        .into_shared()
}

/// Everything a [`RecordingEngine`] read about the root of one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub internal_type: String,
    pub token: String,
    pub roles: Vec<u16>,
    /// Properties read once in index order.
    pub properties: Vec<(String, String)>,
    /// The same properties read a second time within the same call.
    pub properties_again: Vec<(String, String)>,
    pub start: Option<RawPosition>,
    pub end: Option<RawPosition>,
}

/// Query engine that matches nodes by internal type.
///
/// The query is a type name, or `*` for every node; results come back in
/// pre-order (or reversed). A query starting with `!` fails with the rest of
/// the query as its error message.
#[derive(Default)]
pub struct RecordingEngine {
    reversed: bool,
    results: Vec<Handle>,
    error: Option<String>,
    calls: Arc<AtomicUsize>,
    observations: Arc<Mutex<Vec<Observation>>>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports results in reverse pre-order.
    pub fn reversed() -> Self {
        Self {
            reversed: true,
            ..Self::default()
        }
    }

    /// Counter of `filter` calls that reached the engine.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    /// One observation per successful `filter` call.
    pub fn observations(&self) -> Arc<Mutex<Vec<Observation>>> {
        Arc::clone(&self.observations)
    }
}

fn owned(text: Option<&CStr>) -> String {
    text.map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

unsafe fn properties(access: &NodeAccess<'_>, node: Handle) -> Vec<(String, String)> {
    unsafe {
        (0..access.properties_size(node))
            .filter_map(|i| access.property_at(node, i))
            .map(|(k, v)| (owned(Some(k)), owned(Some(v))))
            .collect()
    }
}

unsafe fn preorder(access: &NodeAccess<'_>, root: Handle) -> Vec<Handle> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        out.push(node);
        unsafe {
            let size = access.children_size(node);
            stack.extend((0..size).rev().filter_map(|i| access.child_at(node, i)));
        }
    }
    out
}

unsafe impl QueryEngine for RecordingEngine {
    fn filter(&mut self, access: &NodeAccess<'_>, root: Handle, query: &CStr) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.results.clear();

        let query = query.to_string_lossy();
        if let Some(message) = query.strip_prefix('!') {
            self.error = Some(message.to_string());
            return false;
        }

        // SAFETY: only `root` and handles from `child_at` are used.
        unsafe {
            self.observations.lock().push(Observation {
                internal_type: owned(access.internal_type(root)),
                token: owned(access.token(root)),
                roles: access.roles(root),
                properties: properties(access, root),
                properties_again: properties(access, root),
                start: access.start(root),
                end: access.end(root),
            });

            for node in preorder(access, root) {
                let name = owned(access.internal_type(node));
                if query == "*" || name == query {
                    self.results.push(node);
                }
            }
        }

        if self.reversed {
            self.results.reverse();
        }
        true
    }

    fn result_count(&self) -> usize {
        self.results.len()
    }

    fn result_at(&self, index: usize) -> Option<Handle> {
        self.results.get(index).copied()
    }

    fn last_error(&mut self) -> Option<CString> {
        self.error.take().and_then(|e| CString::new(e).ok())
    }
}

/// Traversal engine that always walks in pre-order, whatever order it is
/// asked for, and counts cursor releases.
#[derive(Default)]
pub struct StubWalker {
    fail_with: Option<String>,
    gate: Option<Arc<Barrier>>,
    error: Option<String>,
    next_id: usize,
    cursors: HashMap<usize, Vec<Handle>>,
    frees: Arc<AtomicUsize>,
    orders: Arc<Mutex<Vec<c_int>>>,
}

impl StubWalker {
    pub fn new() -> Self {
        Self::default()
    }

    /// A walker whose cursors can never be created.
    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// A walker that meets `gate` twice inside every `iterator_next`: once
    /// on entry and once before returning, while the iteration lock is held.
    pub fn gated(gate: Arc<Barrier>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    /// Counter of cursors actually released.
    pub fn frees(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.frees)
    }

    /// Raw order values received, in call order.
    pub fn orders(&self) -> Arc<Mutex<Vec<c_int>>> {
        Arc::clone(&self.orders)
    }
}

unsafe impl TraversalEngine for StubWalker {
    fn iterator_new(
        &mut self,
        _access: &NodeAccess<'_>,
        root: Handle,
        order: c_int,
    ) -> Option<Cursor> {
        self.orders.lock().push(order);
        if let Some(message) = &self.fail_with {
            self.error = Some(message.clone());
            return None;
        }
        self.next_id += 1;
        self.cursors.insert(self.next_id, vec![root]);
        Cursor::new(self.next_id)
    }

    fn iterator_next(&mut self, access: &NodeAccess<'_>, cursor: Cursor) -> Option<Handle> {
        if let Some(gate) = &self.gate {
            gate.wait();
            gate.wait();
        }
        let stack = self.cursors.get_mut(&cursor.get())?;
        let node = stack.pop()?;
        // SAFETY: the stack only holds the root and handles from `child_at`.
        unsafe {
            let size = access.children_size(node);
            stack.extend((0..size).rev().filter_map(|i| access.child_at(node, i)));
        }
        Some(node)
    }

    fn iterator_free(&mut self, cursor: Cursor) {
        if self.cursors.remove(&cursor.get()).is_some() {
            self.frees.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn last_error(&mut self) -> Option<CString> {
        self.error.take().and_then(|e| CString::new(e).ok())
    }
}
