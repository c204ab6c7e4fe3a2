//! Host side of the callback table.
//!
//! Each callback resolves its handle back to a `&Node`, reads one field and,
//! for text, exports a copy into the arena of the call in progress. They are
//! read-only and never panic, since unwinding out of an `extern "C"`
//! function aborts the process.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::{CStr, c_char, c_int, c_void};
use std::ptr;

use uast_node::{Node, Position};

use crate::arena::StringArena;
use crate::ffi::{NodeAccess, NodeIface};
use crate::handle::Handle;

static NODE_IFACE: NodeIface = NodeIface {
    internal_type,
    token,
    children_size,
    child_at,
    roles_size,
    role_at,
    properties_size,
    property_key_at,
    property_value_at,
    has_start_offset,
    start_offset,
    has_start_line,
    start_line,
    has_start_col,
    start_col,
    has_end_offset,
    end_offset,
    has_end_line,
    end_line,
    has_end_col,
    end_col,
};

/// State shared by every callback of one boundary call.
///
/// Properties are stored unordered, so the first time the engine asks about
/// a node's properties its keys are sorted and the order is kept here. Every
/// later `key_at`/`value_at` in the same call indexes that same list.
pub(crate) struct CallScope<'a> {
    arena: &'a StringArena,
    property_order: RefCell<HashMap<Handle, Vec<&'a str>>>,
}

impl<'a> CallScope<'a> {
    pub(crate) fn new(arena: &'a StringArena) -> Self {
        Self {
            arena,
            property_order: RefCell::new(HashMap::new()),
        }
    }

    pub(crate) fn export(&self, text: &str) -> &'a CStr {
        self.arena.export(text)
    }

    /// Hands out the callback table bound to this scope.
    pub(crate) fn access(&self) -> NodeAccess<'_> {
        let ctx = self as *const Self as *mut c_void;
        // SAFETY: `ctx` points at `self`, which the returned value borrows.
        unsafe { NodeAccess::new(&NODE_IFACE, ctx) }
    }

    fn property_key(&self, handle: Handle, node: &'a Node, index: usize) -> Option<&'a str> {
        let mut order = self.property_order.borrow_mut();
        let keys = order.entry(handle).or_insert_with(|| {
            let mut keys: Vec<&'a str> = node.properties.keys().map(String::as_str).collect();
            keys.sort_unstable();
            keys
        });
        keys.get(index).copied()
    }
}

/// # Safety
///
/// `ctx` must come from [`CallScope::access`] of a scope that is still alive
/// and `handle` must alias a live node.
unsafe fn resolve<'a>(ctx: *mut c_void, handle: Handle) -> (&'a CallScope<'a>, &'a Node) {
    unsafe { (&*(ctx as *const CallScope<'a>), handle.as_node()) }
}

fn count(len: usize) -> c_int {
    c_int::try_from(len).unwrap_or(c_int::MAX)
}

fn index(index: c_int) -> Option<usize> {
    usize::try_from(index).ok()
}

unsafe extern "C" fn internal_type(ctx: *mut c_void, node: Handle) -> *const c_char {
    let (scope, node) = unsafe { resolve(ctx, node) };
    scope.export(&node.internal_type).as_ptr()
}

unsafe extern "C" fn token(ctx: *mut c_void, node: Handle) -> *const c_char {
    let (scope, node) = unsafe { resolve(ctx, node) };
    scope.export(&node.token).as_ptr()
}

unsafe extern "C" fn children_size(_ctx: *mut c_void, node: Handle) -> c_int {
    count(unsafe { node.as_node() }.children.len())
}

unsafe extern "C" fn child_at(_ctx: *mut c_void, node: Handle, at: c_int) -> Option<Handle> {
    let node = unsafe { node.as_node() };
    let child = node.children.get(index(at)?)?;
    Some(Handle::from_node(child))
}

unsafe extern "C" fn roles_size(_ctx: *mut c_void, node: Handle) -> c_int {
    count(unsafe { node.as_node() }.roles.len())
}

unsafe extern "C" fn role_at(_ctx: *mut c_void, node: Handle, at: c_int) -> u16 {
    let node = unsafe { node.as_node() };
    index(at)
        .and_then(|i| node.roles.get(i))
        .map_or(0, |role| role.tag())
}

unsafe extern "C" fn properties_size(_ctx: *mut c_void, node: Handle) -> c_int {
    count(unsafe { node.as_node() }.properties.len())
}

unsafe extern "C" fn property_key_at(ctx: *mut c_void, handle: Handle, at: c_int) -> *const c_char {
    let (scope, node) = unsafe { resolve(ctx, handle) };
    match index(at).and_then(|i| scope.property_key(handle, node, i)) {
        Some(key) => scope.export(key).as_ptr(),
        None => ptr::null(),
    }
}

unsafe extern "C" fn property_value_at(
    ctx: *mut c_void,
    handle: Handle,
    at: c_int,
) -> *const c_char {
    let (scope, node) = unsafe { resolve(ctx, handle) };
    let value = index(at)
        .and_then(|i| scope.property_key(handle, node, i))
        .and_then(|key| node.properties.get(key));
    match value {
        Some(value) => scope.export(value).as_ptr(),
        None => ptr::null(),
    }
}

fn start(node: Handle) -> Option<Position> {
    // SAFETY: callbacks only run inside a boundary call with the tree pinned.
    unsafe { node.as_node() }.start_position
}

fn end(node: Handle) -> Option<Position> {
    // SAFETY: callbacks only run inside a boundary call with the tree pinned.
    unsafe { node.as_node() }.end_position
}

unsafe extern "C" fn has_start_offset(_ctx: *mut c_void, node: Handle) -> bool {
    start(node).is_some()
}

unsafe extern "C" fn start_offset(_ctx: *mut c_void, node: Handle) -> u32 {
    start(node).map_or(0, |p| p.offset)
}

unsafe extern "C" fn has_start_line(_ctx: *mut c_void, node: Handle) -> bool {
    start(node).is_some()
}

unsafe extern "C" fn start_line(_ctx: *mut c_void, node: Handle) -> u32 {
    start(node).map_or(0, |p| p.line)
}

unsafe extern "C" fn has_start_col(_ctx: *mut c_void, node: Handle) -> bool {
    start(node).is_some()
}

unsafe extern "C" fn start_col(_ctx: *mut c_void, node: Handle) -> u32 {
    start(node).map_or(0, |p| p.col)
}

unsafe extern "C" fn has_end_offset(_ctx: *mut c_void, node: Handle) -> bool {
    end(node).is_some()
}

unsafe extern "C" fn end_offset(_ctx: *mut c_void, node: Handle) -> u32 {
    end(node).map_or(0, |p| p.offset)
}

unsafe extern "C" fn has_end_line(_ctx: *mut c_void, node: Handle) -> bool {
    end(node).is_some()
}

unsafe extern "C" fn end_line(_ctx: *mut c_void, node: Handle) -> u32 {
    end(node).map_or(0, |p| p.line)
}

unsafe extern "C" fn has_end_col(_ctx: *mut c_void, node: Handle) -> bool {
    end(node).is_some()
}

unsafe extern "C" fn end_col(_ctx: *mut c_void, node: Handle) -> u32 {
    end(node).map_or(0, |p| p.col)
}
