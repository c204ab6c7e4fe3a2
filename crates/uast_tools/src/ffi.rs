//! The C ABI shared with query engines.
//!
//! The engine never sees a [`Node`](uast_node::Node). It gets a [`NodeIface`]
//! table of `extern "C"` callbacks plus an opaque context pointer, and asks
//! for one field of one node at a time by [`Handle`]. Strings come back as
//! NUL-terminated pointers into the boundary call's [`StringArena`], so they
//! stay valid until that call returns and no longer.
//!
//! [`StringArena`]: crate::StringArena

use std::ffi::{CStr, c_char, c_int, c_void};
use std::marker::PhantomData;
use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::Handle;

/// Callback table the engine uses to read host nodes.
///
/// Every entry receives the context pointer from [`NodeAccess::context`] as
/// its first argument. Out-of-range indices yield a null pointer, a null
/// handle or `0` rather than unwinding across the boundary.
#[repr(C)]
pub struct NodeIface {
    pub internal_type: unsafe extern "C" fn(*mut c_void, Handle) -> *const c_char,
    pub token: unsafe extern "C" fn(*mut c_void, Handle) -> *const c_char,
    pub children_size: unsafe extern "C" fn(*mut c_void, Handle) -> c_int,
    pub child_at: unsafe extern "C" fn(*mut c_void, Handle, c_int) -> Option<Handle>,
    pub roles_size: unsafe extern "C" fn(*mut c_void, Handle) -> c_int,
    pub role_at: unsafe extern "C" fn(*mut c_void, Handle, c_int) -> u16,
    pub properties_size: unsafe extern "C" fn(*mut c_void, Handle) -> c_int,
    pub property_key_at: unsafe extern "C" fn(*mut c_void, Handle, c_int) -> *const c_char,
    pub property_value_at: unsafe extern "C" fn(*mut c_void, Handle, c_int) -> *const c_char,
    pub has_start_offset: unsafe extern "C" fn(*mut c_void, Handle) -> bool,
    pub start_offset: unsafe extern "C" fn(*mut c_void, Handle) -> u32,
    pub has_start_line: unsafe extern "C" fn(*mut c_void, Handle) -> bool,
    pub start_line: unsafe extern "C" fn(*mut c_void, Handle) -> u32,
    pub has_start_col: unsafe extern "C" fn(*mut c_void, Handle) -> bool,
    pub start_col: unsafe extern "C" fn(*mut c_void, Handle) -> u32,
    pub has_end_offset: unsafe extern "C" fn(*mut c_void, Handle) -> bool,
    pub end_offset: unsafe extern "C" fn(*mut c_void, Handle) -> u32,
    pub has_end_line: unsafe extern "C" fn(*mut c_void, Handle) -> bool,
    pub end_line: unsafe extern "C" fn(*mut c_void, Handle) -> u32,
    pub has_end_col: unsafe extern "C" fn(*mut c_void, Handle) -> bool,
    pub end_col: unsafe extern "C" fn(*mut c_void, Handle) -> u32,
}

/// A position record as read through the callback table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawPosition {
    pub offset: u32,
    pub line: u32,
    pub col: u32,
}

/// What the engine receives for the duration of one boundary call.
///
/// The `'s` lifetime is the boundary call itself: strings read through this
/// value borrow the call's arena and cannot outlive it.
///
/// The typed readers are `unsafe` because they trust the handle. Passing a
/// handle that was not issued by the bridge (the root it was given, a result
/// of `child_at`, or a handle held by a live cursor) is undefined behavior.
pub struct NodeAccess<'s> {
    iface: &'static NodeIface,
    ctx: *mut c_void,
    _scope: PhantomData<&'s ()>,
}

impl<'s> NodeAccess<'s> {
    /// # Safety
    ///
    /// `ctx` must be the context `iface` expects and must stay valid for `'s`.
    pub(crate) unsafe fn new(iface: &'static NodeIface, ctx: *mut c_void) -> Self {
        Self {
            iface,
            ctx,
            _scope: PhantomData,
        }
    }

    /// The raw callback table.
    #[inline]
    pub fn iface(&self) -> &'static NodeIface {
        self.iface
    }

    /// The context pointer to pass to every callback.
    #[inline]
    pub fn context(&self) -> *mut c_void {
        self.ctx
    }

    /// # Safety
    ///
    /// `node` must be a handle issued by the bridge for a live tree.
    pub unsafe fn internal_type(&self, node: Handle) -> Option<&'s CStr> {
        unsafe { cstr((self.iface.internal_type)(self.ctx, node)) }
    }

    /// # Safety
    ///
    /// See [`NodeAccess::internal_type`].
    pub unsafe fn token(&self, node: Handle) -> Option<&'s CStr> {
        unsafe { cstr((self.iface.token)(self.ctx, node)) }
    }

    /// # Safety
    ///
    /// See [`NodeAccess::internal_type`].
    pub unsafe fn children_size(&self, node: Handle) -> usize {
        let size = unsafe { (self.iface.children_size)(self.ctx, node) };
        usize::try_from(size).unwrap_or(0)
    }

    /// # Safety
    ///
    /// See [`NodeAccess::internal_type`].
    pub unsafe fn child_at(&self, node: Handle, index: usize) -> Option<Handle> {
        let index = c_int::try_from(index).ok()?;
        unsafe { (self.iface.child_at)(self.ctx, node, index) }
    }

    /// # Safety
    ///
    /// See [`NodeAccess::internal_type`].
    pub unsafe fn roles(&self, node: Handle) -> Vec<u16> {
        let size = unsafe { (self.iface.roles_size)(self.ctx, node) };
        (0..size.max(0))
            .map(|index| unsafe { (self.iface.role_at)(self.ctx, node, index) })
            .collect()
    }

    /// # Safety
    ///
    /// See [`NodeAccess::internal_type`].
    pub unsafe fn properties_size(&self, node: Handle) -> usize {
        let size = unsafe { (self.iface.properties_size)(self.ctx, node) };
        usize::try_from(size).unwrap_or(0)
    }

    /// Key and value of the property at `index`, in the bridge's key order.
    ///
    /// # Safety
    ///
    /// See [`NodeAccess::internal_type`].
    pub unsafe fn property_at(&self, node: Handle, index: usize) -> Option<(&'s CStr, &'s CStr)> {
        let index = c_int::try_from(index).ok()?;
        unsafe {
            let key = cstr((self.iface.property_key_at)(self.ctx, node, index))?;
            let value = cstr((self.iface.property_value_at)(self.ctx, node, index))?;
            Some((key, value))
        }
    }

    /// # Safety
    ///
    /// See [`NodeAccess::internal_type`].
    pub unsafe fn start(&self, node: Handle) -> Option<RawPosition> {
        let iface = self.iface;
        unsafe {
            if !(iface.has_start_offset)(self.ctx, node) {
                return None;
            }
            Some(RawPosition {
                offset: (iface.start_offset)(self.ctx, node),
                line: (iface.start_line)(self.ctx, node),
                col: (iface.start_col)(self.ctx, node),
            })
        }
    }

    /// # Safety
    ///
    /// See [`NodeAccess::internal_type`].
    pub unsafe fn end(&self, node: Handle) -> Option<RawPosition> {
        let iface = self.iface;
        unsafe {
            if !(iface.has_end_offset)(self.ctx, node) {
                return None;
            }
            Some(RawPosition {
                offset: (iface.end_offset)(self.ctx, node),
                line: (iface.end_line)(self.ctx, node),
                col: (iface.end_col)(self.ctx, node),
            })
        }
    }
}

unsafe fn cstr<'s>(ptr: *const c_char) -> Option<&'s CStr> {
    if ptr.is_null() {
        None
    } else {
        Some(unsafe { CStr::from_ptr(ptr) })
    }
}

/// Identifier of a traversal cursor owned by the engine.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cursor(NonZeroUsize);

impl Cursor {
    /// Creates a cursor id. Returns `None` for `0`.
    #[inline]
    pub const fn new(id: usize) -> Option<Self> {
        match NonZeroUsize::new(id) {
            Some(id) => Some(Self(id)),
            None => None,
        }
    }

    /// Returns the integer id.
    #[inline]
    pub const fn get(self) -> usize {
        self.0.get()
    }
}

/// Traversal strategy for a tree walk.
///
/// The discriminants are the raw values passed to the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum TreeOrder {
    /// Parent before children.
    #[default]
    PreOrder = 0,
    /// Children before parent.
    PostOrder = 1,
    /// Breadth-first, level by level.
    LevelOrder = 2,
}

impl TreeOrder {
    /// The value handed to the engine.
    #[inline]
    pub const fn as_raw(self) -> c_int {
        self as c_int
    }

    /// Decodes a raw order value. Returns `None` for unknown values.
    pub const fn from_raw(raw: c_int) -> Option<Self> {
        match raw {
            0 => Some(Self::PreOrder),
            1 => Some(Self::PostOrder),
            2 => Some(Self::LevelOrder),
            _ => None,
        }
    }
}
