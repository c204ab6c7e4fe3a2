//! Cursor-based tree walker.

use std::collections::{HashMap, VecDeque};
use std::ffi::{CString, c_int};

use tracing::{debug, trace};
use uast_tools::{Cursor, Handle, NodeAccess, TraversalEngine, TreeOrder};

/// Pending work of one cursor. Children are read when their parent is
/// visited, not up front.
#[derive(Debug)]
enum Frontier {
    Pre(Vec<Handle>),
    /// `(node, children_pushed)`
    Post(Vec<(Handle, bool)>),
    Level(VecDeque<Handle>),
}

unsafe fn children(access: &NodeAccess<'_>, node: Handle) -> Vec<Handle> {
    let size = unsafe { access.children_size(node) };
    (0..size)
        .filter_map(|index| unsafe { access.child_at(node, index) })
        .collect()
}

impl Frontier {
    fn new(order: TreeOrder, root: Handle) -> Self {
        match order {
            TreeOrder::PreOrder => Frontier::Pre(vec![root]),
            TreeOrder::PostOrder => Frontier::Post(vec![(root, false)]),
            TreeOrder::LevelOrder => Frontier::Level(VecDeque::from([root])),
        }
    }

    /// # Safety
    ///
    /// Every handle in the frontier must belong to a tree the bridge keeps
    /// alive for this cursor.
    unsafe fn advance(&mut self, access: &NodeAccess<'_>) -> Option<Handle> {
        match self {
            Frontier::Pre(stack) => {
                let node = stack.pop()?;
                stack.extend(unsafe { children(access, node) }.into_iter().rev());
                Some(node)
            }
            Frontier::Post(stack) => loop {
                let (node, expanded) = stack.pop()?;
                if expanded {
                    return Some(node);
                }
                stack.push((node, true));
                stack.extend(
                    unsafe { children(access, node) }
                        .into_iter()
                        .rev()
                        .map(|c| (c, false)),
                );
            },
            Frontier::Level(queue) => {
                let node = queue.pop_front()?;
                queue.extend(unsafe { children(access, node) });
                Some(node)
            }
        }
    }
}

/// A [`TraversalEngine`] supporting every [`TreeOrder`].
#[derive(Debug, Default)]
pub struct Walker {
    next_id: usize,
    cursors: HashMap<Cursor, Frontier>,
    last_error: Option<String>,
}

impl Walker {
    /// Creates a new walker with no open cursors.
    pub fn new() -> Self {
        Self::default()
    }
}

unsafe impl TraversalEngine for Walker {
    fn iterator_new(
        &mut self,
        _access: &NodeAccess<'_>,
        root: Handle,
        order: c_int,
    ) -> Option<Cursor> {
        let Some(order) = TreeOrder::from_raw(order) else {
            self.last_error = Some(format!("unsupported traversal order {order}"));
            return None;
        };

        self.next_id = self.next_id.wrapping_add(1).max(1);
        let cursor = Cursor::new(self.next_id)?;
        self.cursors.insert(cursor, Frontier::new(order, root));
        debug!("Opened {:?} cursor {}", order, cursor.get());
        Some(cursor)
    }

    fn iterator_next(&mut self, access: &NodeAccess<'_>, cursor: Cursor) -> Option<Handle> {
        let frontier = self.cursors.get_mut(&cursor)?;
        // SAFETY: the frontier only holds handles reached from this cursor's
        // root, which the bridge keeps alive until the cursor is freed.
        let node = unsafe { frontier.advance(access) };
        if node.is_none() {
            trace!("Cursor {} exhausted", cursor.get());
        }
        node
    }

    fn iterator_free(&mut self, cursor: Cursor) {
        if self.cursors.remove(&cursor).is_some() {
            debug!("Freed cursor {}", cursor.get());
        }
    }

    fn last_error(&mut self) -> Option<CString> {
        self.last_error.take().and_then(|e| CString::new(e).ok())
    }
}
