//! Scoped entry into an engine.
//!
//! A [`Boundary`] owns one engine together with the string arena its calls
//! export into, behind a lock. [`Boundary::enter`] returns a guard for one
//! boundary call; dropping the guard releases the arena and then the lock,
//! on every exit path.

use parking_lot::{Mutex, MutexGuard};
use tracing::trace;

use crate::arena::StringArena;
use crate::callbacks::CallScope;

struct Session<E> {
    engine: E,
    arena: StringArena,
}

/// One engine and the lock that serializes calls into it.
pub(crate) struct Boundary<E> {
    name: &'static str,
    session: Mutex<Session<E>>,
}

impl<E> Boundary<E> {
    pub(crate) fn new(name: &'static str, engine: E, arena_capacity: usize) -> Self {
        Self {
            name,
            session: Mutex::new(Session {
                engine,
                arena: StringArena::with_capacity(arena_capacity),
            }),
        }
    }

    /// Blocks until no other call is inside this boundary.
    pub(crate) fn enter(&self) -> BoundaryCall<'_, E> {
        let session = self.session.lock();
        trace!("Entered {} boundary", self.name);
        BoundaryCall {
            name: self.name,
            session,
        }
    }
}

/// Guard for one boundary call.
pub(crate) struct BoundaryCall<'b, E> {
    name: &'static str,
    session: MutexGuard<'b, Session<E>>,
}

impl<E> BoundaryCall<'_, E> {
    /// The engine, plus the callback scope it reads the tree through.
    pub(crate) fn split(&mut self) -> (&mut E, CallScope<'_>) {
        let session = &mut *self.session;
        (&mut session.engine, CallScope::new(&session.arena))
    }
}

impl<E> Drop for BoundaryCall<'_, E> {
    fn drop(&mut self) {
        let exported = self.session.arena.len();
        self.session.arena.release();
        trace!(
            "Left {} boundary, released {} exported strings",
            self.name, exported
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_released_when_call_ends() {
        let boundary = Boundary::new("test", (), 64);
        {
            let mut call = boundary.enter();
            let (_, scope) = call.split();
            scope.export("one");
            scope.export("two");
        }

        let call = boundary.enter();
        assert!(call.session.arena.is_empty());
    }

    #[test]
    fn test_lock_released_on_early_return() {
        fn failing(boundary: &Boundary<u32>) -> Result<(), String> {
            let mut call = boundary.enter();
            let (engine, scope) = call.split();
            scope.export("query");
            *engine += 1;
            Err("engine failed".to_string())
        }

        let boundary = Boundary::new("test", 0u32, 64);
        assert!(failing(&boundary).is_err());
        assert!(failing(&boundary).is_err());

        let mut call = boundary.enter();
        let (engine, _) = call.split();
        assert_eq!(*engine, 2);
    }

    #[test]
    fn test_calls_are_serialized_across_threads() {
        use std::sync::Arc;
        use std::thread;

        let boundary = Arc::new(Boundary::new("test", Vec::<usize>::new(), 64));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let boundary = Arc::clone(&boundary);
                thread::spawn(move || {
                    for i in 0..100 {
                        let mut call = boundary.enter();
                        let (log, _) = call.split();
                        // A racing writer would interleave the two pushes.
                        log.push(t * 1000 + i);
                        log.push(t * 1000 + i);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut call = boundary.enter();
        let (log, _) = call.split();
        assert_eq!(log.len(), 800);
        assert!(log.chunks(2).all(|pair| pair[0] == pair[1]));
    }
}
