//! Per-thread resolution depth.
//!
//! Every nested resolution step holds a [`DepthGuard`]. The counter lives in a
//! thread-local, not in the resolver, so a registered function that calls back
//! into `resolve` continues the count instead of starting over at zero. A
//! chain of callbacks is therefore bounded by the same limit as plain nesting.
//!
//! Guards decrement on drop, including while unwinding, so the counter is
//! back to its previous value after every call no matter how it ended.

use std::cell::Cell;
use std::marker::PhantomData;

use crate::errors::ResolverError;

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Holds one level of resolution depth on the current thread.
#[derive(Debug)]
pub struct DepthGuard {
    // Must be dropped on the thread that created it.
    _not_send: PhantomData<*const ()>,
}

impl DepthGuard {
    /// Takes one more level, or fails if that would exceed `max`.
    pub fn enter(max: usize) -> Result<Self, ResolverError> {
        DEPTH.with(|depth| {
            let next = depth.get() + 1;
            if next > max {
                return Err(ResolverError::DepthExceeded { max });
            }
            depth.set(next);
            Ok(Self {
                _not_send: PhantomData,
            })
        })
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// The current thread's resolution depth.
pub fn current_depth() -> usize {
    DEPTH.with(Cell::get)
}
