//! Reference counting for deferred teardown.
//!
//! A [`RefCount`] tracks how many operations currently hold a resource open
//! and invokes a teardown callback exactly once when the count drains back to
//! zero. It guards teardown only: it prevents one thread from closing a
//! resource while another thread's operation is mid-flight, and provides no
//! mutual exclusion over the resource itself.

use std::sync::atomic::{AtomicI64, Ordering};

/// An atomic acquire/release counter with a one-shot drained callback.
///
/// The count starts at zero. Each transition back to zero invokes the
/// callback once; reacquiring afterwards starts a new cycle and the callback
/// fires again at the next drain, so it must be idempotent.
///
/// Releasing more times than acquired is a programming error in
/// acquire/release pairing, not a runtime condition, and panics.
///
/// # Examples
///
/// ```
/// use openlite::RefCount;
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// let drained = Arc::new(AtomicUsize::new(0));
/// let observed = Arc::clone(&drained);
/// let refs = RefCount::new(move || {
///     observed.fetch_add(1, Ordering::SeqCst);
/// });
///
/// refs.acquire();
/// refs.acquire();
/// refs.release();
/// assert!(refs.has_references());
/// refs.release();
/// assert_eq!(drained.load(Ordering::SeqCst), 1);
/// ```
pub struct RefCount {
    count: AtomicI64,
    on_drained: Box<dyn Fn() + Send + Sync>,
}

impl RefCount {
    /// Creates a counter at zero with the given drained callback.
    pub fn new(on_drained: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            count: AtomicI64::new(0),
            on_drained: Box::new(on_drained),
        }
    }

    /// Increments the count. No upper bound, never blocks.
    pub fn acquire(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    /// Decrements the count, invoking the drained callback on reaching zero.
    ///
    /// # Panics
    ///
    /// Panics if the count would go negative. That means a `release` without
    /// a matching `acquire`, which is a defect in the caller, and recovery
    /// would only hide it.
    pub fn release(&self) {
        let remaining = self.count.fetch_sub(1, Ordering::SeqCst) - 1;
        assert!(
            remaining >= 0,
            "reference count went negative: release() without a matching acquire()"
        );
        if remaining == 0 {
            (self.on_drained)();
        }
    }

    /// True while at least one reference is held.
    #[must_use]
    pub fn has_references(&self) -> bool {
        self.count.load(Ordering::SeqCst) > 0
    }

    /// Acquires a reference scoped to the returned guard.
    ///
    /// The guard releases on drop, so every exit path of the enclosing
    /// operation releases exactly once.
    #[must_use]
    pub fn guard(&self) -> RefGuard<'_> {
        self.acquire();
        RefGuard { refs: self }
    }
}

impl std::fmt::Debug for RefCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefCount")
            .field("count", &self.count.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// A scoped reference; releases its [`RefCount`] when dropped.
#[derive(Debug)]
pub struct RefGuard<'a> {
    refs: &'a RefCount,
}

impl Drop for RefGuard<'_> {
    fn drop(&mut self) {
        self.refs.release();
    }
}
