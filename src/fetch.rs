//! Asynchronous asset resolution per object group.
//!
//! Every object in a group that references an external asset (meshes and
//! sculpts) contributes one outstanding fetch. [`FetchState`] tracks the
//! count and fires the group's completion signal exactly once when the
//! last fetch resolves, or immediately for groups that never needed a
//! fetch at all. Completion is level-triggered: every decrement re-checks
//! the counter, and only the caller observing zero with the signal still
//! armed fires it.
//!
//! Retry and backoff are the content store's responsibility. A missing
//! asset is not an error here; it resolves to empty bytes and the object
//! simply ends up with no geometry.

use std::sync::Mutex;

use futures::future::BoxFuture;
use uuid::Uuid;

/// Content-addressed asset store boundary.
///
/// `fetch` resolves to the asset's raw bytes, or `None` when the store
/// has no data for the id.
pub trait ContentStore: Send + Sync {
    fn fetch(&self, id: Uuid) -> BoxFuture<'_, Option<Vec<u8>>>;
}

type CompletionFn = Box<dyn FnOnce() + Send>;

struct Inner {
    active: u32,
    on_complete: Option<CompletionFn>,
}

/// Outstanding-fetch tracking for one object group.
pub struct FetchState {
    inner: Mutex<Inner>,
}

impl FetchState {
    /// Create the state with the signal to fire once all fetches for
    /// the group have resolved.
    pub fn new(on_complete: impl FnOnce() + Send + 'static) -> Self {
        Self {
            inner: Mutex::new(Inner {
                active: 0,
                on_complete: Some(Box::new(on_complete)),
            }),
        }
    }

    /// Register one outstanding fetch. Must be called before the fetch
    /// is issued so a fast response cannot observe a zero counter.
    pub fn begin(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.active += 1;
        log::trace!("fetches now {}", inner.active);
    }

    /// Resolve one outstanding fetch and re-check completion. Each call
    /// pairs with exactly one prior [`begin`](Self::begin), so the
    /// counter cannot go negative.
    pub fn finish(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        debug_assert!(inner.active > 0, "finish without matching begin");
        inner.active = inner.active.saturating_sub(1);
        log::trace!("fetches now {}", inner.active);
        Self::fire_if_done(inner);
    }

    /// Fire the completion signal if nothing is outstanding. Safe to
    /// call concurrently from any number of resolvers; the signal fires
    /// at most once over the group's lifetime.
    pub fn check_done(&self) {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Self::fire_if_done(inner);
    }

    /// Number of fetches currently in flight.
    pub fn outstanding(&self) -> u32 {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).active
    }

    fn fire_if_done(mut inner: std::sync::MutexGuard<'_, Inner>) {
        if inner.active == 0 {
            if let Some(signal) = inner.on_complete.take() {
                // Run the signal outside the lock; it may re-enter.
                drop(inner);
                signal();
            }
        }
    }
}

impl std::fmt::Debug for FetchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        f.debug_struct("FetchState")
            .field("active", &inner.active)
            .field("signalled", &inner.on_complete.is_none())
            .finish()
    }
}
