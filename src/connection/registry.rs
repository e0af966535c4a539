//! Scope-keyed socket factory registry.
//!
//! Openers pick their socket factory by type name, so a per-call TLS context
//! cannot be passed to them directly. Instead the caller binds a factory to
//! its current execution scope, and the dispatching factory type resolves
//! the binding when the opener instantiates it.
//!
//! A scope is either a connection task scope (entered with
//! [`with_task_scope`], one fresh key per entry) or, outside of one, the
//! calling OS thread. Each key has at most one binding, written and cleared
//! only by its owner.
//!
//! This is the only global mutable state in the crate. Each key is its own
//! slot in a concurrent map, so calls in different scopes do not contend.

use super::socket::SocketFactory;
use crate::{Error, Result};
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};

tokio::task_local! {
    static TASK_SCOPE: u64;
}

static NEXT_TASK_SCOPE: AtomicU64 = AtomicU64::new(1);

/// Per-scope slots; unrelated scopes never wait on each other
static BINDINGS: Lazy<DashMap<ScopeKey, Arc<dyn SocketFactory>>> = Lazy::new(DashMap::new);

/// Identity of the execution scope a binding belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKey {
    /// Inside a connection task scope
    Task(u64),
    /// Plain thread, outside of any task scope
    Thread(ThreadId),
}

impl ScopeKey {
    /// Key of the calling scope
    pub fn current() -> Self {
        TASK_SCOPE
            .try_with(|id| ScopeKey::Task(*id))
            .unwrap_or_else(|_| ScopeKey::Thread(thread::current().id()))
    }
}

/// Run `fut` inside a fresh task scope.
///
/// Bindings made inside are keyed to this scope only, so overlapping calls on
/// the same worker thread never see each other's factory.
pub async fn with_task_scope<F: Future>(fut: F) -> F::Output {
    let id = NEXT_TASK_SCOPE.fetch_add(1, Ordering::Relaxed);
    TASK_SCOPE.scope(id, fut).await
}

/// Scoped binding of a socket factory.
///
/// Dropping it removes the binding it created, on every exit path including
/// cancellation of the enclosing future.
#[must_use = "the binding is released as soon as it is dropped"]
#[derive(Debug)]
pub struct FactoryBinding {
    key: ScopeKey,
}

impl FactoryBinding {
    /// Scope this binding belongs to
    pub fn key(&self) -> ScopeKey {
        self.key
    }
}

impl Drop for FactoryBinding {
    fn drop(&mut self) {
        if BINDINGS.remove(&self.key).is_some() {
            tracing::trace!(scope = ?self.key, "socket factory unbound");
        }
    }
}

/// Bind `factory` to the calling scope.
///
/// A previous binding for the same scope is replaced.
///
/// Async callers must call this inside [`with_task_scope`]. Outside of one the
/// key is the worker thread, which every task running on that worker shares.
pub fn register(factory: Arc<dyn SocketFactory>) -> FactoryBinding {
    let key = ScopeKey::current();
    if BINDINGS.insert(key, factory).is_some() {
        tracing::warn!(scope = ?key, "replaced an existing socket factory binding");
    }
    tracing::trace!(scope = ?key, "socket factory bound");
    FactoryBinding { key }
}

/// Remove any binding for the calling scope. Idempotent.
pub fn unregister() {
    let key = ScopeKey::current();
    if BINDINGS.remove(&key).is_some() {
        tracing::trace!(scope = ?key, "socket factory unbound");
    }
}

/// Factory bound to the calling scope.
///
/// # Errors
///
/// Returns `Error::UnboundFactory` if nothing is bound, which means an opener
/// ran without the caller registering a factory first.
pub fn lookup() -> Result<Arc<dyn SocketFactory>> {
    let key = ScopeKey::current();
    BINDINGS
        .get(&key)
        .map(|entry| Arc::clone(entry.value()))
        .ok_or(Error::UnboundFactory)
}

/// Whether the calling scope has a binding
pub fn is_bound() -> bool {
    BINDINGS.contains_key(&ScopeKey::current())
}

/// Whether `key` has a binding
pub fn is_bound_to(key: ScopeKey) -> bool {
    BINDINGS.contains_key(&key)
}

/// Number of live bindings across all scopes
pub fn bound_count() -> usize {
    BINDINGS.len()
}
