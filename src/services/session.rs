// Session Store
// Holds the bearer token for one user session

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::info;

/// Bearer-token holder shared between an [`ApiClient`](crate::ApiClient) and
/// whatever boundary layer reacts to session expiry.
///
/// One `SessionStore` represents one user session; clones share state. It is
/// deliberately not process-global so a multi-user caller can run one store
/// per connection.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<SessionInner>,
}

#[derive(Default)]
struct SessionInner {
    token: Mutex<Option<String>>,
    invalidated: AtomicBool,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current token unconditionally and re-arm the invalidation
    /// latch, so a fresh login can expire again later.
    pub fn set_token(&self, token: impl Into<String>) {
        let mut guard = self.inner.token.lock().expect("session lock poisoned");
        *guard = Some(token.into());
        self.inner.invalidated.store(false, Ordering::SeqCst);
    }

    pub fn token(&self) -> Option<String> {
        self.inner.token.lock().expect("session lock poisoned").clone()
    }

    /// Remove the token. Clearing an already-empty session is a no-op.
    pub fn clear_token(&self) {
        let mut guard = self.inner.token.lock().expect("session lock poisoned");
        *guard = None;
    }

    /// Clear the token and latch the session as invalidated.
    ///
    /// Returns `true` only for the first call since the last `set_token`.
    /// Concurrent callers race on the latch and exactly one wins, which is
    /// what keeps the expiry signal single-shot when several in-flight
    /// requests fail with 401 at once.
    pub fn invalidate(&self) -> bool {
        self.clear_token();
        let first = !self.inner.invalidated.swap(true, Ordering::SeqCst);
        if first {
            info!("session invalidated");
        }
        first
    }

    pub fn is_invalidated(&self) -> bool {
        self.inner.invalidated.load(Ordering::SeqCst)
    }
}
