//! Concurrent session id to dispatch context map.

use std::sync::Arc;

use dashmap::DashMap;

use crate::context::DispatchContext;

/// Process-lifetime, in-memory session store.
///
/// Backed by a sharded `DashMap`; every operation is safe under concurrent
/// use and guards are never held across calls. Concurrent inserts for the
/// same id are last-writer-wins.
///
/// An entry is only evicted when its session id comes back with a dead
/// handler. Sessions that never return stay until [`purge_invalid`] runs, so
/// long-lived servers should sweep periodically:
///
/// ```ignore
/// let resolver = Arc::new(ContextResolver::builder().build()?);
/// let sweeper = Arc::clone(&resolver);
/// tokio::spawn(async move {
///     let mut tick = tokio::time::interval(Duration::from_secs(60));
///     loop {
///         tick.tick().await;
///         sweeper.sessions().purge_invalid();
///     }
/// });
/// ```
///
/// [`purge_invalid`]: SessionStore::purge_invalid
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<Arc<str>, Arc<DispatchContext>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the context for `session_id`.
    pub fn get(&self, session_id: &str) -> Option<Arc<DispatchContext>> {
        self.sessions.get(session_id).map(|entry| Arc::clone(entry.value()))
    }

    /// Bind `session_id` to `context`, returning the previous binding.
    pub fn insert(
        &self,
        session_id: impl Into<Arc<str>>,
        context: Arc<DispatchContext>,
    ) -> Option<Arc<DispatchContext>> {
        self.sessions.insert(session_id.into(), context)
    }

    /// Remove `session_id` only if it is still bound to `stale`.
    ///
    /// A context inserted for the same id by a concurrent request survives.
    pub fn evict(&self, session_id: &str, stale: &Arc<DispatchContext>) -> bool {
        self.sessions
            .remove_if(session_id, |_, current| Arc::ptr_eq(current, stale))
            .is_some()
    }

    /// Remove `session_id` unconditionally.
    pub fn remove(&self, session_id: &str) -> Option<Arc<DispatchContext>> {
        self.sessions.remove(session_id).map(|(_, ctx)| ctx)
    }

    /// Drop every context whose handler is no longer valid. Returns the count.
    pub fn purge_invalid(&self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, ctx| ctx.is_valid());
        let removed = before.saturating_sub(self.sessions.len());
        if removed > 0 {
            tracing::debug!(removed, "Purged invalid sessions");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_ctx(id: &str) -> Arc<DispatchContext> {
        Arc::new(DispatchContext::empty(Some(Arc::from(id))))
    }

    #[test]
    fn test_insert_and_get() {
        let store = SessionStore::new();
        let ctx = empty_ctx("s1");

        assert!(store.insert("s1", ctx.clone()).is_none());
        assert!(Arc::ptr_eq(&store.get("s1").unwrap(), &ctx));
        assert!(store.get("s2").is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_insert_replaces() {
        let store = SessionStore::new();
        let old = empty_ctx("s1");
        let new = empty_ctx("s1");

        store.insert("s1", old.clone());
        let previous = store.insert("s1", new.clone()).unwrap();

        assert!(Arc::ptr_eq(&previous, &old));
        assert!(Arc::ptr_eq(&store.get("s1").unwrap(), &new));
    }

    #[test]
    fn test_evict_only_removes_observed_context() {
        let store = SessionStore::new();
        let stale = empty_ctx("s1");
        let fresh = empty_ctx("s1");

        store.insert("s1", fresh.clone());
        assert!(!store.evict("s1", &stale));
        assert!(store.contains("s1"));

        assert!(store.evict("s1", &fresh));
        assert!(store.is_empty());
    }

    #[test]
    fn test_remove() {
        let store = SessionStore::new();
        store.insert("s1", empty_ctx("s1"));
        assert!(store.remove("s1").is_some());
        assert!(store.remove("s1").is_none());
    }

    #[test]
    fn test_purge_invalid_drops_empty_contexts() {
        let store = SessionStore::new();
        store.insert("s1", empty_ctx("s1"));
        store.insert("s2", empty_ctx("s2"));

        assert_eq!(store.purge_invalid(), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn test_concurrent_inserts() {
        let store = Arc::new(SessionStore::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for i in 0..100 {
                        let id = format!("t{t}-{i}");
                        store.insert(id.as_str(), empty_ctx(&id));
                        assert!(store.get(&id).is_some());
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.len(), 800);
    }
}
