//! Process-wide registry of discovered handler types.
//!
//! The registry is empty until first use. The first caller runs a discovery
//! pass on the blocking pool; concurrent callers wait for that pass instead
//! of starting their own. A successful pass is kept for the lifetime of the
//! registry, even if it found nothing. A failed pass is logged and leaves
//! the registry empty so the next caller retries.
//!
//! Discovery never re-runs after a successful pass, so units added to the
//! resource set afterwards are not picked up.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use webactor_dispatch::discovery::RegisteredDiscovery;
//! use webactor_dispatch::handler::HandlerTypeRegistry;
//!
//! let registry = HandlerTypeRegistry::new(Arc::new(RegisteredDiscovery));
//! for ty in registry.handler_types().await.iter() {
//!     println!("{} serves http: {:?}", ty.name(), ty.http());
//! }
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::OnceCell;

use super::HandlerType;
use crate::discovery::Discovery;
use crate::error::{DispatchError, Result};

/// Lazily discovered, then immutable, ordered set of handler types.
pub struct HandlerTypeRegistry {
    inner: Arc<Inner>,
}

struct Inner {
    /// How handler types are found.
    discovery: Arc<dyn Discovery>,
    /// Set once by the first successful pass.
    types: OnceCell<Arc<[HandlerType]>>,
    /// Number of passes started, successful or not.
    passes: AtomicUsize,
}

impl HandlerTypeRegistry {
    /// Create an empty registry backed by `discovery`.
    pub fn new(discovery: Arc<dyn Discovery>) -> Self {
        Self {
            inner: Arc::new(Inner {
                discovery,
                types: OnceCell::new(),
                passes: AtomicUsize::new(0),
            }),
        }
    }

    /// Get the handler types in discovery order, discovering on first use.
    ///
    /// Discovery failures are logged and yield an empty list; they do not
    /// fail the caller. The pass runs in its own task, so dropping the
    /// returned future does not let a second pass start while it is running.
    pub async fn handler_types(&self) -> Arc<[HandlerType]> {
        if let Some(types) = self.inner.types.get() {
            return Arc::clone(types);
        }

        let inner = Arc::clone(&self.inner);
        let pass = tokio::spawn(async move {
            let types = inner.types.get_or_try_init(|| inner.run_pass()).await;
            types.map(Arc::clone)
        });

        match pass.await {
            Ok(Ok(types)) => types,
            Ok(Err(e)) if e.is_enumeration() => {
                tracing::error!("I/O failure while enumerating handler units: {}", e);
                Arc::from(Vec::new())
            }
            Ok(Err(e)) => {
                tracing::error!("Discovery pass aborted: {}", e);
                Arc::from(Vec::new())
            }
            Err(e) => {
                tracing::error!("Discovery task failed: {}", e);
                Arc::from(Vec::new())
            }
        }
    }

    /// Whether a discovery pass has completed successfully.
    pub fn is_discovered(&self) -> bool {
        self.inner.types.initialized()
    }

    /// Number of discovery passes started so far.
    pub fn discovery_passes(&self) -> usize {
        self.inner.passes.load(Ordering::Acquire)
    }
}

impl Inner {
    async fn run_pass(&self) -> Result<Arc<[HandlerType]>> {
        let pass = self.passes.fetch_add(1, Ordering::AcqRel) + 1;
        let discovery = Arc::clone(&self.discovery);

        let types = tokio::task::spawn_blocking(move || discovery.discover())
            .await
            .map_err(|e| DispatchError::DiscoveryAborted(e.to_string()))??;

        tracing::info!(pass, count = types.len(), "Discovered handler types");
        for ty in &types {
            tracing::debug!(handler = ty.name(), arity = ty.arity(), "Registered handler type");
        }

        Ok(types.into())
    }
}

impl std::fmt::Debug for HandlerTypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerTypeRegistry")
            .field("types", &self.inner.types.get())
            .field("passes", &self.discovery_passes())
            .finish_non_exhaustive()
    }
}
