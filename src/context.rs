//! Dispatch contexts and per-connection state.
//!
//! A [`DispatchContext`] binds a request (and its session, if any) to one
//! spawned handler. It is shared behind an `Arc`: the session store keeps the
//! canonical copy, and a [`ConnectionState`] keeps a reference for as long as
//! its connection lives so later requests on that connection skip the store.
//!
//! A context with no handler bound is the "not found" answer; it serves no URI
//! and is never valid.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::handler::{HandlerAddress, HandlerLifecycle, HandlerType};

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

struct Binding {
    handler_type: HandlerType,
    address: HandlerAddress,
    lifecycle: Arc<dyn HandlerLifecycle>,
}

/// Resolved binding between a request/session and a live handler.
pub struct DispatchContext {
    id: u64,
    session_id: Option<Arc<str>>,
    binding: Option<Binding>,
}

impl DispatchContext {
    /// A context serving through `address`, spawned from `handler_type`.
    pub fn bound(
        session_id: Option<Arc<str>>,
        handler_type: HandlerType,
        address: HandlerAddress,
        lifecycle: Arc<dyn HandlerLifecycle>,
    ) -> Self {
        Self {
            id: NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed),
            session_id,
            binding: Some(Binding {
                handler_type,
                address,
                lifecycle,
            }),
        }
    }

    /// A context that serves nothing.
    pub fn empty(session_id: Option<Arc<str>>) -> Self {
        Self {
            id: NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed),
            session_id,
            binding: None,
        }
    }

    /// Process-unique id, for logs.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Address of the bound handler; `None` means not found.
    pub fn address(&self) -> Option<&HandlerAddress> {
        self.binding.as_ref().map(|b| &b.address)
    }

    pub fn handler_type(&self) -> Option<&HandlerType> {
        self.binding.as_ref().map(|b| &b.handler_type)
    }

    /// Whether no handler is bound.
    pub fn is_empty(&self) -> bool {
        self.binding.is_none()
    }

    /// Whether the bound handler is still alive.
    pub fn is_valid(&self) -> bool {
        self.binding
            .as_ref()
            .is_some_and(|b| b.lifecycle.is_valid(&b.address))
    }

    /// Whether the bound handler type serves `uri` over HTTP.
    pub fn handles_http(&self, uri: &str) -> bool {
        self.binding
            .as_ref()
            .is_some_and(|b| b.handler_type.handles_http(uri))
    }

    /// Whether the bound handler type serves `uri` over WebSocket.
    pub fn handles_websocket(&self, uri: &str) -> bool {
        self.binding
            .as_ref()
            .is_some_and(|b| b.handler_type.handles_websocket(uri))
    }
}

impl fmt::Debug for DispatchContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchContext")
            .field("id", &self.id)
            .field("session_id", &self.session_id)
            .field("handler", &self.handler_type().map(|t| t.name()))
            .field("address", &self.address().map(|a| a.id()))
            .finish()
    }
}

/// Connection-scoped cache of the resolved context.
///
/// Owned by the connection task; dropping it releases the reference on every
/// exit path. Once set, the connection keeps its context even if later
/// requests carry a different session cookie.
#[derive(Debug, Default)]
pub struct ConnectionState {
    context: Option<Arc<DispatchContext>>,
}

impl ConnectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The context resolved for this connection, if any.
    pub fn context(&self) -> Option<&Arc<DispatchContext>> {
        self.context.as_ref()
    }

    pub(crate) fn bind(&mut self, context: Arc<DispatchContext>) {
        self.context = Some(context);
    }

    /// Forget the cached context so the next request resolves again.
    pub fn reset(&mut self) -> Option<Arc<DispatchContext>> {
        self.context.take()
    }
}
