//! Spawning handlers and tracking whether they are still alive.
//!
//! [`HandlerLifecycle`] is the seam between dispatch and the actor runtime.
//! [`TaskLifecycle`] is the default: one tokio task per handler, draining a
//! bounded mailbox. A handler is valid for as long as its mailbox is open.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;

use super::{Flow, HandlerType, WebActor, WebMessage};
use crate::error::{DispatchError, Result};

/// Default mailbox capacity for spawned handlers.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 64;

/// Process-unique handler instance id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(pub u64);

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Address of a spawned handler. Cloning shares the same mailbox.
#[derive(Clone)]
pub struct HandlerAddress {
    id: HandlerId,
    handler: Arc<str>,
    mailbox: mpsc::Sender<WebMessage>,
}

impl HandlerAddress {
    pub fn new(id: HandlerId, handler: Arc<str>, mailbox: mpsc::Sender<WebMessage>) -> Self {
        Self {
            id,
            handler,
            mailbox,
        }
    }

    #[inline]
    pub fn id(&self) -> HandlerId {
        self.id
    }

    /// Name of the handler type this instance was created from.
    #[inline]
    pub fn handler_name(&self) -> &str {
        &self.handler
    }

    /// Whether the handler is still draining its mailbox.
    pub fn is_alive(&self) -> bool {
        !self.mailbox.is_closed()
    }

    /// Deliver a message, waiting for mailbox capacity.
    pub async fn send(&self, msg: WebMessage) -> Result<()> {
        self.mailbox
            .send(msg)
            .await
            .map_err(|_| DispatchError::HandlerStopped(self.id.to_string()))
    }

    /// Resolves once the handler has stopped.
    pub async fn closed(&self) {
        self.mailbox.closed().await
    }
}

impl fmt::Debug for HandlerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerAddress")
            .field("id", &self.id)
            .field("handler", &self.handler)
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// Creates handler instances and reports their liveness.
pub trait HandlerLifecycle: Send + Sync + 'static {
    /// Instantiate `handler_type` with `params` and start it.
    fn spawn(&self, handler_type: &HandlerType, params: &[Value]) -> Result<HandlerAddress>;

    /// Whether `address` still refers to a live handler.
    fn is_valid(&self, address: &HandlerAddress) -> bool {
        address.is_alive()
    }
}

/// Runs each handler as its own tokio task.
#[derive(Debug)]
pub struct TaskLifecycle {
    mailbox_capacity: usize,
    next_id: AtomicU64,
}

impl TaskLifecycle {
    pub fn new(mailbox_capacity: usize) -> Self {
        Self {
            mailbox_capacity: mailbox_capacity.max(1),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn mailbox_capacity(&self) -> usize {
        self.mailbox_capacity
    }
}

impl Default for TaskLifecycle {
    fn default() -> Self {
        Self::new(DEFAULT_MAILBOX_CAPACITY)
    }
}

impl HandlerLifecycle for TaskLifecycle {
    fn spawn(&self, handler_type: &HandlerType, params: &[Value]) -> Result<HandlerAddress> {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|e| DispatchError::Construct {
                handler: handler_type.name().to_string(),
                reason: e.to_string(),
            })?;

        let actor = handler_type.instantiate(params)?;
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let name: Arc<str> = Arc::from(handler_type.name());
        let (tx, rx) = mpsc::channel(self.mailbox_capacity);

        runtime.spawn(run_actor(actor, rx, id, name.clone()));
        tracing::debug!(handler = %name, %id, "Spawned handler");

        Ok(HandlerAddress::new(id, name, tx))
    }
}

/// Drain the mailbox until the actor stops or every address is dropped.
async fn run_actor(
    mut actor: Box<dyn WebActor>,
    mut mailbox: mpsc::Receiver<WebMessage>,
    id: HandlerId,
    name: Arc<str>,
) {
    while let Some(msg) = mailbox.recv().await {
        match actor.handle(msg).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Stop) => {
                tracing::debug!(handler = %name, %id, "Handler stopped");
                break;
            }
            Err(e) => {
                tracing::warn!(handler = %name, %id, "Handler failed: {}", e);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{BoxFuture, HandlerResult};
    use crate::matcher::UriMatcher;
    use std::time::Duration;

    /// Stops on "stop", fails on "fail", echoes everything else to `seen`.
    struct Scripted {
        seen: mpsc::UnboundedSender<String>,
    }

    impl WebActor for Scripted {
        fn handle(&mut self, msg: WebMessage) -> BoxFuture<'_, HandlerResult> {
            Box::pin(async move {
                let text = String::from_utf8_lossy(&msg.payload).into_owned();
                match text.as_str() {
                    "stop" => Ok(Flow::Stop),
                    "fail" => Err(DispatchError::Construct {
                        handler: "scripted".into(),
                        reason: "asked to fail".into(),
                    }),
                    _ => {
                        let _ = self.seen.send(text);
                        Ok(Flow::Continue)
                    }
                }
            })
        }
    }

    fn scripted_type(seen: mpsc::UnboundedSender<String>) -> HandlerType {
        HandlerType::new(
            "scripted",
            UriMatcher::parse(&["/*"]).unwrap(),
            UriMatcher::none(),
            0,
            move |_| {
                Ok(Box::new(Scripted { seen: seen.clone() }) as Box<dyn WebActor>)
            },
        )
    }

    #[tokio::test]
    async fn test_spawn_delivers_messages() {
        let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
        let lifecycle = TaskLifecycle::default();
        let addr = lifecycle.spawn(&scripted_type(seen_tx), &[]).unwrap();

        addr.send(WebMessage::http("/a", "hello")).await.unwrap();
        assert_eq!(seen_rx.recv().await.unwrap(), "hello");
        assert!(lifecycle.is_valid(&addr));
        assert_eq!(addr.handler_name(), "scripted");
    }

    #[tokio::test]
    async fn test_stop_invalidates_address() {
        let (seen_tx, _seen_rx) = mpsc::unbounded_channel();
        let lifecycle = TaskLifecycle::default();
        let addr = lifecycle.spawn(&scripted_type(seen_tx), &[]).unwrap();

        addr.send(WebMessage::http("/a", "stop")).await.unwrap();
        tokio::time::timeout(Duration::from_secs(5), addr.closed())
            .await
            .unwrap();

        assert!(!lifecycle.is_valid(&addr));
        assert!(matches!(
            addr.send(WebMessage::http("/a", "late")).await,
            Err(DispatchError::HandlerStopped(_))
        ));
    }

    #[tokio::test]
    async fn test_error_invalidates_address() {
        let (seen_tx, _seen_rx) = mpsc::unbounded_channel();
        let lifecycle = TaskLifecycle::default();
        let addr = lifecycle.spawn(&scripted_type(seen_tx), &[]).unwrap();

        addr.send(WebMessage::http("/a", "fail")).await.unwrap();
        tokio::time::timeout(Duration::from_secs(5), addr.closed())
            .await
            .unwrap();
        assert!(!addr.is_alive());
    }

    #[tokio::test]
    async fn test_spawn_rejects_wrong_arity() {
        let (seen_tx, _seen_rx) = mpsc::unbounded_channel();
        let lifecycle = TaskLifecycle::default();
        let result = lifecycle.spawn(&scripted_type(seen_tx), &[Value::Null]);
        assert!(matches!(result, Err(DispatchError::ParamArity { .. })));
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let (seen_tx, _seen_rx) = mpsc::unbounded_channel();
        let ty = scripted_type(seen_tx);
        let lifecycle = TaskLifecycle::new(4);
        let a = lifecycle.spawn(&ty, &[]).unwrap();
        let b = lifecycle.spawn(&ty, &[]).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_spawn_outside_runtime_fails() {
        let (seen_tx, _seen_rx) = mpsc::unbounded_channel();
        let lifecycle = TaskLifecycle::default();
        let result = lifecycle.spawn(&scripted_type(seen_tx), &[]);
        assert!(matches!(result, Err(DispatchError::Construct { .. })));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        assert_eq!(TaskLifecycle::new(0).mailbox_capacity(), 1);
    }
}
