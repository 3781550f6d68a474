//! Handler type descriptors.
//!
//! A [`HandlerType`] is one kind of session behaviour: its name, the URIs it
//! serves over HTTP and over WebSocket, how many constructor parameters it
//! takes, and a factory that builds a fresh [`WebActor`] from them.
//!
//! Handler types can be built at runtime with [`HandlerType::new`] or
//! registered at build time through `inventory`:
//!
//! ```ignore
//! use webactor_dispatch::handler::{WebActorDef, WebActorReg};
//!
//! static CHAT: WebActorDef = WebActorDef {
//!     name: "chat",
//!     http: &["/chat/*"],
//!     websocket: &["/chat/ws"],
//!     arity: 0,
//!     factory: |_params| Ok(Box::new(ChatRoom::default())),
//! };
//!
//! inventory::submit!(WebActorReg(&CHAT));
//! ```

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::WebActor;
use crate::error::{DispatchError, Result};
use crate::matcher::{matches_http, matches_websocket, UriMatcher};

/// Builds a handler instance from its constructor parameters.
pub type HandlerFactory = Arc<dyn Fn(&[Value]) -> Result<Box<dyn WebActor>> + Send + Sync>;

/// Static handler declaration collected by `inventory`.
pub struct WebActorDef {
    /// Unique handler type name; also the key of the parameter table.
    pub name: &'static str,
    /// HTTP URI patterns.
    pub http: &'static [&'static str],
    /// WebSocket URI patterns.
    pub websocket: &'static [&'static str],
    /// Number of constructor parameters.
    pub arity: usize,
    /// Constructor.
    pub factory: fn(&[Value]) -> Result<Box<dyn WebActor>>,
}

/// Registration wrapper for [`WebActorDef`].
pub struct WebActorReg(pub &'static WebActorDef);

inventory::collect!(WebActorReg);

/// Iterate over every build-time registration, in link order.
pub fn registrations() -> impl Iterator<Item = &'static WebActorDef> {
    inventory::iter::<WebActorReg>().map(|r| r.0)
}

struct Inner {
    name: Arc<str>,
    http: UriMatcher,
    websocket: UriMatcher,
    arity: usize,
    factory: HandlerFactory,
}

/// Immutable, cheaply cloneable handler type descriptor.
#[derive(Clone)]
pub struct HandlerType {
    inner: Arc<Inner>,
}

impl HandlerType {
    /// Create a handler type from parsed matchers and a factory.
    pub fn new<F>(
        name: impl Into<Arc<str>>,
        http: UriMatcher,
        websocket: UriMatcher,
        arity: usize,
        factory: F,
    ) -> Self
    where
        F: Fn(&[Value]) -> Result<Box<dyn WebActor>> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                http,
                websocket,
                arity,
                factory: Arc::new(factory),
            }),
        }
    }

    /// Build a descriptor from a static registration.
    pub fn from_def(def: &'static WebActorDef) -> Result<Self> {
        let http = UriMatcher::parse(def.http)?;
        let websocket = UriMatcher::parse(def.websocket)?;
        Ok(Self::new(def.name, http, websocket, def.arity, def.factory))
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.inner.arity
    }

    pub fn http(&self) -> &UriMatcher {
        &self.inner.http
    }

    pub fn websocket(&self) -> &UriMatcher {
        &self.inner.websocket
    }

    /// Whether this type serves `uri` over HTTP.
    pub fn handles_http(&self, uri: &str) -> bool {
        matches_http(uri, self)
    }

    /// Whether this type serves `uri` over WebSocket.
    pub fn handles_websocket(&self, uri: &str) -> bool {
        matches_websocket(uri, self)
    }

    /// Whether this type serves `uri` over either protocol.
    pub fn handles(&self, uri: &str) -> bool {
        self.handles_http(uri) || self.handles_websocket(uri)
    }

    /// Construct a new handler instance.
    ///
    /// The parameter count is checked before the factory runs; a mismatch is
    /// a configuration error and is never retried against another type.
    pub fn instantiate(&self, params: &[Value]) -> Result<Box<dyn WebActor>> {
        if params.len() != self.inner.arity {
            return Err(DispatchError::ParamArity {
                handler: self.name().to_string(),
                expected: self.inner.arity,
                actual: params.len(),
            });
        }
        (self.inner.factory)(params)
    }

    /// Identity comparison: same descriptor, not just same name.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for HandlerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerType")
            .field("name", &self.inner.name)
            .field("http", &self.inner.http)
            .field("websocket", &self.inner.websocket)
            .field("arity", &self.inner.arity)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{BoxFuture, Flow, HandlerResult, WebMessage};

    struct Noop;

    impl WebActor for Noop {
        fn handle(&mut self, _msg: WebMessage) -> BoxFuture<'_, HandlerResult> {
            Box::pin(async { Ok(Flow::Continue) })
        }
    }

    fn noop_factory(_params: &[Value]) -> Result<Box<dyn WebActor>> {
        Ok(Box::new(Noop))
    }

    static REGISTERED_NOOP: WebActorDef = WebActorDef {
        name: "types-test-noop",
        http: &["/noop/*"],
        websocket: &[],
        arity: 0,
        factory: noop_factory,
    };

    inventory::submit!(WebActorReg(&REGISTERED_NOOP));

    #[test]
    fn test_registration_is_collected() {
        assert!(registrations().any(|d| d.name == "types-test-noop"));
    }

    #[test]
    fn test_from_def() {
        let ty = HandlerType::from_def(&REGISTERED_NOOP).unwrap();
        assert_eq!(ty.name(), "types-test-noop");
        assert!(ty.handles_http("/noop/x"));
        assert!(!ty.handles_websocket("/noop/x"));
        assert!(ty.handles("/noop"));
    }

    #[test]
    fn test_from_def_rejects_bad_pattern() {
        static BAD: WebActorDef = WebActorDef {
            name: "bad",
            http: &["no-slash"],
            websocket: &[],
            arity: 0,
            factory: noop_factory,
        };
        assert!(matches!(
            HandlerType::from_def(&BAD),
            Err(DispatchError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_instantiate_checks_arity() {
        let ty = HandlerType::new("room", UriMatcher::none(), UriMatcher::none(), 2, noop_factory);

        let err = ty.instantiate(&[Value::from(1)]).err().unwrap();
        assert!(matches!(
            err,
            DispatchError::ParamArity { expected: 2, actual: 1, .. }
        ));

        assert!(ty.instantiate(&[Value::from(1), Value::from("a")]).is_ok());
    }

    #[test]
    fn test_factory_error_propagates() {
        let ty = HandlerType::new("picky", UriMatcher::none(), UriMatcher::none(), 1, |params| {
            match params[0].as_u64() {
                Some(_) => Ok(Box::new(Noop) as Box<dyn WebActor>),
                None => Err(DispatchError::Construct {
                    handler: "picky".into(),
                    reason: "expected a number".into(),
                }),
            }
        });
        assert!(matches!(
            ty.instantiate(&[Value::from("x")]),
            Err(DispatchError::Construct { .. })
        ));
    }

    #[test]
    fn test_clone_shares_identity() {
        let ty = HandlerType::new("a", UriMatcher::none(), UriMatcher::none(), 0, noop_factory);
        let other = HandlerType::new("a", UriMatcher::none(), UriMatcher::none(), 0, noop_factory);
        assert!(ty.ptr_eq(&ty.clone()));
        assert!(!ty.ptr_eq(&other));
    }
}
