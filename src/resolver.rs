//! Context resolution - which handler serves a request.
//!
//! [`ContextResolver::resolve`] is called once per inbound request:
//!
//! 1. A context already cached on the connection is returned as is
//! 2. A session cookie bound to a valid context reuses that context
//! 3. A session bound to a dead handler is evicted and resolution continues
//! 4. Otherwise the first handler type (in discovery order) serving the URI
//!    over HTTP or WebSocket is spawned; with none, the context is empty
//!
//! New contexts are cached on the connection and, for requests carrying a
//! session id, stored under it.
//!
//! # Example
//!
//! ```ignore
//! use webactor_dispatch::{ConnectionState, ContextResolver};
//!
//! let resolver = ContextResolver::builder()
//!     .session_cookie("APPSESSION")
//!     .handler_params("chat", vec!["lobby".into()])
//!     .build()?;
//!
//! let mut conn = ConnectionState::new();
//! let ctx = resolver.resolve(&request, &mut conn).await?;
//! match ctx.address() {
//!     Some(addr) => addr.send(WebMessage::http(uri, body)).await?,
//!     None => respond_not_found(),
//! }
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use http::Request;
use serde_json::Value;

use crate::config::DispatchConfig;
use crate::context::{ConnectionState, DispatchContext};
use crate::discovery::{
    DirectoryResources, Discovery, LineMarker, RegisteredDiscovery, ScanDiscovery,
};
use crate::error::Result;
use crate::handler::{HandlerLifecycle, HandlerTypeRegistry, TaskLifecycle};
use crate::session::{session_id, SessionStore};

/// Builder for configuring and creating a [`ContextResolver`].
pub struct ResolverBuilder {
    config: DispatchConfig,
    discovery: Option<Arc<dyn Discovery>>,
    lifecycle: Option<Arc<dyn HandlerLifecycle>>,
}

impl ResolverBuilder {
    pub fn new() -> Self {
        Self {
            config: DispatchConfig::default(),
            discovery: None,
            lifecycle: None,
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Name of the session cookie. Default: `SESSIONID`
    pub fn session_cookie(mut self, name: impl Into<String>) -> Self {
        self.config.session_cookie_name = name.into();
        self
    }

    /// Enable or disable session affinity. Default: enabled
    pub fn sessions_enabled(mut self, enabled: bool) -> Self {
        self.config.sessions_enabled = enabled;
        self
    }

    /// Response encoder override, passed through untouched.
    pub fn response_encoder(mut self, name: impl Into<String>) -> Self {
        self.config.response_encoder = Some(name.into());
        self
    }

    /// Scan `dir` for handler units instead of using registrations.
    pub fn resource_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.resource_dir = Some(dir.into());
        self
    }

    /// Constructor parameters for handler type `name`.
    pub fn handler_params(mut self, name: impl Into<String>, params: Vec<Value>) -> Self {
        self.config.handler_params.insert(name.into(), params);
        self
    }

    /// Use a custom discovery strategy. Overrides `resource_dir`.
    pub fn discovery(mut self, discovery: Arc<dyn Discovery>) -> Self {
        self.discovery = Some(discovery);
        self
    }

    /// Use a custom handler lifecycle instead of one tokio task per handler.
    pub fn lifecycle(mut self, lifecycle: Arc<dyn HandlerLifecycle>) -> Self {
        self.lifecycle = Some(lifecycle);
        self
    }

    /// Validate the configuration and build the resolver.
    ///
    /// Discovery does not run here; it runs on the first resolution.
    pub fn build(self) -> Result<ContextResolver> {
        self.config.validate()?;

        let discovery: Arc<dyn Discovery> = match (self.discovery, &self.config.resource_dir) {
            (Some(discovery), _) => discovery,
            (None, Some(dir)) => Arc::new(ScanDiscovery::registered(
                DirectoryResources::new(dir.clone(), self.config.unit_extension.clone()),
                LineMarker,
                self.config.marker.clone(),
            )),
            (None, None) => Arc::new(RegisteredDiscovery),
        };

        let lifecycle: Arc<dyn HandlerLifecycle> = match self.lifecycle {
            Some(lifecycle) => lifecycle,
            None => Arc::new(TaskLifecycle::new(self.config.mailbox_capacity)),
        };

        Ok(ContextResolver {
            registry: HandlerTypeRegistry::new(discovery),
            sessions: SessionStore::new(),
            lifecycle,
            config: self.config,
        })
    }
}

impl Default for ResolverBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps inbound requests to dispatch contexts.
///
/// Share one resolver (behind an `Arc`) across all connections: it owns the
/// handler type registry and the session store.
pub struct ContextResolver {
    config: DispatchConfig,
    registry: HandlerTypeRegistry,
    sessions: SessionStore,
    lifecycle: Arc<dyn HandlerLifecycle>,
}

impl ContextResolver {
    pub fn builder() -> ResolverBuilder {
        ResolverBuilder::new()
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Response encoder override, if configured.
    pub fn response_encoder(&self) -> Option<&str> {
        self.config.response_encoder.as_deref()
    }

    pub fn registry(&self) -> &HandlerTypeRegistry {
        &self.registry
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Resolve the context serving `req` on the connection owning `conn`.
    ///
    /// Only handler construction errors (parameter mismatch, factory
    /// failure) are returned; discovery problems surface as an empty context.
    pub async fn resolve<B>(
        &self,
        req: &Request<B>,
        conn: &mut ConnectionState,
    ) -> Result<Arc<DispatchContext>> {
        if let Some(ctx) = conn.context() {
            return Ok(Arc::clone(ctx));
        }

        let session: Option<Arc<str>> = if self.config.sessions_enabled {
            session_id(req, &self.config.session_cookie_name).map(Arc::from)
        } else {
            None
        };

        if let Some(id) = &session {
            if let Some(ctx) = self.sessions.get(id) {
                if ctx.is_valid() {
                    tracing::debug!(session = %id, context = ctx.id(), "Session hit");
                    conn.bind(Arc::clone(&ctx));
                    return Ok(ctx);
                }
                tracing::debug!(session = %id, context = ctx.id(), "Evicting stale session");
                self.sessions.evict(id, &ctx);
            }
        }

        let uri = request_target(req);
        let ctx = Arc::new(self.new_context(uri, session.clone()).await?);
        conn.bind(Arc::clone(&ctx));

        if let Some(id) = session {
            self.sessions.insert(id, Arc::clone(&ctx));
        }

        Ok(ctx)
    }

    async fn new_context(&self, uri: &str, session: Option<Arc<str>>) -> Result<DispatchContext> {
        if uri.is_empty() {
            return Ok(DispatchContext::empty(session));
        }

        let types = self.registry.handler_types().await;
        let Some(handler_type) = types.iter().find(|t| t.handles(uri)) else {
            tracing::debug!(uri, "No handler type matches");
            return Ok(DispatchContext::empty(session));
        };

        let params = self.config.params_for(handler_type.name());
        let address = self
            .lifecycle
            .spawn(handler_type, params)
            .inspect_err(|e| {
                tracing::error!(handler = handler_type.name(), uri, "Cannot create handler: {}", e)
            })?;

        let ctx = DispatchContext::bound(
            session,
            handler_type.clone(),
            address,
            Arc::clone(&self.lifecycle),
        );
        tracing::debug!(
            uri,
            handler = handler_type.name(),
            context = ctx.id(),
            "Created dispatch context"
        );
        Ok(ctx)
    }
}

impl std::fmt::Debug for ContextResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextResolver")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("sessions", &self.sessions.len())
            .finish_non_exhaustive()
    }
}

/// Path and query of the request target.
fn request_target<B>(req: &Request<B>) -> &str {
    req.uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| req.uri().path())
}
