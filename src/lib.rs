//! # webactor-dispatch
//!
//! Session-affine actor dispatch for HTTP and WebSocket requests.
//!
//! Given an inbound request, decide which handler (a spawned web actor)
//! serves it: reuse the handler bound to the request's session cookie, or
//! spawn a fresh one from the first discovered handler type whose URI
//! patterns accept the request.
//!
//! ## Architecture
//!
//! - **Discovery**: handler types are found once per process, by build-time
//!   registration, an explicit manifest, or a directory scan for marked units
//! - **Matching**: each handler type declares servlet-style URI patterns for
//!   HTTP and for WebSocket; discovery order breaks ties
//! - **Sessions**: a concurrent store maps session ids to dispatch contexts;
//!   contexts whose handler died are evicted on the next lookup
//! - **Connections**: a per-connection state caches the resolved context
//!
//! ## Example
//!
//! ```ignore
//! use webactor_dispatch::{ConnectionState, ContextResolver, WebMessage};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let resolver = ContextResolver::builder().build()?;
//!
//!     let mut conn = ConnectionState::new();
//!     let ctx = resolver.resolve(&request, &mut conn).await?;
//!     if let Some(addr) = ctx.address() {
//!         addr.send(WebMessage::http("/chat", "hi")).await?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod context;
pub mod discovery;
pub mod error;
pub mod handler;
pub mod matcher;
pub mod session;

mod resolver;

pub use config::DispatchConfig;
pub use context::{ConnectionState, DispatchContext};
pub use error::{DispatchError, Result};
pub use handler::{HandlerAddress, HandlerType, WebActor, WebMessage};
pub use resolver::{ContextResolver, ResolverBuilder};
