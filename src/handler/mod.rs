//! Handler module - handler types, spawning, and the type registry.
//!
//! Provides:
//! - [`HandlerType`] - one kind of session behaviour and its URI patterns
//! - [`HandlerTypeRegistry`] - lazily discovered, ordered set of handler types
//! - [`HandlerLifecycle`] - spawns handlers and reports whether they are alive
//! - [`WebActor`] - what a spawned handler implements
//!
//! # Example
//!
//! ```ignore
//! use webactor_dispatch::handler::{HandlerLifecycle, HandlerType, TaskLifecycle};
//! use webactor_dispatch::matcher::UriMatcher;
//!
//! let chat = HandlerType::new(
//!     "chat",
//!     UriMatcher::parse(&["/chat/*"])?,
//!     UriMatcher::parse(&["/chat/ws"])?,
//!     0,
//!     |_params| Ok(Box::new(ChatRoom::default())),
//! );
//!
//! let addr = TaskLifecycle::default().spawn(&chat, &[])?;
//! addr.send(WebMessage::http("/chat/lobby", "hello")).await?;
//! ```

mod actor;
mod lifecycle;
mod registry;
mod types;

pub use actor::{BoxFuture, Flow, HandlerResult, Protocol, WebActor, WebMessage};
pub use lifecycle::{
    HandlerAddress, HandlerId, HandlerLifecycle, TaskLifecycle, DEFAULT_MAILBOX_CAPACITY,
};
pub use registry::HandlerTypeRegistry;
pub use types::{registrations, HandlerFactory, HandlerType, WebActorDef, WebActorReg};
