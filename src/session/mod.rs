//! Session affinity - cookie extraction and the session store.
//!
//! Provides:
//! - [`session_id`] - read the session cookie from a request
//! - [`SessionStore`] - session id to [`DispatchContext`](crate::DispatchContext) map

mod cookie;
mod store;

pub use cookie::session_id;
pub use store::SessionStore;

/// Default session cookie name.
pub const DEFAULT_SESSION_COOKIE: &str = "SESSIONID";
