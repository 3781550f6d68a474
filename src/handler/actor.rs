//! The handler side of a dispatch: what a spawned web actor implements.
//!
//! # Example
//!
//! ```
//! use webactor_dispatch::handler::{BoxFuture, Flow, HandlerResult, WebActor, WebMessage};
//!
//! struct Counter {
//!     seen: usize,
//! }
//!
//! impl WebActor for Counter {
//!     fn handle(&mut self, msg: WebMessage) -> BoxFuture<'_, HandlerResult> {
//!         Box::pin(async move {
//!             self.seen += 1;
//!             if msg.payload.as_ref() == b"bye" {
//!                 return Ok(Flow::Stop);
//!             }
//!             Ok(Flow::Continue)
//!         })
//!     }
//! }
//! ```

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;

use crate::error::Result;

/// Boxed future for handler results.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Result type for a single handled message.
pub type HandlerResult = Result<Flow>;

/// What the actor loop does after a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep draining the mailbox.
    Continue,
    /// Stop the actor. Its address becomes invalid.
    Stop,
}

/// Transport the message arrived over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Http,
    WebSocket,
}

/// A message delivered to a web actor's mailbox.
///
/// Framing is done upstream; the actor sees the request target and a body.
#[derive(Debug, Clone)]
pub struct WebMessage {
    pub protocol: Protocol,
    pub uri: String,
    pub payload: Bytes,
}

impl WebMessage {
    /// An HTTP request body for `uri`.
    pub fn http(uri: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            protocol: Protocol::Http,
            uri: uri.into(),
            payload: payload.into(),
        }
    }

    /// A WebSocket frame received on `uri`.
    pub fn websocket(uri: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            protocol: Protocol::WebSocket,
            uri: uri.into(),
            payload: payload.into(),
        }
    }
}

/// A live, independently addressable unit of session state.
pub trait WebActor: Send + 'static {
    /// Handle one message from the mailbox.
    ///
    /// Returning `Ok(Flow::Stop)` or an error ends the actor.
    fn handle(&mut self, msg: WebMessage) -> BoxFuture<'_, HandlerResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo {
        last: Option<Bytes>,
    }

    impl WebActor for Echo {
        fn handle(&mut self, msg: WebMessage) -> BoxFuture<'_, HandlerResult> {
            Box::pin(async move {
                self.last = Some(msg.payload);
                Ok(Flow::Continue)
            })
        }
    }

    #[test]
    fn test_message_constructors() {
        let m = WebMessage::http("/a", "body");
        assert_eq!(m.protocol, Protocol::Http);
        assert_eq!(m.uri, "/a");
        assert_eq!(m.payload, Bytes::from_static(b"body"));

        let w = WebMessage::websocket("/ws", vec![1u8, 2]);
        assert_eq!(w.protocol, Protocol::WebSocket);
        assert_eq!(w.payload.as_ref(), &[1, 2]);
    }

    #[tokio::test]
    async fn test_actor_handles_message() {
        let mut actor = Echo { last: None };
        let flow = actor.handle(WebMessage::http("/a", "x")).await.unwrap();
        assert_eq!(flow, Flow::Continue);
        assert_eq!(actor.last, Some(Bytes::from_static(b"x")));
    }
}
