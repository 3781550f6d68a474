//! Session Echo - one handler per session.
//!
//! This example demonstrates:
//! - Registering a handler type with `inventory::submit!`
//! - Resolving requests through a shared `ContextResolver`
//! - Session affinity: the same cookie reaches the same handler
//!
//! ```text
//! RUST_LOG=webactor_dispatch=debug cargo run --example session_echo
//! ```

use std::sync::Arc;

use http::header::COOKIE;
use http::Request;
use serde_json::Value;
use tracing_subscriber::EnvFilter;
use webactor_dispatch::handler::{BoxFuture, Flow, HandlerResult, WebActorDef, WebActorReg};
use webactor_dispatch::{ConnectionState, ContextResolver, WebActor, WebMessage};

/// Echoes every message, prefixed with its greeting and a running count.
struct Echo {
    greeting: String,
    seen: usize,
}

impl WebActor for Echo {
    fn handle(&mut self, msg: WebMessage) -> BoxFuture<'_, HandlerResult> {
        Box::pin(async move {
            self.seen += 1;
            println!(
                "{} #{} {:?} {}: {}",
                self.greeting,
                self.seen,
                msg.protocol,
                msg.uri,
                String::from_utf8_lossy(&msg.payload)
            );
            Ok(Flow::Continue)
        })
    }
}

fn echo(params: &[Value]) -> webactor_dispatch::Result<Box<dyn WebActor>> {
    let greeting = params
        .first()
        .and_then(Value::as_str)
        .unwrap_or("echo")
        .to_string();
    Ok(Box::new(Echo { greeting, seen: 0 }))
}

static ECHO: WebActorDef = WebActorDef {
    name: "echo",
    http: &["/echo/*"],
    websocket: &["/echo/live"],
    arity: 1,
    factory: echo,
};

inventory::submit!(WebActorReg(&ECHO));

fn request(uri: &str, session: &str) -> http::Result<Request<()>> {
    Request::builder()
        .uri(uri)
        .header(COOKIE, format!("theme=dark; SESSIONID={session}"))
        .body(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let resolver = Arc::new(
        ContextResolver::builder()
            .handler_params("echo", vec![Value::from("hello")])
            .build()?,
    );

    for (session, uri, body) in [
        ("alice", "/echo/a", "first"),
        ("bob", "/echo/b", "second"),
        ("alice", "/echo/c?x=1", "third"),
    ] {
        // Each request arrives on its own connection here.
        let mut conn = ConnectionState::new();
        let ctx = resolver.resolve(&request(uri, session)?, &mut conn).await?;
        if let Some(addr) = ctx.address() {
            println!("{session} -> handler {}", addr.id());
            addr.send(WebMessage::http(uri, body)).await?;
        }
    }

    let ctx = resolver
        .resolve(&request("/nowhere", "carol")?, &mut ConnectionState::new())
        .await?;
    println!("carol -> not found: {}", ctx.address().is_none());

    // Let the handlers drain their mailboxes.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    Ok(())
}
