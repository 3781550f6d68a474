//! Scan Directory - discover handler types from marked unit files.
//!
//! Only units whose metadata carries the marker line become handler types;
//! the rest are skipped without being loaded.
//!
//! ```text
//! cargo run --example scan_directory -- ./actors
//! ```
//!
//! With no argument, a throwaway directory with two units is created.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use tracing_subscriber::EnvFilter;
use webactor_dispatch::config::{DEFAULT_MARKER, DEFAULT_UNIT_EXTENSION};
use webactor_dispatch::discovery::{DirectoryResources, LineMarker, ScanDiscovery};
use webactor_dispatch::handler::{
    BoxFuture, Flow, HandlerResult, HandlerTypeRegistry, WebActorDef, WebActorReg,
};
use webactor_dispatch::WebActor;

struct Silent;

impl WebActor for Silent {
    fn handle(&mut self, _msg: webactor_dispatch::WebMessage) -> BoxFuture<'_, HandlerResult> {
        Box::pin(async { Ok(Flow::Continue) })
    }
}

fn silent(_params: &[Value]) -> webactor_dispatch::Result<Box<dyn WebActor>> {
    Ok(Box::new(Silent))
}

static LOBBY: WebActorDef = WebActorDef {
    name: "lobby",
    http: &["/lobby", "/lobby/*"],
    websocket: &["/lobby/ws"],
    arity: 0,
    factory: silent,
};

static REPORTS: WebActorDef = WebActorDef {
    name: "reports",
    http: &["*.csv"],
    websocket: &[],
    arity: 0,
    factory: silent,
};

inventory::submit!(WebActorReg(&LOBBY));
inventory::submit!(WebActorReg(&REPORTS));

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();

    let root = match std::env::args().nth(1) {
        Some(dir) => PathBuf::from(dir),
        None => {
            let dir = std::env::temp_dir().join("webactor-scan-demo");
            std::fs::create_dir_all(&dir)?;
            std::fs::write(dir.join("lobby.actor"), format!("{DEFAULT_MARKER}\n"))?;
            std::fs::write(dir.join("reports.actor"), "// not a handler\n")?;
            dir
        }
    };

    let registry = HandlerTypeRegistry::new(Arc::new(ScanDiscovery::registered(
        DirectoryResources::new(&root, DEFAULT_UNIT_EXTENSION),
        LineMarker,
        DEFAULT_MARKER,
    )));

    let types = registry.handler_types().await;
    println!("{} handler type(s) under {}", types.len(), root.display());
    for t in types.iter() {
        println!(
            "  {:<10} http={:?} websocket={:?}",
            t.name(),
            t.http().patterns(),
            t.websocket().patterns()
        );
    }

    Ok(())
}
