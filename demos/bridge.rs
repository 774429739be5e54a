//! Coordinator over a live extension shim.
//!
//! Demonstrates:
//! - Binding the bridge server and waiting for the shim's READY
//! - Building a coordinator over the shim's debugger and tabs APIs
//! - Restoring state and re-applying the override on startup
//! - Serving tab events and control panel messages until Ctrl+C
//!
//! Usage:
//!   cargo run --example bridge
//!   cargo run --example bridge -- --debug
//!   cargo run --example bridge -- --port 9000
//!   cargo run --example bridge -- --state ./geoveil-state.json

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::sync::Arc;

use geoveil::transport::PendingServer;
use geoveil::{Coordinator, FileStore, KeyValueStore, RemoteHost, Result};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Constants
// ============================================================================

const DEFAULT_PORT: u16 = 7878;

// ============================================================================
// Args
// ============================================================================

/// Command-line arguments.
#[derive(Debug, Clone)]
struct Args {
    debug: bool,
    port: u16,
    state: Option<PathBuf>,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let value_of = |flag: &str| {
            args.iter()
                .position(|a| a == flag)
                .and_then(|i| args.get(i + 1))
                .cloned()
        };

        Self {
            debug: args.iter().any(|a| a == "--debug"),
            port: value_of("--port")
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            state: value_of("--state").map(PathBuf::from),
        }
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    println!("=== geoveil bridge ===\n");

    // ========================================================================
    // Wait for Shim
    // ========================================================================

    let server = PendingServer::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), args.port).await?;
    println!("[1] Waiting for extension shim on {}", server.ws_url());

    let (connection, ready) = server.accept().await?;
    let host = Arc::new(RemoteHost::new(connection, ready));
    println!("    ✓ Connected to {}", host.browser());
    println!("    Panel: {}\n", host.panel_url());

    // ========================================================================
    // Build Coordinator
    // ========================================================================

    let store: Arc<dyn KeyValueStore> = match &args.state {
        Some(path) => {
            println!("[2] State file: {}", path.display());
            Arc::new(FileStore::new(path))
        }
        None => {
            println!("[2] State kept in extension storage");
            host.clone()
        }
    };

    let coordinator = Coordinator::builder()
        .host(Arc::clone(&host))
        .store(store)
        .panel_url(host.panel_url())
        .default_providers()
        .build()?;

    let touched = coordinator.startup().await;
    let status = coordinator.status();
    println!(
        "    ✓ Restored: spoofing={} ip_sync={} tabs={}\n",
        status.active,
        status.ip_sync,
        touched.len()
    );

    // ========================================================================
    // Serve
    // ========================================================================

    println!("[3] Serving events. Press Ctrl+C to exit...");

    tokio::select! {
        () = Arc::clone(&host).serve(coordinator.clone()) => {
            println!("\n    Shim disconnected");
        }
        _ = tokio::signal::ctrl_c() => {
            println!("\n    Shutting down");
        }
    }

    coordinator.flush().await;
    host.connection().close();

    println!("\n=== Done ===");
    Ok(())
}

// ============================================================================
// Logging
// ============================================================================

fn init_logging(debug: bool) {
    let filter = if debug { "geoveil=debug" } else { "geoveil=info" };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();
}
