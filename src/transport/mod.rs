//! The local WebSocket bridge to the extension shim.
//!
//! The shim is the only code running inside the browser. It forwards the
//! debugger, tabs and storage APIs; everything it receives comes through
//! here.
//!
//! # Layout
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Coordinator    │                              │  Extension shim │
//! │  (Rust)         │         WebSocket            │  (background)   │
//! │  PendingServer  │◄────────────────────────────►│                 │
//! │  → Connection   │      localhost:PORT          │  debugger/tabs/ │
//! │                 │                              │  storage APIs   │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. [`PendingServer::bind`] listens on a loopback port
//! 2. [`PendingServer::accept`] waits for the shim and its READY frame
//! 3. [`Connection::call`] carries host calls; [`Connection::take_events`]
//!    hands out browser events
//! 4. [`Connection::close`], or the shim disconnecting, ends both
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | Socket task, call correlation, event buffering |
//! | `server` | Loopback listener and handshake |

// ============================================================================
// Submodules
// ============================================================================

/// Socket task and call correlation.
pub mod connection;

/// Loopback listener for the extension shim.
pub mod server;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{Connection, DEFAULT_REQUEST_TIMEOUT, ReadyData};
pub use server::{DEFAULT_ACCEPT_TIMEOUT, PendingServer};
