//! geoveil - Geolocation and timezone override coordinator for browser tabs.
//!
//! This library drives a browser's debugger API to make pages see a chosen
//! position and timezone instead of the real ones.
//!
//! # Architecture
//!
//! The coordinator follows a client-server model:
//!
//! - **Local End (Rust)**: Holds state, decides when and what to override
//! - **Remote End (Extension shim)**: Executes debugger, tabs and storage calls
//!
//! Key design principles:
//!
//! - One attach sequence per tab at a time; duplicate triggers are dropped
//! - Position and timezone are overridden together through DevTools commands
//! - Stopping clears overrides before detaching
//! - Host APIs sit behind traits, so the same coordinator runs over the
//!   WebSocket bridge or an in-memory host
//!
//! # Quick Start
//!
//! ```no_run
//! use std::net::{IpAddr, Ipv4Addr};
//! use std::sync::Arc;
//!
//! use geoveil::transport::PendingServer;
//! use geoveil::{Coordinator, RemoteHost, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // Wait for the extension shim
//!     let server = PendingServer::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 7878).await?;
//!     let (connection, ready) = server.accept().await?;
//!     let host = Arc::new(RemoteHost::new(connection, ready));
//!
//!     // Coordinator over the shim's debugger, tabs and storage
//!     let coordinator = Coordinator::builder()
//!         .host(Arc::clone(&host))
//!         .store(host.clone())
//!         .panel_url(host.panel_url())
//!         .default_providers()
//!         .build()?;
//!
//!     coordinator.startup().await;
//!     host.serve(coordinator).await;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`coordinator`] | State machine: attach, override, detach |
//! | [`panel`] | Control panel model |
//! | [`geo`] | Coordinates and saved locations |
//! | [`provider`] | IP, timezone and address lookup services |
//! | [`host`] | Host browser traits and implementations |
//! | [`store`] | Persistent key/value storage |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Bridge message types (internal) |
//! | [`transport`] | WebSocket transport layer (internal) |

// ============================================================================
// Modules
// ============================================================================

/// Location override coordinator.
///
/// Use [`Coordinator::builder()`] to create one.
pub mod coordinator;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Coordinates and saved locations.
pub mod geo;

/// Host browser interfaces.
///
/// - [`Instrumentation`] - Debugger sessions and DevTools commands
/// - [`TabHost`] - Tab queries
pub mod host;

/// Type-safe identifiers.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// Control panel model.
pub mod panel;

/// Bridge protocol message types.
///
/// Internal module defining request/response/event structures.
pub mod protocol;

/// Remote lookup providers with fallback.
pub mod provider;

/// Persistent key/value storage.
pub mod store;

/// WebSocket transport layer.
///
/// Internal module handling WebSocket server and connection management.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Coordinator types
pub use coordinator::{
    AttachOutcome, Coordinator, CoordinatorBuilder, CoordinatorOptions, OverrideOutcome,
    SkipReason, SpoofState,
};

// Error types
pub use error::{Error, Result};

// Location types
pub use geo::{Coordinate, SavedLocation, SavedLocations};

// Host types
pub use host::{Instrumentation, RecordingHost, RemoteHost, TabHost};

// Identifier types
pub use identifiers::{LocationId, RequestId, TabId, TargetId};

// Panel types
pub use panel::{ControlPanel, CoordinatorClient, PanelView};

// Protocol types
pub use protocol::{ControlMessage, ControlReply, DevToolsCommand, HostEvent, StatusReport};

// Provider types
pub use provider::{FallbackChain, Geocoder, IpLocator, TimezoneLookup};

// Store types
pub use store::{FileStore, KeyValueStore, MemoryStore};
