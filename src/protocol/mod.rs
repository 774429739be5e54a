//! Bridge protocol message types.
//!
//! This module defines the message format for communication between the
//! local end (Rust) and the extension shim, plus the control panel
//! messages and DevTools commands carried inside it.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `Request` | Local → Shim | Host API call |
//! | `Response` | Shim → Local | Host API result |
//! | `Event` | Shim → Local | Tab lifecycle, install, panel message |
//!
//! # Command Naming
//!
//! Commands follow `api.methodName` format:
//!
//! - `debugger.attach`
//! - `tabs.query`
//! - `storage.set`
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Bridge commands by host API |
//! | `devtools` | DevTools commands sent through a session |
//! | `event` | Event and parsed event types |
//! | `message` | Control panel request and reply types |
//! | `request` | Request and Response types |

// ============================================================================
// Submodules
// ============================================================================

/// Bridge commands organized by host API.
pub mod command;

/// DevTools protocol commands.
pub mod devtools;

/// Event message types.
pub mod event;

/// Control panel messages.
pub mod message;

/// Request and Response message types.
pub mod request;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{
    Command, DebugTarget, DebuggerCommand, RuntimeCommand, StorageCommand, TabsCommand,
};
pub use devtools::DevToolsCommand;
pub use event::{Event, HostEvent, InstallReason, TabStatus};
pub use message::{ControlMessage, ControlReply, IpSyncOutcome, StatusReport};
pub use request::{Outcome, Request, Response};
