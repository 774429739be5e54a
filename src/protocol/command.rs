//! Bridge command definitions organized by host API.
//!
//! Commands follow `api.methodName` format, mirroring the extension API
//! the shim forwards them to.
//!
//! # Command Modules
//!
//! | Module | Commands |
//! |--------|----------|
//! | `debugger` | Attach, send DevTools command, detach, list targets |
//! | `tabs` | Query active tabs, get tab, open tab |
//! | `storage` | Get and set persisted values |
//! | `runtime` | Reply to a control panel message |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identifiers::{RequestId, TabId, TargetId};

use super::{ControlReply, DevToolsCommand};

// ============================================================================
// DebugTarget
// ============================================================================

/// Addresses an instrumentation session.
///
/// Serializes as `{ "tabId": 1 }` or `{ "targetId": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DebugTarget {
    /// Session addressed by tab.
    Tab {
        /// Tab ID.
        #[serde(rename = "tabId")]
        tab_id: TabId,
    },
    /// Session addressed by host target ID.
    Target {
        /// Target ID from the host target list.
        #[serde(rename = "targetId")]
        target_id: TargetId,
    },
}

impl DebugTarget {
    /// Addresses a tab.
    #[inline]
    #[must_use]
    pub const fn tab(tab_id: TabId) -> Self {
        Self::Tab { tab_id }
    }

    /// Addresses a host target.
    #[inline]
    #[must_use]
    pub const fn target(target_id: TargetId) -> Self {
        Self::Target { target_id }
    }
}

impl std::fmt::Display for DebugTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tab { tab_id } => write!(f, "tab:{tab_id}"),
            Self::Target { target_id } => write!(f, "target:{target_id}"),
        }
    }
}

// ============================================================================
// Command Wrapper
// ============================================================================

/// All bridge commands organized by host API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Command {
    /// Debugger API commands.
    Debugger(DebuggerCommand),
    /// Tabs API commands.
    Tabs(TabsCommand),
    /// Storage API commands.
    Storage(StorageCommand),
    /// Runtime API commands.
    Runtime(RuntimeCommand),
}

impl Command {
    /// Returns the method name for logging.
    #[must_use]
    pub fn method(&self) -> &'static str {
        match self {
            Self::Debugger(DebuggerCommand::Attach { .. }) => "debugger.attach",
            Self::Debugger(DebuggerCommand::SendCommand { .. }) => "debugger.sendCommand",
            Self::Debugger(DebuggerCommand::Detach { .. }) => "debugger.detach",
            Self::Debugger(DebuggerCommand::GetTargets) => "debugger.getTargets",
            Self::Tabs(TabsCommand::Query { .. }) => "tabs.query",
            Self::Tabs(TabsCommand::Get { .. }) => "tabs.get",
            Self::Tabs(TabsCommand::Create { .. }) => "tabs.create",
            Self::Storage(StorageCommand::Get { .. }) => "storage.get",
            Self::Storage(StorageCommand::Set { .. }) => "storage.set",
            Self::Runtime(RuntimeCommand::Reply { .. }) => "runtime.reply",
        }
    }
}

// ============================================================================
// Debugger Commands
// ============================================================================

/// Debugger API commands for instrumentation sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum DebuggerCommand {
    /// Attach to a tab.
    #[serde(rename = "debugger.attach")]
    Attach {
        /// Tab to attach to.
        #[serde(rename = "tabId")]
        tab_id: TabId,
        /// Requested protocol version.
        version: String,
    },

    /// Send a DevTools command over an attached session.
    #[serde(rename = "debugger.sendCommand")]
    SendCommand {
        /// Session to use.
        target: DebugTarget,
        /// Command with parameters.
        command: DevToolsCommand,
    },

    /// Detach a session.
    #[serde(rename = "debugger.detach")]
    Detach {
        /// Session to close.
        target: DebugTarget,
    },

    /// List all debuggable targets.
    #[serde(rename = "debugger.getTargets")]
    GetTargets,
}

// ============================================================================
// Tabs Commands
// ============================================================================

/// Tabs API commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum TabsCommand {
    /// Query tabs.
    #[serde(rename = "tabs.query")]
    Query {
        /// Only active tabs.
        active: bool,
        /// Only tabs in the focused window.
        #[serde(rename = "currentWindow")]
        current_window: bool,
    },

    /// Get one tab.
    #[serde(rename = "tabs.get")]
    Get {
        /// Tab ID.
        #[serde(rename = "tabId")]
        tab_id: TabId,
    },

    /// Open a new tab.
    #[serde(rename = "tabs.create")]
    Create {
        /// URL to open.
        url: String,
    },
}

// ============================================================================
// Storage Commands
// ============================================================================

/// Extension storage commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum StorageCommand {
    /// Read a key.
    #[serde(rename = "storage.get")]
    Get {
        /// Key name.
        key: String,
    },

    /// Write a key.
    #[serde(rename = "storage.set")]
    Set {
        /// Key name.
        key: String,
        /// JSON value.
        value: Value,
    },
}

// ============================================================================
// Runtime Commands
// ============================================================================

/// Runtime messaging commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum RuntimeCommand {
    /// Answer a `runtime.message` event.
    #[serde(rename = "runtime.reply")]
    Reply {
        /// ID of the message event being answered.
        #[serde(rename = "messageId")]
        message_id: RequestId,
        /// Reply payload.
        response: ControlReply,
    },
}

// ============================================================================
// Tests
// ============================================================================
