//! Host browser interfaces.
//!
//! The coordinator drives the browser through two traits:
//!
//! | Trait | Host API |
//! |-------|----------|
//! | [`Instrumentation`] | Debugger sessions: attach, DevTools commands, detach, target list |
//! | [`TabHost`] | Tabs: active tab query, lookup, open |
//!
//! # Implementations
//!
//! | Type | Description |
//! |------|-------------|
//! | [`RemoteHost`] | Extension shim over the WebSocket bridge |
//! | [`RecordingHost`] | In-memory host that records every call |

// ============================================================================
// Imports
// ============================================================================

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::identifiers::{TabId, TargetId};
use crate::protocol::DevToolsCommand;

// ============================================================================
// Submodules
// ============================================================================

/// In-memory recording host.
pub mod recording;

/// WebSocket bridge host.
pub mod remote;

// ============================================================================
// Re-exports
// ============================================================================

pub use crate::protocol::DebugTarget;
pub use recording::{AttachBehavior, HostCall, RecordingHost};
pub use remote::RemoteHost;

// ============================================================================
// Constants
// ============================================================================

/// DevTools protocol version requested on attach.
pub const PROTOCOL_VERSION: &str = "1.3";

/// Host attach errors that mean "a session already exists".
static ALREADY_ATTACHED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)already\s+attached").expect("valid regex"));

/// Returns `true` if a host attach error means a session already exists.
#[must_use]
pub fn is_already_attached_message(message: &str) -> bool {
    ALREADY_ATTACHED.is_match(message)
}

// ============================================================================
// TabInfo
// ============================================================================

/// A browser tab as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabInfo {
    /// Tab ID.
    pub id: TabId,
    /// Current URL. Absent while the host withholds it.
    #[serde(default)]
    pub url: Option<String>,
    /// Whether this is the active tab of its window.
    #[serde(default)]
    pub active: bool,
}

impl TabInfo {
    /// Creates a tab record.
    #[must_use]
    pub fn new(id: TabId, url: impl Into<String>) -> Self {
        Self {
            id,
            url: Some(url.into()),
            active: false,
        }
    }
}

// ============================================================================
// TargetInfo
// ============================================================================

/// An instrumentation target from the host target list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetInfo {
    /// Host target ID.
    pub id: TargetId,
    /// Owning tab, for page targets.
    #[serde(rename = "tabId", default)]
    pub tab_id: Option<TabId>,
    /// Target URL.
    #[serde(default)]
    pub url: String,
    /// Whether a debugger session is attached.
    #[serde(default)]
    pub attached: bool,
}

// ============================================================================
// Instrumentation
// ============================================================================

/// Host instrumentation (debugger) API.
#[async_trait]
pub trait Instrumentation: Send + Sync {
    /// Opens a session on a tab.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyAttached`](crate::Error::AlreadyAttached) if a session exists
    /// - [`Error::HostCommand`](crate::Error::HostCommand) for any other refusal
    async fn attach(&self, tab_id: TabId, version: &str) -> Result<()>;

    /// Sends a DevTools command over a session.
    async fn send_command(&self, target: &DebugTarget, command: DevToolsCommand) -> Result<Value>;

    /// Closes a session.
    async fn detach(&self, target: &DebugTarget) -> Result<()>;

    /// Lists all debuggable targets, attached or not.
    async fn targets(&self) -> Result<Vec<TargetInfo>>;
}

// ============================================================================
// TabHost
// ============================================================================

/// Host tab API.
#[async_trait]
pub trait TabHost: Send + Sync {
    /// Returns the active tab(s) of the focused window.
    async fn active_tabs(&self) -> Result<Vec<TabInfo>>;

    /// Looks up one tab.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TabNotFound`](crate::Error::TabNotFound) if the tab is gone.
    async fn tab(&self, tab_id: TabId) -> Result<TabInfo>;

    /// Opens a URL in a new tab.
    async fn open(&self, url: &str) -> Result<()>;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_already_attached_detection() {
        assert!(is_already_attached_message(
            "Another debugger is already attached to the tab with id: 12."
        ));
        assert!(is_already_attached_message("Already attached"));
        assert!(!is_already_attached_message("No tab with given id 12."));
        assert!(!is_already_attached_message(
            "Cannot access a chrome:// URL"
        ));
    }

    #[test]
    fn test_tab_info_from_host_object() {
        let tab: TabInfo = serde_json::from_value(json!({
            "id": 3,
            "url": "https://example.com/",
            "active": true,
            "windowId": 1
        }))
        .expect("parse");

        assert_eq!(tab.id.as_u32(), 3);
        assert_eq!(tab.url.as_deref(), Some("https://example.com/"));
        assert!(tab.active);
    }

    #[test]
    fn test_target_info_from_host_object() {
        let target: TargetInfo = serde_json::from_value(json!({
            "id": "A1B2",
            "tabId": 3,
            "type": "page",
            "url": "https://example.com/",
            "attached": true
        }))
        .expect("parse");

        assert_eq!(target.id, TargetId::new("A1B2"));
        assert_eq!(target.tab_id.map(|id| id.as_u32()), Some(3));
        assert!(target.attached);
    }

    #[test]
    fn test_target_info_without_tab() {
        let target: TargetInfo = serde_json::from_value(json!({
            "id": "worker-1",
            "type": "worker",
            "attached": false
        }))
        .expect("parse");

        assert!(target.tab_id.is_none());
        assert!(!target.attached);
    }
}
