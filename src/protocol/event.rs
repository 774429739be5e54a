//! Browser notifications pushed by the shim.
//!
//! Events carry no reply. The coordinator reacts to tab activation and
//! navigation, to first install, and to panel messages.
//!
//! # Kinds
//!
//! | Module | Events |
//! |--------|--------|
//! | `tabs` | `activated`, `updated` |
//! | `runtime` | `installed`, `message` |

// ============================================================================
// Imports
// ============================================================================

use serde::Deserialize;
use serde_json::Value;

use crate::identifiers::{RequestId, TabId};

use super::ControlMessage;

// ============================================================================
// Event
// ============================================================================

/// One pushed notification.
///
/// # Wire
///
/// ```json
/// {
///   "id": "event-uuid",
///   "type": "event",
///   "method": "tabs.updated",
///   "params": { "tabId": 4, "status": "loading", "url": "https://example.com" }
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    /// Doubles as the reply id for `runtime.message`.
    pub id: RequestId,

    /// `tabs.updated`, `runtime.message`, ...
    pub method: String,

    /// Method-specific payload; `null` when absent.
    #[serde(default)]
    pub params: Value,
}

// ============================================================================
// TabStatus
// ============================================================================

/// Navigation status reported with `tabs.updated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabStatus {
    /// Navigation started.
    Loading,
    /// Navigation finished.
    Complete,
    /// Anything else the host may report.
    Other,
}

impl TabStatus {
    /// Parses a host status string.
    #[must_use]
    pub fn parse(status: &str) -> Self {
        match status {
            "loading" => Self::Loading,
            "complete" => Self::Complete,
            _ => Self::Other,
        }
    }

    /// Returns `true` for statuses that should trigger an override.
    #[inline]
    #[must_use]
    pub const fn triggers_override(&self) -> bool {
        matches!(self, Self::Loading | Self::Complete)
    }
}

// ============================================================================
// InstallReason
// ============================================================================

/// Why `runtime.installed` fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallReason {
    /// First installation.
    Install,
    /// Extension update.
    Update,
    /// Any other reason (browser update, shared module).
    Other(String),
}

impl InstallReason {
    /// Parses a host reason string.
    #[must_use]
    pub fn parse(reason: &str) -> Self {
        match reason {
            "install" => Self::Install,
            "update" => Self::Update,
            other => Self::Other(other.to_string()),
        }
    }
}

// ============================================================================
// HostEvent
// ============================================================================

/// Parsed event types for type-safe handling.
#[derive(Debug, Clone)]
pub enum HostEvent {
    /// A tab became the active tab of its window.
    TabActivated {
        /// Tab ID.
        tab_id: TabId,
    },

    /// A tab's navigation status or URL changed.
    TabUpdated {
        /// Tab ID.
        tab_id: TabId,
        /// New status, if the status changed.
        status: Option<TabStatus>,
        /// Current tab URL, if known.
        url: Option<String>,
    },

    /// The extension was installed or updated.
    Installed {
        /// Install reason.
        reason: InstallReason,
    },

    /// The control panel sent a message.
    Message {
        /// ID to reply to.
        message_id: RequestId,
        /// Decoded message.
        message: ControlMessage,
    },

    /// Unknown or malformed event.
    Unknown {
        /// Event method.
        method: String,
        /// Event params.
        params: Value,
    },
}

// ============================================================================
// Event Parsing
// ============================================================================

impl Event {
    /// Decodes `params` for the known methods.
    ///
    /// Known methods with missing or invalid fields come back as
    /// [`HostEvent::Unknown`], same as unknown methods.
    #[must_use]
    pub fn parse(&self) -> HostEvent {
        let parsed = match self.method.as_str() {
            "tabs.activated" => self
                .tab_param()
                .map(|tab_id| HostEvent::TabActivated { tab_id }),

            "tabs.updated" => self.tab_param().map(|tab_id| HostEvent::TabUpdated {
                tab_id,
                status: self.str_param("status").map(TabStatus::parse),
                url: self.str_param("url").map(str::to_string),
            }),

            "runtime.installed" => Some(HostEvent::Installed {
                reason: InstallReason::parse(self.str_param("reason").unwrap_or_default()),
            }),

            "runtime.message" => self
                .params
                .get("message")
                .and_then(|raw| ControlMessage::deserialize(raw).ok())
                .map(|message| HostEvent::Message {
                    message_id: self.id,
                    message,
                }),

            _ => None,
        };

        parsed.unwrap_or_else(|| HostEvent::Unknown {
            method: self.method.clone(),
            params: self.params.clone(),
        })
    }

    fn str_param(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }

    fn tab_param(&self) -> Option<TabId> {
        self.params
            .get("tabId")
            .and_then(Value::as_u64)
            .and_then(|raw| u32::try_from(raw).ok())
            .and_then(TabId::new)
    }
}

// ============================================================================
// Tests
// ============================================================================
