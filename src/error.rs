//! The crate-wide [`Error`] and its [`Result`] alias.
//!
//! Coordinator sequences never surface errors to the caller; they log and
//! map them to an outcome. The fallible surface is the bridge, the builder,
//! the providers, and the control panel.
//!
//! ```ignore
//! use geoveil::{Error, Result};
//!
//! async fn remember(panel: &mut ControlPanel<Coordinator>) -> Result<()> {
//!     match panel.save_location("Office").await {
//!         Err(e) if e.is_validation_error() => Ok(()),
//!         other => other,
//!     }
//! }
//! ```
//!
//! | Source | Variants |
//! |--------|----------|
//! | Builder and options | [`Error::Config`] |
//! | Shim socket | [`Error::Connection`], [`Error::ConnectionTimeout`], [`Error::ConnectionClosed`] |
//! | Bridge frames | [`Error::Protocol`], [`Error::RequestTimeout`] |
//! | Browser APIs | [`Error::HostCommand`], [`Error::AlreadyAttached`], [`Error::TabNotFound`] |
//! | Web services | [`Error::Provider`] |
//! | Panel input | [`Error::InvalidCoordinate`], [`Error::InvalidLocationName`], [`Error::LocationNotFound`] |
//! | Persistence | [`Error::Storage`] |
//! | Wrapped | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`], [`Error::Http`], [`Error::ChannelClosed`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio::sync::oneshot::error::RecvError;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::{LocationId, RequestId, TabId};

// ============================================================================
// Result Alias
// ============================================================================

/// `Result` with geoveil's [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Everything that can go wrong outside the coordinator's own sequences.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration
    // ========================================================================
    /// Builder input or option value is unusable.
    #[error("Invalid configuration: {message}")]
    Config {
        /// What was wrong.
        message: String,
    },

    // ========================================================================
    // Shim Socket
    // ========================================================================
    /// The shim connection could not be set up.
    #[error("Bridge connection failed: {message}")]
    Connection {
        /// What failed.
        message: String,
    },

    /// The shim did not connect, or did not send READY, in time.
    #[error("Shim did not respond within {timeout_ms}ms")]
    ConnectionTimeout {
        /// How long we waited.
        timeout_ms: u64,
    },

    /// The shim went away while a call was outstanding.
    #[error("Bridge closed by the shim")]
    ConnectionClosed,

    // ========================================================================
    // Bridge Frames
    // ========================================================================
    /// A frame did not match the bridge protocol.
    #[error("Bridge protocol violation: {message}")]
    Protocol {
        /// What was malformed.
        message: String,
    },

    /// The shim never answered a call.
    #[error("No answer to call {request_id} after {timeout_ms}ms")]
    RequestTimeout {
        /// Id of the unanswered call.
        request_id: RequestId,
        /// How long we waited.
        timeout_ms: u64,
    },

    // ========================================================================
    // Browser APIs
    // ========================================================================
    /// The host rejected an instrumentation or tab command.
    #[error("Host command {method} failed: {message}")]
    HostCommand {
        /// Host method that failed.
        method: String,
        /// Error message reported by the host.
        message: String,
    },

    /// Tab already has an instrumentation session.
    ///
    /// Returned by attach when this or another client is already attached.
    #[error("Already attached to tab {tab_id}")]
    AlreadyAttached {
        /// The tab that is already instrumented.
        tab_id: TabId,
    },

    /// The tab was closed or never existed.
    #[error("No tab with id {tab_id}")]
    TabNotFound {
        /// The missing tab.
        tab_id: TabId,
    },

    // ========================================================================
    // Web Services
    // ========================================================================
    /// Web service provider failure.
    ///
    /// Covers network errors, malformed payloads and missing fields.
    #[error("Provider {provider} failed: {message}")]
    Provider {
        /// Provider name.
        provider: String,
        /// Description of the failure.
        message: String,
    },

    // ========================================================================
    // Panel Input
    // ========================================================================
    /// Coordinate is not usable.
    #[error("Invalid coordinate: {message}")]
    InvalidCoordinate {
        /// Description of the problem.
        message: String,
    },

    /// Saved location name is empty.
    #[error("Invalid location name: {name:?}")]
    InvalidLocationName {
        /// The rejected name.
        name: String,
    },

    /// Saved location does not exist.
    #[error("Saved location not found: {id}")]
    LocationNotFound {
        /// The missing location ID.
        id: LocationId,
    },

    // ========================================================================
    // Persistence
    // ========================================================================
    /// Key/value store failure.
    #[error("Could not persist state: {message}")]
    Storage {
        /// What the store reported.
        message: String,
    },

    // ========================================================================
    // Wrapped
    // ========================================================================
    /// Socket or file failure.
    #[error("I/O failure: {0}")]
    Io(#[from] IoError),

    /// Malformed or unencodable JSON.
    #[error("Bad JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Frame-level WebSocket failure.
    #[error("WebSocket failure: {0}")]
    WebSocket(#[from] WsError),

    /// Outbound HTTP failure.
    #[error("HTTP failure: {0}")]
    Http(#[from] reqwest::Error),

    /// The socket task dropped a reply slot.
    #[error("Reply dropped before it arrived")]
    ChannelClosed(#[from] RecvError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// [`Error::Config`].
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// [`Error::Connection`].
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// [`Error::ConnectionTimeout`].
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// [`Error::Protocol`].
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// [`Error::RequestTimeout`].
    #[inline]
    pub fn request_timeout(request_id: RequestId, timeout_ms: u64) -> Self {
        Self::RequestTimeout {
            request_id,
            timeout_ms,
        }
    }

    /// [`Error::HostCommand`] for a failed host method.
    #[inline]
    pub fn host_command(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::HostCommand {
            method: method.into(),
            message: message.into(),
        }
    }

    /// [`Error::AlreadyAttached`].
    #[inline]
    pub fn already_attached(tab_id: TabId) -> Self {
        Self::AlreadyAttached { tab_id }
    }

    /// [`Error::TabNotFound`].
    #[inline]
    pub fn tab_not_found(tab_id: TabId) -> Self {
        Self::TabNotFound { tab_id }
    }

    /// [`Error::Provider`] attributed to `provider`.
    #[inline]
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// [`Error::InvalidCoordinate`].
    #[inline]
    pub fn invalid_coordinate(message: impl Into<String>) -> Self {
        Self::InvalidCoordinate {
            message: message.into(),
        }
    }

    /// [`Error::InvalidLocationName`].
    #[inline]
    pub fn invalid_location_name(name: impl Into<String>) -> Self {
        Self::InvalidLocationName { name: name.into() }
    }

    /// [`Error::LocationNotFound`].
    #[inline]
    pub fn location_not_found(id: LocationId) -> Self {
        Self::LocationNotFound { id }
    }

    /// [`Error::Storage`].
    #[inline]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Either side of the bridge ran out of time.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout { .. } | Self::RequestTimeout { .. }
        )
    }

    /// The shim socket is unusable.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionTimeout { .. }
                | Self::ConnectionClosed
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if the host reported an existing instrumentation session.
    #[inline]
    #[must_use]
    pub fn is_already_attached(&self) -> bool {
        matches!(self, Self::AlreadyAttached { .. })
    }

    /// The panel rejected user input.
    #[inline]
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidCoordinate { .. }
                | Self::InvalidLocationName { .. }
                | Self::LocationNotFound { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
