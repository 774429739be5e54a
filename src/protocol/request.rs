//! Host calls and their answers.
//!
//! ```json
//! → { "id": "…", "method": "tabs.get", "params": { "tabId": 4 } }
//! ← { "id": "…", "type": "success", "result": { "id": 4, "url": "…" } }
//! ← { "id": "…", "type": "error", "error": "…", "message": "No tab with id: 4." }
//! ```
//!
//! The READY frame is a success response with the nil id.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::RequestId;

use super::Command;

// ============================================================================
// Request
// ============================================================================

/// One host call.
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    /// Correlates the answer.
    pub id: RequestId,

    /// Flattened into `method` and `params`.
    #[serde(flatten)]
    pub command: Command,
}

impl Request {
    /// Wraps a command under a fresh id.
    #[inline]
    #[must_use]
    pub fn new(command: Command) -> Self {
        Self {
            id: RequestId::generate(),
            command,
        }
    }

    /// Returns the bridge method name.
    #[inline]
    #[must_use]
    pub fn method(&self) -> &'static str {
        self.command.method()
    }
}

// ============================================================================
// Response
// ============================================================================

/// The shim's answer to a host call.
#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    /// Id of the call being answered.
    pub id: RequestId,

    /// Success or failure, tagged by `type`.
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Body of a [`Response`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Outcome {
    /// The host API call returned.
    Success {
        /// Return value; `null` for calls without one.
        #[serde(default)]
        result: Value,
    },
    /// The host API call threw or reported `lastError`.
    Error {
        /// Short error code.
        #[serde(default)]
        error: Option<String>,
        /// Host error text.
        #[serde(default)]
        message: Option<String>,
    },
}

impl Response {
    /// Returns `true` if the host reported a failure.
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self.outcome, Outcome::Error { .. })
    }

    /// Returns the host error text, or the error code if there is none.
    ///
    /// Empty for success responses.
    #[must_use]
    pub fn error_message(&self) -> String {
        match &self.outcome {
            Outcome::Success { .. } => String::new(),
            Outcome::Error { error, message } => message
                .as_deref()
                .or(error.as_deref())
                .unwrap_or("unknown host error")
                .to_string(),
        }
    }

    /// Returns the result of a successful call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HostCommand`] for `method` if the host reported a
    /// failure.
    pub fn into_result(self, method: &str) -> Result<Value> {
        match self.outcome {
            Outcome::Success { result } => Ok(result),
            Outcome::Error { .. } => Err(Error::host_command(method, self.error_message())),
        }
    }

    /// Reads a string field of the result; empty when absent.
    #[must_use]
    pub fn get_string(&self, key: &str) -> String {
        match &self.outcome {
            Outcome::Success { result } => result
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            Outcome::Error { .. } => String::new(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
