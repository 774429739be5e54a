//! DevTools protocol commands sent through an instrumentation session.
//!
//! Only the handful of domains needed for position and timezone overrides
//! are modelled.
//!
//! | Method | Purpose |
//! |--------|---------|
//! | `Browser.grantPermissions` | Pre-grant geolocation |
//! | `Page.enable` | Page domain for early override |
//! | `Emulation.setGeolocationOverride` | Spoof position |
//! | `Emulation.clearGeolocationOverride` | Restore position |
//! | `Emulation.setTimezoneOverride` | Spoof or restore timezone |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// Permission name granted before overriding position.
pub const GEOLOCATION_PERMISSION: &str = "geolocation";

// ============================================================================
// DevToolsCommand
// ============================================================================

/// A DevTools protocol command with its parameters.
///
/// # Format
///
/// ```json
/// { "method": "Emulation.setTimezoneOverride", "params": { "timezoneId": "Europe/Paris" } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum DevToolsCommand {
    /// Grant browser permissions to the target's origin.
    #[serde(rename = "Browser.grantPermissions")]
    GrantPermissions {
        /// Permission names.
        permissions: Vec<String>,
    },

    /// Enable page domain events.
    #[serde(rename = "Page.enable")]
    PageEnable,

    /// Override the reported geolocation.
    #[serde(rename = "Emulation.setGeolocationOverride")]
    SetGeolocationOverride {
        /// Latitude in degrees.
        latitude: f64,
        /// Longitude in degrees.
        longitude: f64,
        /// Accuracy radius in meters.
        accuracy: f64,
    },

    /// Remove the geolocation override.
    #[serde(rename = "Emulation.clearGeolocationOverride")]
    ClearGeolocationOverride,

    /// Override the timezone. An empty ID restores the host default.
    #[serde(rename = "Emulation.setTimezoneOverride")]
    SetTimezoneOverride {
        /// IANA timezone identifier.
        #[serde(rename = "timezoneId")]
        timezone_id: String,
    },
}

impl DevToolsCommand {
    /// Grants the geolocation permission.
    #[inline]
    #[must_use]
    pub fn grant_geolocation() -> Self {
        Self::GrantPermissions {
            permissions: vec![GEOLOCATION_PERMISSION.to_string()],
        }
    }

    /// Overrides position.
    #[inline]
    #[must_use]
    pub fn set_geolocation(latitude: f64, longitude: f64, accuracy: f64) -> Self {
        Self::SetGeolocationOverride {
            latitude,
            longitude,
            accuracy,
        }
    }

    /// Overrides timezone.
    #[inline]
    #[must_use]
    pub fn set_timezone(timezone_id: impl Into<String>) -> Self {
        Self::SetTimezoneOverride {
            timezone_id: timezone_id.into(),
        }
    }

    /// Restores the host timezone.
    #[inline]
    #[must_use]
    pub fn reset_timezone() -> Self {
        Self::set_timezone("")
    }

    /// Returns the protocol method name.
    #[must_use]
    pub const fn method(&self) -> &'static str {
        match self {
            Self::GrantPermissions { .. } => "Browser.grantPermissions",
            Self::PageEnable => "Page.enable",
            Self::SetGeolocationOverride { .. } => "Emulation.setGeolocationOverride",
            Self::ClearGeolocationOverride => "Emulation.clearGeolocationOverride",
            Self::SetTimezoneOverride { .. } => "Emulation.setTimezoneOverride",
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
