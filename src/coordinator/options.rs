//! Coordinator tuning options.
//!
//! # Example
//!
//! ```ignore
//! use geoveil::CoordinatorOptions;
//!
//! let options = CoordinatorOptions::new()
//!     .with_accuracy(50.0)
//!     .with_restricted_prefix("https://intranet.");
//!
//! options.validate()?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::{Error, Result};
use crate::geo::NULL_ISLAND_EPSILON;
use crate::host::PROTOCOL_VERSION;
use crate::provider::DEFAULT_TIMEOUT;

// ============================================================================
// Constants
// ============================================================================

/// Reported position accuracy in meters.
pub const DEFAULT_ACCURACY: f64 = 20.0;

/// URL prefixes of pages the host refuses to instrument.
pub const DEFAULT_RESTRICTED_PREFIXES: &[&str] = &[
    "chrome://",
    "chrome-extension://",
    "moz-extension://",
    "edge://",
    "about:",
    "view-source:",
    "devtools://",
];

// ============================================================================
// CoordinatorOptions
// ============================================================================

/// Coordinator configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatorOptions {
    /// Accuracy sent with every geolocation override, in meters.
    pub accuracy: f64,

    /// DevTools protocol version requested on attach.
    pub protocol_version: String,

    /// Radius around (0, 0) treated as "no location".
    pub null_island_epsilon: f64,

    /// Tabs whose URL starts with any of these are never instrumented.
    pub restricted_prefixes: Vec<String>,

    /// Per-request timeout for lookup providers.
    pub http_timeout: Duration,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl CoordinatorOptions {
    /// Creates options with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            accuracy: DEFAULT_ACCURACY,
            protocol_version: PROTOCOL_VERSION.to_string(),
            null_island_epsilon: NULL_ISLAND_EPSILON,
            restricted_prefixes: DEFAULT_RESTRICTED_PREFIXES
                .iter()
                .map(|prefix| (*prefix).to_string())
                .collect(),
            http_timeout: DEFAULT_TIMEOUT,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl CoordinatorOptions {
    /// Sets the override accuracy in meters.
    #[inline]
    #[must_use]
    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = accuracy;
        self
    }

    /// Sets the DevTools protocol version.
    #[inline]
    #[must_use]
    pub fn with_protocol_version(mut self, version: impl Into<String>) -> Self {
        self.protocol_version = version.into();
        self
    }

    /// Sets the null island radius.
    #[inline]
    #[must_use]
    pub fn with_null_island_epsilon(mut self, epsilon: f64) -> Self {
        self.null_island_epsilon = epsilon;
        self
    }

    /// Adds a restricted URL prefix.
    #[inline]
    #[must_use]
    pub fn with_restricted_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.restricted_prefixes.push(prefix.into());
        self
    }

    /// Replaces all restricted URL prefixes.
    #[must_use]
    pub fn with_restricted_prefixes(
        mut self,
        prefixes: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.restricted_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the provider request timeout.
    #[inline]
    #[must_use]
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl CoordinatorOptions {
    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if !self.accuracy.is_finite() || self.accuracy <= 0.0 {
            return Err(Error::config(format!(
                "Accuracy must be a positive number of meters, got {}",
                self.accuracy
            )));
        }

        if self.protocol_version.trim().is_empty() {
            return Err(Error::config("Protocol version must not be empty"));
        }

        if !self.null_island_epsilon.is_finite() || self.null_island_epsilon < 0.0 {
            return Err(Error::config(format!(
                "Null island epsilon must be a non-negative number, got {}",
                self.null_island_epsilon
            )));
        }

        if self.restricted_prefixes.iter().any(|prefix| prefix.is_empty()) {
            return Err(Error::config(
                "Restricted prefixes must not be empty: an empty prefix blocks every tab",
            ));
        }

        if self.http_timeout.is_zero() {
            return Err(Error::config("HTTP timeout must be greater than zero"));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = CoordinatorOptions::new();
        assert_eq!(options.accuracy, 20.0);
        assert_eq!(options.protocol_version, "1.3");
        assert_eq!(options.null_island_epsilon, 1e-4);
        assert_eq!(options.http_timeout, Duration::from_secs(10));
        assert!(options.restricted_prefixes.contains(&"chrome://".to_string()));
        assert_eq!(options, CoordinatorOptions::default());
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_builder_chain() {
        let options = CoordinatorOptions::new()
            .with_accuracy(1.0)
            .with_protocol_version("1.2")
            .with_restricted_prefix("file://")
            .with_http_timeout(Duration::from_secs(3));

        assert_eq!(options.accuracy, 1.0);
        assert_eq!(options.protocol_version, "1.2");
        assert_eq!(options.restricted_prefixes.last().map(String::as_str), Some("file://"));
        assert_eq!(options.http_timeout.as_secs(), 3);
    }

    #[test]
    fn test_replace_prefixes() {
        let options = CoordinatorOptions::new().with_restricted_prefixes(["about:"]);
        assert_eq!(options.restricted_prefixes, vec!["about:".to_string()]);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(CoordinatorOptions::new().with_accuracy(0.0).validate().is_err());
        assert!(CoordinatorOptions::new().with_accuracy(f64::NAN).validate().is_err());
        assert!(
            CoordinatorOptions::new()
                .with_protocol_version(" ")
                .validate()
                .is_err()
        );
        assert!(
            CoordinatorOptions::new()
                .with_null_island_epsilon(-1.0)
                .validate()
                .is_err()
        );
        assert!(
            CoordinatorOptions::new()
                .with_restricted_prefix("")
                .validate()
                .is_err()
        );
        assert!(
            CoordinatorOptions::new()
                .with_http_timeout(Duration::ZERO)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_validation_error_is_config() {
        let err = CoordinatorOptions::new()
            .with_accuracy(-5.0)
            .validate()
            .expect_err("invalid");
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().contains("Accuracy"));
    }
}
