//! Coordinator state and its persisted form.

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::Result;
use crate::geo::Coordinate;
use crate::protocol::StatusReport;
use crate::store::{self, KeyValueStore, keys};

// ============================================================================
// SpoofState
// ============================================================================

/// Everything the coordinator remembers across restarts.
#[derive(Debug, Clone, PartialEq)]
pub struct SpoofState {
    /// Overrides are applied to tabs.
    pub spoofing_enabled: bool,
    /// The coordinate follows the public IP address.
    pub ip_sync_enabled: bool,
    /// Coordinate applied to tabs.
    pub coordinate: Option<Coordinate>,
}

impl Default for SpoofState {
    fn default() -> Self {
        Self {
            spoofing_enabled: false,
            ip_sync_enabled: false,
            coordinate: Some(Coordinate::DEFAULT),
        }
    }
}

impl SpoofState {
    /// Reads state from a store.
    ///
    /// Missing keys keep their defaults. Unreadable values are logged and
    /// also fall back to defaults, so a damaged store never blocks startup.
    pub async fn load(store: &dyn KeyValueStore) -> Self {
        let defaults = Self::default();

        let spoofing_enabled = load_or(store, keys::SPOOFING, defaults.spoofing_enabled).await;
        let ip_sync_enabled = load_or(store, keys::IP_SYNC, defaults.ip_sync_enabled).await;
        let coordinate = load_or(store, keys::COORDINATE, Coordinate::DEFAULT).await;

        let state = Self {
            spoofing_enabled,
            ip_sync_enabled,
            coordinate: Some(coordinate),
        };

        debug!(
            spoofing = state.spoofing_enabled,
            ip_sync = state.ip_sync_enabled,
            coordinate = ?state.coordinate,
            "State restored"
        );

        state
    }

    /// Writes every field to a store.
    ///
    /// # Errors
    ///
    /// Returns the first store error.
    pub async fn save(&self, store: &dyn KeyValueStore) -> Result<()> {
        store::save(store, keys::SPOOFING, &self.spoofing_enabled).await?;
        store::save(store, keys::IP_SYNC, &self.ip_sync_enabled).await?;

        match &self.coordinate {
            Some(coordinate) => store::save(store, keys::COORDINATE, coordinate).await,
            None => store.set(keys::COORDINATE, Value::Null).await,
        }
    }

    /// Returns the status reported to the control panel.
    #[must_use]
    pub fn status(&self) -> StatusReport {
        StatusReport {
            active: self.spoofing_enabled,
            ip_sync: self.ip_sync_enabled,
            coordinate: self.coordinate.clone(),
        }
    }
}

/// Loads one key, keeping `default` when missing or unreadable.
async fn load_or<T>(store: &dyn KeyValueStore, key: &str, default: T) -> T
where
    T: serde::de::DeserializeOwned,
{
    match store::load::<T>(store, key).await {
        Ok(Some(value)) => value,
        Ok(None) => default,
        Err(e) => {
            warn!(key, error = %e, "Ignoring unreadable persisted value");
            default
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
