//! Builder pattern for coordinator configuration.
//!
//! # Example
//!
//! ```ignore
//! use geoveil::{Coordinator, MemoryStore, RecordingHost};
//!
//! let host = Arc::new(RecordingHost::new());
//! let coordinator = Coordinator::builder()
//!     .host(host)
//!     .store(Arc::new(MemoryStore::new()))
//!     .build()?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use parking_lot::Mutex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::host::{Instrumentation, TabHost};
use crate::provider::{
    FallbackChain, FreeIpApi, IpLocator, IpWhoIs, TimeApiIo, TimezoneLookup, WhereTheIss,
    http_client,
};
use crate::store::KeyValueStore;

use super::core::{Coordinator, CoordinatorInner};
use super::options::CoordinatorOptions;
use super::pending::PendingAttachSet;
use super::persist::Persister;
use super::state::SpoofState;

// ============================================================================
// CoordinatorBuilder
// ============================================================================

/// Builder for a [`Coordinator`].
///
/// Use [`Coordinator::builder()`] to create one.
#[derive(Default)]
pub struct CoordinatorBuilder {
    instrumentation: Option<Arc<dyn Instrumentation>>,
    tabs: Option<Arc<dyn TabHost>>,
    store: Option<Arc<dyn KeyValueStore>>,
    ip_locators: FallbackChain<dyn IpLocator>,
    timezones: FallbackChain<dyn TimezoneLookup>,
    default_providers: bool,
    options: CoordinatorOptions,
    panel_url: Option<String>,
}

impl fmt::Debug for CoordinatorBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoordinatorBuilder")
            .field("instrumentation", &self.instrumentation.is_some())
            .field("tabs", &self.tabs.is_some())
            .field("store", &self.store.is_some())
            .field("ip_locators", &self.ip_locators)
            .field("timezones", &self.timezones)
            .field("default_providers", &self.default_providers)
            .field("options", &self.options)
            .field("panel_url", &self.panel_url)
            .finish()
    }
}

// ============================================================================
// CoordinatorBuilder Implementation
// ============================================================================

impl CoordinatorBuilder {
    /// Creates an empty builder.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses one object for both the debugger and tabs APIs.
    #[must_use]
    pub fn host<H>(mut self, host: Arc<H>) -> Self
    where
        H: Instrumentation + TabHost + 'static,
    {
        let instrumentation: Arc<dyn Instrumentation> = host.clone();
        let tabs: Arc<dyn TabHost> = host;
        self.instrumentation = Some(instrumentation);
        self.tabs = Some(tabs);
        self
    }

    /// Sets the debugger API.
    #[inline]
    #[must_use]
    pub fn instrumentation(mut self, instrumentation: Arc<dyn Instrumentation>) -> Self {
        self.instrumentation = Some(instrumentation);
        self
    }

    /// Sets the tabs API.
    #[inline]
    #[must_use]
    pub fn tabs(mut self, tabs: Arc<dyn TabHost>) -> Self {
        self.tabs = Some(tabs);
        self
    }

    /// Sets the state store.
    #[inline]
    #[must_use]
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Appends an IP positioning provider.
    #[inline]
    #[must_use]
    pub fn ip_locator(mut self, locator: Arc<dyn IpLocator>) -> Self {
        self.ip_locators.push(locator);
        self
    }

    /// Appends a timezone provider.
    #[inline]
    #[must_use]
    pub fn timezone_lookup(mut self, lookup: Arc<dyn TimezoneLookup>) -> Self {
        self.timezones.push(lookup);
        self
    }

    /// Appends the public web services after any explicit providers.
    ///
    /// IP: ipwho.is, then freeipapi.com. Timezone: timeapi.io, then
    /// wheretheiss.at.
    #[inline]
    #[must_use]
    pub fn default_providers(mut self) -> Self {
        self.default_providers = true;
        self
    }

    /// Sets tuning options.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: CoordinatorOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the control panel URL opened on first install.
    #[inline]
    #[must_use]
    pub fn panel_url(mut self, url: impl Into<String>) -> Self {
        self.panel_url = Some(url.into());
        self
    }

    /// Builds the coordinator.
    ///
    /// Spawns the state writer, so it must run inside a Tokio runtime.
    /// State is not loaded until [`Coordinator::startup`].
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if a host API or the store is missing
    /// - [`Error::Config`] if options are invalid
    /// - [`Error::Http`] if the default providers' client cannot be built
    pub fn build(self) -> Result<Coordinator> {
        self.options.validate()?;

        let instrumentation = self.instrumentation.ok_or_else(|| {
            Error::config(
                "Instrumentation host is required. Use .host() or .instrumentation() to set it.",
            )
        })?;
        let tabs = self.tabs.ok_or_else(|| {
            Error::config("Tabs host is required. Use .host() or .tabs() to set it.")
        })?;
        let store = self
            .store
            .ok_or_else(|| Error::config("State store is required. Use .store() to set it."))?;

        let mut ip_locators = self.ip_locators;
        let mut timezones = self.timezones;
        if self.default_providers {
            let client = http_client(self.options.http_timeout)?;
            ip_locators.push(Arc::new(IpWhoIs::new(client.clone())));
            ip_locators.push(Arc::new(FreeIpApi::new(client.clone())));
            timezones.push(Arc::new(TimeApiIo::new(client.clone())));
            timezones.push(Arc::new(WhereTheIss::new(client)));
        }

        debug!(
            ip_locators = ?ip_locators.names(),
            timezones = ?timezones.names(),
            "Coordinator configured"
        );

        let persister = Persister::spawn(Arc::clone(&store));

        Ok(Coordinator::from_inner(CoordinatorInner {
            instrumentation,
            tabs,
            store,
            ip_locators,
            timezones,
            options: self.options,
            panel_url: self.panel_url,
            state: Mutex::new(SpoofState::default()),
            pending: PendingAttachSet::new(),
            persister,
            location_generation: AtomicU64::new(0),
        }))
    }
}

// ============================================================================
// Tests
// ============================================================================
