//! Coordinator handle and shared state.
//!
//! The [`Coordinator`] owns the spoof state and drives the attach, override
//! and detach protocol against the host. Operations are split across
//! sibling modules by concern:
//!
//! | Module | Operations |
//! |--------|------------|
//! | `attach` | attach-and-override, apply to active tabs |
//! | `detach` | detach-all |
//! | `commands` | control panel commands |
//! | `lifecycle` | startup and host events |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::geo::Coordinate;
use crate::host::{Instrumentation, TabHost};
use crate::provider::{FallbackChain, IpLocator, TimezoneLookup};
use crate::store::KeyValueStore;

use super::builder::CoordinatorBuilder;
use super::options::CoordinatorOptions;
use super::pending::PendingAttachSet;
use super::persist::Persister;
use super::state::SpoofState;

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for the coordinator.
pub(crate) struct CoordinatorInner {
    /// Debugger API.
    pub instrumentation: Arc<dyn Instrumentation>,

    /// Tabs API.
    pub tabs: Arc<dyn TabHost>,

    /// Store the state is loaded from at startup.
    pub store: Arc<dyn KeyValueStore>,

    /// IP positioning providers.
    pub ip_locators: FallbackChain<dyn IpLocator>,

    /// Timezone providers.
    pub timezones: FallbackChain<dyn TimezoneLookup>,

    /// Tuning options.
    pub options: CoordinatorOptions,

    /// Control panel URL opened on first install.
    pub panel_url: Option<String>,

    /// Current state. Never held across an await.
    pub state: Mutex<SpoofState>,

    /// Tabs with an attach sequence in flight.
    pub pending: PendingAttachSet,

    /// Background state writer.
    pub persister: Persister,

    /// Bumped by every coordinate change request; the latest one wins.
    pub location_generation: AtomicU64,
}

// ============================================================================
// Coordinator
// ============================================================================

/// Location override coordinator.
///
/// Cheap to clone; clones share state.
///
/// # Example
///
/// ```ignore
/// let coordinator = Coordinator::builder()
///     .host(host.clone())
///     .store(store)
///     .default_providers()
///     .build()?;
///
/// coordinator.startup().await;
/// coordinator.set_spoofing(true).await;
/// ```
#[derive(Clone)]
pub struct Coordinator {
    /// Shared inner state.
    pub(crate) inner: Arc<CoordinatorInner>,
}

// ============================================================================
// Coordinator - Display
// ============================================================================

impl fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coordinator")
            .field("state", &*self.inner.state.lock())
            .field("pending", &self.inner.pending.len())
            .field("ip_locators", &self.inner.ip_locators)
            .field("timezones", &self.inner.timezones)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Coordinator - Public API
// ============================================================================

impl Coordinator {
    /// Creates a configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> CoordinatorBuilder {
        CoordinatorBuilder::new()
    }

    /// Returns a copy of the current state.
    #[must_use]
    pub fn state(&self) -> SpoofState {
        self.inner.state.lock().clone()
    }

    /// Returns the options in use.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &CoordinatorOptions {
        &self.inner.options
    }

    /// Returns the number of tabs with an attach sequence in flight.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.pending.len()
    }

    /// Waits until every state change so far has been persisted.
    pub async fn flush(&self) {
        self.inner.persister.flush().await;
    }
}

// ============================================================================
// Coordinator - Internal
// ============================================================================

impl Coordinator {
    pub(crate) fn from_inner(inner: CoordinatorInner) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Mutates state and queues a snapshot for persistence.
    ///
    /// The snapshot is queued under the lock so writes follow mutation order.
    pub(crate) fn update_state<R>(&self, update: impl FnOnce(&mut SpoofState) -> R) -> R {
        let mut state = self.inner.state.lock();
        let result = update(&mut state);
        self.inner.persister.save(state.clone());
        result
    }

    /// Takes a ticket for a coordinate change.
    pub(crate) fn next_location_generation(&self) -> u64 {
        self.inner.location_generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Stores `coordinate` if no newer change was requested since `generation`.
    ///
    /// Returns `true` if stored.
    pub(crate) fn store_coordinate_if_current(&self, generation: u64, coordinate: Coordinate) -> bool {
        let mut state = self.inner.state.lock();
        if self.inner.location_generation.load(Ordering::SeqCst) != generation {
            return false;
        }

        state.coordinate = Some(coordinate);
        self.inner.persister.save(state.clone());
        true
    }

    /// Returns `true` if spoofing is enabled.
    pub(crate) fn spoofing_enabled(&self) -> bool {
        self.inner.state.lock().spoofing_enabled
    }
}
