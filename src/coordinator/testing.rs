//! Test fixtures shared by coordinator tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::geo::Coordinate;
use crate::host::RecordingHost;
use crate::provider::{IpLocator, Provider, TimezoneLookup};
use crate::store::MemoryStore;

use super::builder::CoordinatorBuilder;
use super::core::Coordinator;

// ============================================================================
// Coordinates
// ============================================================================

pub fn paris() -> Coordinate {
    Coordinate::new(48.8566, 2.3522).with_timezone("Europe/Paris")
}

pub fn tokyo() -> Coordinate {
    Coordinate::new(35.6895, 139.6917)
}

// ============================================================================
// Fixture
// ============================================================================

/// Coordinator over a recording host and memory store.
pub struct Fixture {
    pub host: Arc<RecordingHost>,
    pub store: Arc<MemoryStore>,
    pub coordinator: Coordinator,
}

impl Fixture {
    /// Must be called inside a Tokio runtime.
    pub fn new() -> Self {
        Self::configured(MemoryStore::new(), |builder| builder)
    }

    pub fn with_store(store: MemoryStore) -> Self {
        Self::configured(store, |builder| builder)
    }

    pub fn configured(
        store: MemoryStore,
        configure: impl FnOnce(CoordinatorBuilder) -> CoordinatorBuilder,
    ) -> Self {
        let host = Arc::new(RecordingHost::new());
        let store = Arc::new(store);
        let builder = Coordinator::builder()
            .host(Arc::clone(&host))
            .store(store.clone());
        let coordinator = configure(builder).build().expect("build coordinator");

        Self {
            host,
            store,
            coordinator,
        }
    }

    pub fn set_coordinate(&self, coordinate: Coordinate) {
        self.coordinator.inner.state.lock().coordinate = Some(coordinate);
    }

    pub fn enable_spoofing(&self) {
        self.coordinator.inner.state.lock().spoofing_enabled = true;
    }
}

// ============================================================================
// Scripted Providers
// ============================================================================

/// IP locator with a fixed answer.
pub struct ScriptedLocator {
    name: &'static str,
    answer: Mutex<Option<Coordinate>>,
    calls: AtomicUsize,
}

impl ScriptedLocator {
    pub fn new(name: &'static str, answer: Option<Coordinate>) -> Arc<Self> {
        Arc::new(Self {
            name,
            answer: Mutex::new(answer),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Provider for ScriptedLocator {
    fn name(&self) -> &str {
        self.name
    }
}

#[async_trait]
impl IpLocator for ScriptedLocator {
    async fn locate(&self) -> Result<Coordinate> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.answer
            .lock()
            .clone()
            .ok_or_else(|| Error::provider(self.name, "scripted failure"))
    }
}

/// Timezone lookup with a fixed answer and an optional slow latitude.
pub struct ScriptedTimezone {
    name: &'static str,
    answer: Option<String>,
    slow_latitude: Option<(f64, Duration)>,
    calls: AtomicUsize,
}

impl ScriptedTimezone {
    pub fn new(name: &'static str, answer: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            name,
            answer: answer.map(str::to_string),
            slow_latitude: None,
            calls: AtomicUsize::new(0),
        })
    }

    /// Answers lookups at `latitude` only after `delay`.
    pub fn slow_at(name: &'static str, answer: &str, latitude: f64, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            name,
            answer: Some(answer.to_string()),
            slow_latitude: Some((latitude, delay)),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Provider for ScriptedTimezone {
    fn name(&self) -> &str {
        self.name
    }
}

#[async_trait]
impl TimezoneLookup for ScriptedTimezone {
    async fn timezone(&self, coordinate: &Coordinate) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some((latitude, delay)) = self.slow_latitude
            && coordinate.latitude == latitude
        {
            tokio::time::sleep(delay).await;
        }
        self.answer
            .clone()
            .ok_or_else(|| Error::provider(self.name, "scripted failure"))
    }
}
