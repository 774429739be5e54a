//! Remote lookup providers.
//!
//! Positions and timezones come from public web services. Each service is a
//! provider behind a small trait; a [`FallbackChain`] tries providers in
//! order and returns the first answer.
//!
//! | Trait | Default chain |
//! |-------|---------------|
//! | [`IpLocator`] | [`IpWhoIs`] → [`FreeIpApi`] |
//! | [`TimezoneLookup`] | [`TimeApiIo`] → [`WhereTheIss`] |
//! | [`Geocoder`] | [`Nominatim`] |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use tracing::{debug, warn};

use crate::error::Result;

// ============================================================================
// Submodules
// ============================================================================

/// Address search.
pub mod geocode;

/// Shared HTTP client and JSON fetch.
pub mod http;

/// IP based positioning.
pub mod ip;

/// Timezone lookup by coordinate.
pub mod timezone;

// ============================================================================
// Re-exports
// ============================================================================

pub use geocode::{GeocodeResult, Geocoder, Nominatim};
pub use http::{DEFAULT_TIMEOUT, http_client};
pub use ip::{FreeIpApi, IpLocator, IpWhoIs};
pub use timezone::{TimeApiIo, TimezoneLookup, WhereTheIss};

// ============================================================================
// Provider
// ============================================================================

/// Common provider surface.
pub trait Provider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;
}

// ============================================================================
// FallbackChain
// ============================================================================

/// Ordered providers, first success wins.
///
/// Every failure is logged with the provider name. When all providers fail
/// the chain answers `None`.
pub struct FallbackChain<P: ?Sized> {
    providers: Vec<Arc<P>>,
}

impl<P: ?Sized> Default for FallbackChain<P> {
    fn default() -> Self {
        Self {
            providers: Vec::new(),
        }
    }
}

impl<P: ?Sized> Clone for FallbackChain<P> {
    fn clone(&self) -> Self {
        Self {
            providers: self.providers.clone(),
        }
    }
}

impl<P: Provider + ?Sized> fmt::Debug for FallbackChain<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.providers.iter().map(|provider| provider.name()))
            .finish()
    }
}

impl<P: Provider + ?Sized> FallbackChain<P> {
    /// Creates an empty chain.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a provider.
    #[must_use]
    pub fn with(mut self, provider: Arc<P>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Appends a provider in place.
    pub fn push(&mut self, provider: Arc<P>) {
        self.providers.push(provider);
    }

    /// Returns the number of providers.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns `true` if the chain has no providers.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Returns provider names in order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|provider| provider.name()).collect()
    }

    /// Calls providers in order until one succeeds.
    ///
    /// `what` names the lookup in log messages.
    pub async fn first_success<'a, T, F>(&'a self, what: &str, mut call: F) -> Option<T>
    where
        F: FnMut(&'a P) -> BoxFuture<'a, Result<T>>,
    {
        for provider in &self.providers {
            match call(provider.as_ref()).await {
                Ok(value) => {
                    debug!(provider = provider.name(), what, "Lookup succeeded");
                    return Some(value);
                }
                Err(e) => {
                    warn!(provider = provider.name(), what, error = %e, "Lookup failed, trying next provider");
                }
            }
        }

        warn!(what, providers = self.providers.len(), "All providers failed");
        None
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::error::Error;
    use crate::geo::Coordinate;

    struct Scripted {
        name: &'static str,
        answer: Option<Coordinate>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(name: &'static str, answer: Option<Coordinate>) -> Arc<Self> {
            Arc::new(Self {
                name,
                answer,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl Provider for Scripted {
        fn name(&self) -> &str {
            self.name
        }
    }

    #[async_trait]
    impl IpLocator for Scripted {
        async fn locate(&self) -> Result<Coordinate> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer
                .clone()
                .ok_or_else(|| Error::provider(self.name, "malformed response"))
        }
    }

    #[tokio::test]
    async fn test_secondary_used_when_primary_fails() {
        let primary = Scripted::new("primary", None);
        let secondary = Scripted::new("secondary", Some(Coordinate::new(52.52, 13.405)));

        let chain = FallbackChain::<dyn IpLocator>::new()
            .with(primary.clone())
            .with(secondary.clone());

        let found = chain.first_success("ip location", |p| p.locate()).await;

        assert_eq!(found, Some(Coordinate::new(52.52, 13.405)));
        assert_eq!(primary.calls.load(Ordering::SeqCst), 1);
        assert_eq!(secondary.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stops_at_first_success() {
        let primary = Scripted::new("primary", Some(Coordinate::new(1.0, 2.0)));
        let secondary = Scripted::new("secondary", Some(Coordinate::new(3.0, 4.0)));

        let chain = FallbackChain::<dyn IpLocator>::new()
            .with(primary)
            .with(secondary.clone());

        let found = chain.first_success("ip location", |p| p.locate()).await;

        assert_eq!(found, Some(Coordinate::new(1.0, 2.0)));
        assert_eq!(secondary.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_all_failures_yield_none() {
        let chain = FallbackChain::<dyn IpLocator>::new()
            .with(Scripted::new("a", None))
            .with(Scripted::new("b", None));

        assert!(chain.first_success("ip location", |p| p.locate()).await.is_none());
        assert_eq!(chain.names(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_empty_chain_yields_none() {
        let chain = FallbackChain::<dyn IpLocator>::new();
        assert!(chain.is_empty());
        assert!(chain.first_success("ip location", |p| p.locate()).await.is_none());
    }
}
