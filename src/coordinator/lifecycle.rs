//! Startup and host event handling.
//!
//! | Trigger | Action, when spoofing is enabled |
//! |---------|----------------------------------|
//! | startup | restore state, apply to active tabs |
//! | tab activated | apply to that tab if eligible |
//! | tab updated (`loading` / `complete`) | apply to that tab if eligible |
//! | install | open the control panel (regardless of spoofing) |

// ============================================================================
// Imports
// ============================================================================

use tracing::{debug, info, trace, warn};

use crate::identifiers::TabId;
use crate::protocol::{HostEvent, InstallReason, TabStatus};

use super::attach::AttachOutcome;
use super::core::Coordinator;
use super::eligibility::is_eligible_url;
use super::state::SpoofState;

// ============================================================================
// Coordinator - Lifecycle
// ============================================================================

impl Coordinator {
    /// Restores persisted state and re-applies the override if enabled.
    ///
    /// Returns the outcome for each tab touched.
    pub async fn startup(&self) -> Vec<(TabId, AttachOutcome)> {
        let restored = SpoofState::load(self.inner.store.as_ref()).await;
        let spoofing = restored.spoofing_enabled;
        *self.inner.state.lock() = restored;

        info!(spoofing, "Coordinator started");

        if spoofing {
            self.apply_to_active_tabs().await
        } else {
            Vec::new()
        }
    }

    /// Handles a tab becoming active.
    pub async fn on_tab_activated(&self, tab_id: TabId) -> Option<AttachOutcome> {
        if !self.spoofing_enabled() {
            return None;
        }
        self.attach_if_eligible(tab_id, None).await
    }

    /// Handles a tab navigation update.
    ///
    /// Only `loading` and `complete` trigger an override. When `url` is not
    /// part of the update the tab is looked up.
    pub async fn on_tab_updated(
        &self,
        tab_id: TabId,
        status: Option<TabStatus>,
        url: Option<String>,
    ) -> Option<AttachOutcome> {
        if !self.spoofing_enabled() {
            return None;
        }
        if !status.is_some_and(|status| status.triggers_override()) {
            return None;
        }
        self.attach_if_eligible(tab_id, url).await
    }

    /// Handles the install notification.
    pub async fn on_installed(&self, reason: &InstallReason) {
        if *reason != InstallReason::Install {
            debug!(?reason, "Ignoring install event");
            return;
        }

        let Some(url) = self.inner.panel_url.as_deref() else {
            warn!("Installed, but no control panel URL is configured");
            return;
        };

        match self.inner.tabs.open(url).await {
            Ok(()) => info!(url, "Opened control panel"),
            Err(e) => warn!(url, error = %e, "Failed to open control panel"),
        }
    }

    /// Dispatches one host event.
    pub async fn handle_event(&self, event: HostEvent) {
        match event {
            HostEvent::TabActivated { tab_id } => {
                self.on_tab_activated(tab_id).await;
            }
            HostEvent::TabUpdated {
                tab_id,
                status,
                url,
            } => {
                self.on_tab_updated(tab_id, status, url).await;
            }
            HostEvent::Installed { reason } => self.on_installed(&reason).await,
            HostEvent::Message {
                message_id,
                message,
            } => {
                let reply = self.handle_message(message).await;
                debug!(%message_id, ?reply, "Control message handled without reply channel");
            }
            HostEvent::Unknown { method, .. } => trace!(method, "Ignoring unknown event"),
        }
    }

    async fn attach_if_eligible(&self, tab_id: TabId, url: Option<String>) -> Option<AttachOutcome> {
        let url = match url {
            Some(url) => Some(url),
            None => match self.inner.tabs.tab(tab_id).await {
                Ok(tab) => tab.url,
                Err(e) => {
                    debug!(%tab_id, error = %e, "Tab lookup failed");
                    return None;
                }
            },
        };

        if !is_eligible_url(url.as_deref(), &self.inner.options.restricted_prefixes) {
            trace!(%tab_id, ?url, "Tab not eligible");
            return None;
        }

        Some(self.attach_and_override(tab_id).await)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    use crate::coordinator::testing::{Fixture, paris};
    use crate::geo::Coordinate;
    use crate::host::HostCall;
    use crate::protocol::DevToolsCommand;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_startup_restores_and_reapplies() {
        let store = MemoryStore::with_entries([
            ("active", json!(true)),
            (
                "coords",
                json!({ "lat": 48.8566, "long": 2.3522, "timezoneId": "Europe/Paris" }),
            ),
        ]);
        let fixture = Fixture::with_store(store);
        let tab = fixture.host.add_active_tab(1, "https://example.com");

        let outcomes = fixture.coordinator.startup().await;

        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].1.is_applied());
        assert_eq!(fixture.coordinator.state().coordinate, Some(paris()));
        assert!(
            fixture
                .host
                .commands_for_tab(tab)
                .contains(&DevToolsCommand::set_timezone("Europe/Paris"))
        );
    }

    #[tokio::test]
    async fn test_startup_disabled_touches_nothing() {
        let fixture = Fixture::new();
        fixture.host.add_active_tab(1, "https://example.com");

        assert!(fixture.coordinator.startup().await.is_empty());
        assert!(fixture.host.calls().is_empty());
    }

    #[tokio::test]
    async fn test_tab_activated_only_when_spoofing() {
        let fixture = Fixture::new();
        let tab = fixture.host.add_active_tab(1, "https://example.com");

        assert!(fixture.coordinator.on_tab_activated(tab).await.is_none());
        assert!(fixture.host.calls().is_empty());

        fixture.enable_spoofing();
        let outcome = fixture.coordinator.on_tab_activated(tab).await;
        assert!(outcome.is_some_and(|outcome| outcome.is_applied()));
    }

    #[tokio::test]
    async fn test_tab_activated_restricted_url() {
        let fixture = Fixture::new();
        fixture.enable_spoofing();
        let tab = fixture.host.add_active_tab(1, "chrome://extensions");

        assert!(fixture.coordinator.on_tab_activated(tab).await.is_none());
        assert_eq!(fixture.host.attach_count(tab), 0);
    }

    #[tokio::test]
    async fn test_tab_updated_status_filter() {
        let fixture = Fixture::new();
        fixture.enable_spoofing();
        let tab = fixture.host.add_tab(1, "https://example.com");

        let ignored = fixture
            .coordinator
            .on_tab_updated(tab, Some(TabStatus::Other), None)
            .await;
        assert!(ignored.is_none());
        let ignored = fixture.coordinator.on_tab_updated(tab, None, None).await;
        assert!(ignored.is_none());

        let outcome = fixture
            .coordinator
            .on_tab_updated(tab, Some(TabStatus::Loading), Some("https://example.com".into()))
            .await;
        assert!(matches!(outcome, Some(AttachOutcome::Attached(_))));
        assert!(
            !fixture
                .host
                .calls()
                .iter()
                .any(|call| matches!(call, HostCall::GetTab(_)))
        );

        let outcome = fixture
            .coordinator
            .on_tab_updated(tab, Some(TabStatus::Complete), None)
            .await;
        assert!(matches!(outcome, Some(AttachOutcome::Reused(_))));
        assert!(fixture.host.calls().contains(&HostCall::GetTab(tab)));
    }

    #[tokio::test]
    async fn test_tab_updated_gone_tab() {
        let fixture = Fixture::new();
        fixture.enable_spoofing();
        let tab = fixture.host.add_tab(1, "https://example.com");
        fixture.host.close_tab(tab);

        let outcome = fixture
            .coordinator
            .on_tab_updated(tab, Some(TabStatus::Complete), None)
            .await;
        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn test_install_opens_panel() {
        let fixture = Fixture::configured(MemoryStore::new(), |builder| {
            builder.panel_url("chrome-extension://abc/dashboard.html")
        });

        fixture.coordinator.on_installed(&InstallReason::Update).await;
        assert!(fixture.host.opened_urls().is_empty());

        fixture.coordinator.on_installed(&InstallReason::Install).await;
        assert_eq!(
            fixture.host.opened_urls(),
            vec!["chrome-extension://abc/dashboard.html".to_string()]
        );
    }

    #[tokio::test]
    async fn test_install_without_panel_url() {
        let fixture = Fixture::new();
        fixture.coordinator.on_installed(&InstallReason::Install).await;
        assert!(fixture.host.opened_urls().is_empty());
    }

    #[tokio::test]
    async fn test_handle_event_dispatch() {
        let fixture = Fixture::new();
        let tab = fixture.host.add_active_tab(1, "https://example.com");
        fixture.set_coordinate(Coordinate::new(51.5074, -0.1278));
        fixture.enable_spoofing();

        fixture
            .coordinator
            .handle_event(HostEvent::TabActivated { tab_id: tab })
            .await;

        assert_eq!(fixture.host.attach_count(tab), 1);
        assert!(
            fixture
                .host
                .commands_for_tab(tab)
                .contains(&DevToolsCommand::set_geolocation(51.5074, -0.1278, 20.0))
        );
    }
}
