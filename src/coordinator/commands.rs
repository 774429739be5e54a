//! Control panel commands.
//!
//! | Message | Operation | Reply |
//! |---------|-----------|-------|
//! | `SET_LOCATION` | [`Coordinator::set_location`] | `updating`, immediately |
//! | `TOGGLE_SPOOFING` | [`Coordinator::set_spoofing`] | `spoofing` |
//! | `TOGGLE_IP_SYNC` | [`Coordinator::set_ip_sync`] | `synced`, `syncStopped`, `syncFailed` |
//! | `GET_STATUS` | [`Coordinator::status`] | `status` |
//!
//! Location changes race: each request takes a generation ticket, and a
//! result is only stored if no newer request was made in the meantime.

// ============================================================================
// Imports
// ============================================================================

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::geo::Coordinate;
use crate::protocol::{ControlMessage, ControlReply, IpSyncOutcome, StatusReport};

use super::core::Coordinator;

// ============================================================================
// Coordinator - Commands
// ============================================================================

impl Coordinator {
    /// Dispatches one control panel message.
    pub async fn handle_message(&self, message: ControlMessage) -> ControlReply {
        debug!(kind = message.kind(), "Control message");

        match message {
            ControlMessage::SetLocation(coordinate) => {
                // Reply without waiting for the timezone lookup.
                drop(self.set_location(coordinate));
                ControlReply::Updating
            }
            ControlMessage::ToggleSpoofing { active } => ControlReply::Spoofing {
                active: self.set_spoofing(active).await,
            },
            ControlMessage::ToggleIpSync { active } => self.set_ip_sync(active).await.into(),
            ControlMessage::GetStatus => ControlReply::Status(self.status()),
        }
    }

    /// Replaces the coordinate.
    ///
    /// The timezone is resolved in a background task; any timezone on
    /// `coordinate` is discarded. When every timezone provider fails the
    /// coordinate is stored without one. If spoofing is enabled the new
    /// coordinate is applied to the active tabs.
    ///
    /// The task yields `true` if its coordinate was stored, `false` if a newer
    /// change superseded it.
    pub fn set_location(&self, coordinate: Coordinate) -> JoinHandle<bool> {
        let generation = self.next_location_generation();
        let coordinator = self.clone();

        debug!(generation, %coordinate, "Location change requested");

        tokio::spawn(async move {
            let coordinate = coordinator
                .with_resolved_timezone(coordinate.without_timezone())
                .await;
            if !coordinator.store_coordinate_if_current(generation, coordinate.clone()) {
                debug!(generation, "Location change superseded");
                return false;
            }

            info!(%coordinate, "Location updated");

            if coordinator.spoofing_enabled() {
                coordinator.apply_to_active_tabs().await;
            }
            true
        })
    }

    /// Enables or disables spoofing.
    ///
    /// Enabling applies the override to the active tabs. Disabling clears
    /// overrides and detaches from every attached target. Returns the new
    /// state.
    pub async fn set_spoofing(&self, active: bool) -> bool {
        self.update_state(|state| state.spoofing_enabled = active);
        info!(active, "Spoofing toggled");

        if active {
            self.apply_to_active_tabs().await;
        } else {
            self.detach_all().await;
        }
        active
    }

    /// Enables or disables IP based positioning.
    ///
    /// Enabling runs the IP provider chain once. A result without timezone
    /// gets one from the timezone chain. The result then replaces the
    /// coordinate, unless a newer location change was made while the lookup
    /// ran, and is applied if spoofing is enabled. A superseded sync reports
    /// the coordinate the newer change stored.
    pub async fn set_ip_sync(&self, active: bool) -> IpSyncOutcome {
        self.update_state(|state| state.ip_sync_enabled = active);
        info!(active, "IP sync toggled");

        if !active {
            return IpSyncOutcome::Stopped;
        }

        let generation = self.next_location_generation();
        let Some(coordinate) = self
            .inner
            .ip_locators
            .first_success("ip location", |provider| provider.locate())
            .await
        else {
            return IpSyncOutcome::Failed;
        };

        let coordinate = if coordinate.timezone_id.as_deref().is_some_and(|tz| !tz.is_empty()) {
            coordinate
        } else {
            self.with_resolved_timezone(coordinate.without_timezone())
                .await
        };

        if !self.store_coordinate_if_current(generation, coordinate.clone()) {
            debug!(generation, "IP sync result superseded");
            // Report what the newer change stored, never the dropped result.
            return self
                .state()
                .coordinate
                .map_or(IpSyncOutcome::Failed, IpSyncOutcome::Synced);
        }

        info!(%coordinate, "Coordinate synced from IP address");
        if self.spoofing_enabled() {
            self.apply_to_active_tabs().await;
        }

        IpSyncOutcome::Synced(coordinate)
    }

    /// Returns the current state for the control panel.
    #[must_use]
    pub fn status(&self) -> StatusReport {
        self.inner.state.lock().status()
    }

    /// Looks up the timezone for `coordinate` through the provider chain.
    async fn with_resolved_timezone(&self, coordinate: Coordinate) -> Coordinate {
        let timezone = self
            .inner
            .timezones
            .first_success("timezone", |provider| provider.timezone(&coordinate))
            .await
            .filter(|timezone| !timezone.is_empty());

        if timezone.is_none() {
            warn!(%coordinate, "No timezone resolved, keeping coordinate without one");
        }

        coordinate.with_timezone_opt(timezone)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;

    use crate::coordinator::testing::{Fixture, ScriptedLocator, ScriptedTimezone, paris, tokyo};
    use crate::host::{DebugTarget, HostCall, RecordingHost};
    use crate::protocol::DevToolsCommand;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_set_location_resolves_timezone_and_applies() {
        let timezones = ScriptedTimezone::new("tz", Some("Europe/Paris"));
        let fixture = Fixture::configured(MemoryStore::new(), |builder| {
            builder.timezone_lookup(timezones.clone())
        });
        let tab = fixture.host.add_active_tab(1, "https://example.com");
        fixture.enable_spoofing();

        let stored = fixture
            .coordinator
            .set_location(Coordinate::new(48.8566, 2.3522))
            .await
            .expect("task");

        assert!(stored);
        assert_eq!(fixture.coordinator.state().coordinate, Some(paris()));
        let commands = fixture.host.commands_for_tab(tab);
        assert_eq!(
            &commands[2..],
            &[
                DevToolsCommand::set_geolocation(48.8566, 2.3522, 20.0),
                DevToolsCommand::set_timezone("Europe/Paris"),
            ]
        );

        fixture.coordinator.flush().await;
        assert_eq!(
            fixture.store.snapshot("coords"),
            Some(json!({ "lat": 48.8566, "long": 2.3522, "timezoneId": "Europe/Paris" }))
        );
    }

    #[tokio::test]
    async fn test_set_location_without_timezone_provider() {
        let fixture = Fixture::configured(MemoryStore::new(), |builder| {
            builder.timezone_lookup(ScriptedTimezone::new("tz", None))
        });

        let stale = Coordinate::new(1.5, 1.5).with_timezone("Asia/Tokyo");
        assert!(fixture.coordinator.set_location(stale).await.expect("task"));

        assert_eq!(
            fixture.coordinator.state().coordinate,
            Some(Coordinate::new(1.5, 1.5))
        );
    }

    #[tokio::test]
    async fn test_set_location_while_disabled_does_not_attach() {
        let fixture = Fixture::new();
        fixture.host.add_active_tab(1, "https://example.com");

        assert!(fixture.coordinator.set_location(tokyo()).await.expect("task"));

        assert!(
            !fixture
                .host
                .calls()
                .iter()
                .any(|call| matches!(call, HostCall::Attach(_)))
        );
    }

    #[tokio::test]
    async fn test_last_location_wins() {
        let slow = ScriptedTimezone::slow_at(
            "tz",
            "Asia/Tokyo",
            tokyo().latitude,
            Duration::from_millis(100),
        );
        let fixture = Fixture::configured(MemoryStore::new(), |builder| {
            builder.timezone_lookup(slow.clone())
        });

        let first = fixture.coordinator.set_location(tokyo());
        let second = fixture.coordinator.set_location(Coordinate::new(48.8566, 2.3522));

        assert!(second.await.expect("task"));
        assert!(!first.await.expect("task"));

        let coordinate = fixture.coordinator.state().coordinate.expect("coordinate");
        assert_eq!(coordinate.latitude, 48.8566);
        assert_eq!(slow.calls(), 2);
    }

    #[tokio::test]
    async fn test_ip_sync_superseded_reports_stored_coordinate() {
        let slow = ScriptedTimezone::slow_at(
            "tz",
            "Asia/Tokyo",
            tokyo().latitude,
            Duration::from_millis(100),
        );
        let fixture = Fixture::configured(MemoryStore::new(), |builder| {
            builder
                .ip_locator(ScriptedLocator::new("primary", Some(tokyo())))
                .timezone_lookup(slow.clone())
        });

        let coordinator = fixture.coordinator.clone();
        let sync = tokio::spawn(async move { coordinator.set_ip_sync(true).await });
        tokio::time::sleep(Duration::from_millis(20)).await;

        let newer = fixture.coordinator.set_location(Coordinate::new(48.8566, 2.3522));
        assert!(newer.await.expect("task"));

        let stored = fixture.coordinator.state().coordinate.expect("coordinate");
        assert_eq!(stored.latitude, 48.8566);
        assert_eq!(sync.await.expect("task"), IpSyncOutcome::Synced(stored));
    }

    #[tokio::test]
    async fn test_set_spoofing_on_then_off() {
        let fixture = Fixture::new();
        let tab = fixture.host.add_active_tab(1, "https://example.com");

        assert!(fixture.coordinator.set_spoofing(true).await);
        assert_eq!(fixture.host.attached_tabs(), vec![tab]);
        assert!(fixture.coordinator.state().spoofing_enabled);

        assert!(!fixture.coordinator.set_spoofing(false).await);
        assert!(fixture.host.attached_tabs().is_empty());

        let target = DebugTarget::target(RecordingHost::target_id_for(tab));
        let calls = fixture.host.calls();
        let clear = calls
            .iter()
            .position(|call| {
                *call == HostCall::Command(target.clone(), DevToolsCommand::ClearGeolocationOverride)
            })
            .expect("clear sent");
        let detach = calls
            .iter()
            .position(|call| *call == HostCall::Detach(target.clone()))
            .expect("detach sent");
        assert!(clear < detach);

        fixture.coordinator.flush().await;
        assert_eq!(fixture.store.snapshot("active"), Some(json!(false)));
    }

    #[tokio::test]
    async fn test_ip_sync_falls_back_to_second_provider() {
        let primary = ScriptedLocator::new("primary", None);
        let secondary = ScriptedLocator::new("secondary", Some(tokyo().with_timezone("Asia/Tokyo")));
        let fixture = Fixture::configured(MemoryStore::new(), |builder| {
            builder
                .ip_locator(primary.clone())
                .ip_locator(secondary.clone())
        });

        let outcome = fixture.coordinator.set_ip_sync(true).await;

        assert_eq!(
            outcome,
            IpSyncOutcome::Synced(tokyo().with_timezone("Asia/Tokyo"))
        );
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 1);
        let state = fixture.coordinator.state();
        assert!(state.ip_sync_enabled);
        assert_eq!(state.coordinate, Some(tokyo().with_timezone("Asia/Tokyo")));
    }

    #[tokio::test]
    async fn test_ip_sync_resolves_missing_timezone() {
        let timezones = ScriptedTimezone::new("tz", Some("Asia/Tokyo"));
        let fixture = Fixture::configured(MemoryStore::new(), |builder| {
            builder
                .ip_locator(ScriptedLocator::new("primary", Some(tokyo())))
                .timezone_lookup(timezones.clone())
        });

        let outcome = fixture.coordinator.set_ip_sync(true).await;

        assert_eq!(
            outcome,
            IpSyncOutcome::Synced(tokyo().with_timezone("Asia/Tokyo"))
        );
        assert_eq!(timezones.calls(), 1);
    }

    #[tokio::test]
    async fn test_ip_sync_all_providers_fail() {
        let fixture = Fixture::configured(MemoryStore::new(), |builder| {
            builder
                .ip_locator(ScriptedLocator::new("primary", None))
                .ip_locator(ScriptedLocator::new("secondary", None))
        });

        let outcome = fixture.coordinator.set_ip_sync(true).await;

        assert_eq!(outcome, IpSyncOutcome::Failed);
        let state = fixture.coordinator.state();
        assert!(state.ip_sync_enabled);
        assert_eq!(state.coordinate, Some(Coordinate::DEFAULT));
    }

    #[tokio::test]
    async fn test_ip_sync_off_does_not_look_up() {
        let locator = ScriptedLocator::new("primary", Some(tokyo()));
        let fixture = Fixture::configured(MemoryStore::new(), |builder| {
            builder.ip_locator(locator.clone())
        });

        assert_eq!(fixture.coordinator.set_ip_sync(false).await, IpSyncOutcome::Stopped);
        assert_eq!(locator.calls(), 0);
    }

    #[tokio::test]
    async fn test_ip_sync_applies_when_spoofing() {
        let fixture = Fixture::configured(MemoryStore::new(), |builder| {
            builder.ip_locator(ScriptedLocator::new("primary", Some(tokyo())))
        });
        let tab = fixture.host.add_active_tab(1, "https://example.com");
        fixture.enable_spoofing();

        fixture.coordinator.set_ip_sync(true).await;

        assert!(
            fixture
                .host
                .commands_for_tab(tab)
                .contains(&DevToolsCommand::set_geolocation(35.6895, 139.6917, 20.0))
        );
    }

    #[tokio::test]
    async fn test_handle_message_replies() {
        let fixture = Fixture::new();

        assert_eq!(
            fixture
                .coordinator
                .handle_message(ControlMessage::SetLocation(tokyo()))
                .await,
            ControlReply::Updating
        );
        assert_eq!(
            fixture
                .coordinator
                .handle_message(ControlMessage::ToggleSpoofing { active: false })
                .await,
            ControlReply::Spoofing { active: false }
        );
        assert_eq!(
            fixture
                .coordinator
                .handle_message(ControlMessage::ToggleIpSync { active: false })
                .await,
            ControlReply::SyncStopped
        );

        match fixture
            .coordinator
            .handle_message(ControlMessage::GetStatus)
            .await
        {
            ControlReply::Status(status) => {
                assert!(!status.active);
                assert!(!status.ip_sync);
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }
}
