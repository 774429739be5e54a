//! Detach-all.
//!
//! Every attached target gets, in order: clear geolocation override, reset
//! timezone, detach. Each step runs whether or not the previous one
//! succeeded, and errors are only logged. Targets are handled concurrently.

// ============================================================================
// Imports
// ============================================================================

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use crate::host::{DebugTarget, Instrumentation};
use crate::protocol::DevToolsCommand;

use super::core::Coordinator;

// ============================================================================
// Coordinator - Detach
// ============================================================================

impl Coordinator {
    /// Clears overrides on every attached target and detaches.
    ///
    /// Returns the number of targets processed.
    pub async fn detach_all(&self) -> usize {
        let instrumentation = self.inner.instrumentation.as_ref();

        let targets = match instrumentation.targets().await {
            Ok(targets) => targets,
            Err(e) => {
                warn!(error = %e, "Failed to list debugger targets");
                return 0;
            }
        };

        let attached: Vec<DebugTarget> = targets
            .into_iter()
            .filter(|target| target.attached)
            .map(|target| DebugTarget::target(target.id))
            .collect();

        let count = attached.len();
        join_all(
            attached
                .iter()
                .map(|target| release_target(instrumentation, target)),
        )
        .await;

        info!(count, "Detached from all targets");
        count
    }
}

/// Clears, resets and detaches one target.
async fn release_target(instrumentation: &dyn Instrumentation, target: &DebugTarget) {
    if let Err(e) = instrumentation
        .send_command(target, DevToolsCommand::ClearGeolocationOverride)
        .await
    {
        debug!(%target, error = %e, "Clear geolocation override failed");
    }

    if let Err(e) = instrumentation
        .send_command(target, DevToolsCommand::reset_timezone())
        .await
    {
        debug!(%target, error = %e, "Timezone reset failed");
    }

    if let Err(e) = instrumentation.detach(target).await {
        debug!(%target, error = %e, "Detach failed");
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::coordinator::testing::Fixture;
    use crate::host::{HostCall, RecordingHost};
    use crate::identifiers::TabId;

    fn target_of(tab: TabId) -> DebugTarget {
        DebugTarget::target(RecordingHost::target_id_for(tab))
    }

    fn calls_for(calls: &[HostCall], target: &DebugTarget) -> Vec<HostCall> {
        calls
            .iter()
            .filter(|call| match call {
                HostCall::Command(t, _) | HostCall::Detach(t) => t == target,
                _ => false,
            })
            .cloned()
            .collect()
    }

    #[tokio::test]
    async fn test_two_tabs_cleared_then_detached() {
        let fixture = Fixture::new();
        let first = fixture.host.add_tab(1, "https://a.example");
        let second = fixture.host.add_tab(2, "https://b.example");
        fixture.host.add_tab(3, "https://c.example");
        fixture.host.mark_attached(first);
        fixture.host.mark_attached(second);

        let count = fixture.coordinator.detach_all().await;

        assert_eq!(count, 2);
        let calls = fixture.host.calls();
        for tab in [first, second] {
            let target = target_of(tab);
            assert_eq!(
                calls_for(&calls, &target),
                vec![
                    HostCall::Command(target.clone(), DevToolsCommand::ClearGeolocationOverride),
                    HostCall::Command(target.clone(), DevToolsCommand::reset_timezone()),
                    HostCall::Detach(target.clone()),
                ]
            );
        }
        assert!(fixture.host.attached_tabs().is_empty());
        assert_eq!(fixture.coordinator.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_detach() {
        let fixture = Fixture::new();
        let tab = fixture.host.add_tab(1, "https://a.example");
        fixture.host.mark_attached(tab);
        fixture.host.fail_method("Emulation.clearGeolocationOverride");
        fixture.host.fail_method("Emulation.setTimezoneOverride");

        assert_eq!(fixture.coordinator.detach_all().await, 1);
        assert!(fixture.host.attached_tabs().is_empty());
    }

    #[tokio::test]
    async fn test_nothing_attached() {
        let fixture = Fixture::new();
        fixture.host.add_tab(1, "https://a.example");

        assert_eq!(fixture.coordinator.detach_all().await, 0);
        assert_eq!(fixture.host.calls(), vec![HostCall::Targets]);
    }
}
