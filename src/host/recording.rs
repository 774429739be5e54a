//! In-memory host that records every call.
//!
//! Used by tests and benchmarks to exercise the coordinator without a
//! browser. Each call yields to the scheduler once, so concurrent attach
//! sequences interleave the way they would against a real host.
//!
//! # Example
//!
//! ```ignore
//! let host = RecordingHost::new();
//! let tab = host.add_active_tab(1, "https://example.com");
//! host.set_attach_behavior(tab, AttachBehavior::AlreadyAttached);
//!
//! // ... drive a coordinator ...
//!
//! assert_eq!(host.commands_for_tab(tab).len(), 2);
//! ```

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::Value;
use tracing::trace;

use crate::error::{Error, Result};
use crate::identifiers::{TabId, TargetId};
use crate::protocol::DevToolsCommand;

use super::{DebugTarget, Instrumentation, TabHost, TabInfo, TargetInfo};

// ============================================================================
// Types
// ============================================================================

/// How the recording host answers an attach request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AttachBehavior {
    /// Attach succeeds unless a session already exists.
    #[default]
    Succeed,
    /// Another client holds a session: attach reports already-attached.
    AlreadyAttached,
    /// Attach fails with the given host message.
    Fail(String),
}

/// One recorded host call.
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    /// `debugger.attach`.
    Attach(TabId),
    /// `debugger.sendCommand`.
    Command(DebugTarget, DevToolsCommand),
    /// `debugger.detach`.
    Detach(DebugTarget),
    /// `debugger.getTargets`.
    Targets,
    /// `tabs.query`.
    ActiveTabs,
    /// `tabs.get`.
    GetTab(TabId),
    /// `tabs.create`.
    Open(String),
}

#[derive(Debug, Default)]
struct HostState {
    tabs: Vec<TabInfo>,
    sessions: FxHashSet<TabId>,
    behaviors: FxHashMap<TabId, AttachBehavior>,
    failing_methods: FxHashSet<&'static str>,
    calls: Vec<HostCall>,
}

// ============================================================================
// RecordingHost
// ============================================================================

/// Scriptable in-memory [`Instrumentation`] and [`TabHost`].
#[derive(Debug, Default)]
pub struct RecordingHost {
    state: Mutex<HostState>,
}

impl RecordingHost {
    /// Creates a host with no tabs.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the target ID the host reports for a tab.
    #[must_use]
    pub fn target_id_for(tab_id: TabId) -> TargetId {
        TargetId::new(format!("target-{tab_id}"))
    }
}

// ============================================================================
// RecordingHost - Setup
// ============================================================================

impl RecordingHost {
    /// Adds an inactive tab.
    ///
    /// # Panics
    ///
    /// Panics if `id` is zero.
    pub fn add_tab(&self, id: u32, url: &str) -> TabId {
        let tab_id = TabId::new(id).expect("tab id must be non-zero");
        self.state.lock().tabs.push(TabInfo::new(tab_id, url));
        tab_id
    }

    /// Adds a tab and makes it the active one.
    ///
    /// # Panics
    ///
    /// Panics if `id` is zero.
    pub fn add_active_tab(&self, id: u32, url: &str) -> TabId {
        let tab_id = self.add_tab(id, url);
        self.activate(tab_id);
        tab_id
    }

    /// Makes a tab the only active one.
    pub fn activate(&self, tab_id: TabId) {
        for tab in &mut self.state.lock().tabs {
            tab.active = tab.id == tab_id;
        }
    }

    /// Changes a tab's URL.
    pub fn navigate(&self, tab_id: TabId, url: &str) {
        let mut state = self.state.lock();
        if let Some(tab) = state.tabs.iter_mut().find(|tab| tab.id == tab_id) {
            tab.url = Some(url.to_string());
        }
    }

    /// Removes a tab and any session on it.
    pub fn close_tab(&self, tab_id: TabId) {
        let mut state = self.state.lock();
        state.tabs.retain(|tab| tab.id != tab_id);
        state.sessions.remove(&tab_id);
    }

    /// Scripts the next attach outcomes for a tab.
    pub fn set_attach_behavior(&self, tab_id: TabId, behavior: AttachBehavior) {
        self.state.lock().behaviors.insert(tab_id, behavior);
    }

    /// Marks a session as already open, as if attached earlier.
    pub fn mark_attached(&self, tab_id: TabId) {
        self.state.lock().sessions.insert(tab_id);
    }

    /// Makes every DevTools command with this method fail.
    pub fn fail_method(&self, method: &'static str) {
        self.state.lock().failing_methods.insert(method);
    }
}

// ============================================================================
// RecordingHost - Inspection
// ============================================================================

impl RecordingHost {
    /// Returns all calls in order.
    #[must_use]
    pub fn calls(&self) -> Vec<HostCall> {
        self.state.lock().calls.clone()
    }

    /// Forgets recorded calls.
    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Returns how many attach calls a tab received.
    #[must_use]
    pub fn attach_count(&self, tab_id: TabId) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| matches!(call, HostCall::Attach(id) if *id == tab_id))
            .count()
    }

    /// Returns the DevTools commands sent to a tab, by tab or target address.
    #[must_use]
    pub fn commands_for_tab(&self, tab_id: TabId) -> Vec<DevToolsCommand> {
        let target_id = Self::target_id_for(tab_id);
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                HostCall::Command(DebugTarget::Tab { tab_id: id }, command) if *id == tab_id => {
                    Some(command.clone())
                }
                HostCall::Command(DebugTarget::Target { target_id: id }, command)
                    if *id == target_id =>
                {
                    Some(command.clone())
                }
                _ => None,
            })
            .collect()
    }

    /// Returns the tabs that currently have a session.
    #[must_use]
    pub fn attached_tabs(&self) -> Vec<TabId> {
        let mut tabs: Vec<_> = self.state.lock().sessions.iter().copied().collect();
        tabs.sort();
        tabs
    }

    /// Returns URLs opened through [`TabHost::open`].
    #[must_use]
    pub fn opened_urls(&self) -> Vec<String> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                HostCall::Open(url) => Some(url.clone()),
                _ => None,
            })
            .collect()
    }
}

// ============================================================================
// RecordingHost - Internal
// ============================================================================

impl RecordingHost {
    fn record(&self, call: HostCall) {
        trace!(?call, "Host call");
        self.state.lock().calls.push(call);
    }

    fn resolve_tab(state: &HostState, target: &DebugTarget) -> Option<TabId> {
        match target {
            DebugTarget::Tab { tab_id } => Some(*tab_id),
            DebugTarget::Target { target_id } => state
                .tabs
                .iter()
                .map(|tab| tab.id)
                .chain(state.sessions.iter().copied())
                .find(|id| Self::target_id_for(*id) == *target_id),
        }
    }
}

// ============================================================================
// Instrumentation
// ============================================================================

#[async_trait]
impl Instrumentation for RecordingHost {
    async fn attach(&self, tab_id: TabId, _version: &str) -> Result<()> {
        self.record(HostCall::Attach(tab_id));
        tokio::task::yield_now().await;

        let mut state = self.state.lock();
        if !state.tabs.iter().any(|tab| tab.id == tab_id) {
            return Err(Error::host_command(
                "debugger.attach",
                format!("No tab with given id {tab_id}."),
            ));
        }

        match state.behaviors.get(&tab_id).cloned().unwrap_or_default() {
            AttachBehavior::AlreadyAttached => Err(Error::already_attached(tab_id)),
            AttachBehavior::Fail(message) => Err(Error::host_command("debugger.attach", message)),
            AttachBehavior::Succeed => {
                if state.sessions.insert(tab_id) {
                    Ok(())
                } else {
                    Err(Error::already_attached(tab_id))
                }
            }
        }
    }

    async fn send_command(&self, target: &DebugTarget, command: DevToolsCommand) -> Result<Value> {
        let method = command.method();
        self.record(HostCall::Command(target.clone(), command));
        tokio::task::yield_now().await;

        if self.state.lock().failing_methods.contains(method) {
            return Err(Error::host_command(method, "scripted failure"));
        }
        Ok(Value::Null)
    }

    async fn detach(&self, target: &DebugTarget) -> Result<()> {
        self.record(HostCall::Detach(target.clone()));
        tokio::task::yield_now().await;

        let mut state = self.state.lock();
        let tab_id = Self::resolve_tab(&state, target);
        match tab_id {
            Some(tab_id) if state.sessions.remove(&tab_id) => Ok(()),
            _ => Err(Error::host_command(
                "debugger.detach",
                format!("Debugger is not attached to {target}"),
            )),
        }
    }

    async fn targets(&self) -> Result<Vec<TargetInfo>> {
        self.record(HostCall::Targets);
        tokio::task::yield_now().await;

        let state = self.state.lock();
        Ok(state
            .tabs
            .iter()
            .map(|tab| TargetInfo {
                id: Self::target_id_for(tab.id),
                tab_id: Some(tab.id),
                url: tab.url.clone().unwrap_or_default(),
                attached: state.sessions.contains(&tab.id),
            })
            .collect())
    }
}

// ============================================================================
// TabHost
// ============================================================================

#[async_trait]
impl TabHost for RecordingHost {
    async fn active_tabs(&self) -> Result<Vec<TabInfo>> {
        self.record(HostCall::ActiveTabs);
        tokio::task::yield_now().await;

        Ok(self
            .state
            .lock()
            .tabs
            .iter()
            .filter(|tab| tab.active)
            .cloned()
            .collect())
    }

    async fn tab(&self, tab_id: TabId) -> Result<TabInfo> {
        self.record(HostCall::GetTab(tab_id));
        tokio::task::yield_now().await;

        self.state
            .lock()
            .tabs
            .iter()
            .find(|tab| tab.id == tab_id)
            .cloned()
            .ok_or_else(|| Error::tab_not_found(tab_id))
    }

    async fn open(&self, url: &str) -> Result<()> {
        self.record(HostCall::Open(url.to_string()));
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
