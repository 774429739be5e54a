//! Host APIs over the WebSocket bridge.
//!
//! [`RemoteHost`] turns trait calls into bridge requests and hands bridge
//! events to a [`Coordinator`].
//!
//! # Example
//!
//! ```ignore
//! let server = PendingServer::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 7878).await?;
//! let (connection, ready) = server.accept().await?;
//! let host = Arc::new(RemoteHost::new(connection, ready));
//!
//! let coordinator = Coordinator::builder()
//!     .host(Arc::clone(&host))
//!     .store(host.clone())
//!     .panel_url(host.panel_url())
//!     .build()?;
//!
//! coordinator.startup().await;
//! host.serve(coordinator).await;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::coordinator::Coordinator;
use crate::error::{Error, Result};
use crate::identifiers::{RequestId, TabId};
use crate::protocol::{
    Command, ControlReply, DebuggerCommand, DevToolsCommand, HostEvent, Request, RuntimeCommand,
    StorageCommand, TabsCommand,
};
use crate::store::KeyValueStore;
use crate::transport::{Connection, ReadyData};

use super::{
    DebugTarget, Instrumentation, TabHost, TabInfo, TargetInfo, is_already_attached_message,
};

// ============================================================================
// RemoteHost
// ============================================================================

/// Browser host reached through the extension shim.
///
/// Implements [`Instrumentation`], [`TabHost`] and [`KeyValueStore`].
pub struct RemoteHost {
    connection: Connection,
    ready: ReadyData,
}

impl fmt::Debug for RemoteHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteHost")
            .field("browser", &self.ready.browser)
            .field("panel_url", &self.ready.panel_url)
            .field("in_flight", &self.connection.in_flight())
            .field("closed", &self.connection.is_closed())
            .finish()
    }
}

impl RemoteHost {
    /// Wraps an accepted bridge connection.
    #[must_use]
    pub fn new(connection: Connection, ready: ReadyData) -> Self {
        Self { connection, ready }
    }

    /// Returns the control panel URL announced by the shim.
    #[inline]
    #[must_use]
    pub fn panel_url(&self) -> &str {
        &self.ready.panel_url
    }

    /// Returns the browser name announced by the shim.
    #[inline]
    #[must_use]
    pub fn browser(&self) -> &str {
        &self.ready.browser
    }

    /// Returns the underlying connection.
    #[inline]
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Answers a `runtime.message` event.
    ///
    /// # Errors
    ///
    /// Returns an error if the bridge call fails.
    pub async fn reply(&self, message_id: RequestId, response: ControlReply) -> Result<()> {
        self.call(Command::Runtime(RuntimeCommand::Reply {
            message_id,
            response,
        }))
        .await?;
        Ok(())
    }

    /// Feeds bridge events into the coordinator.
    ///
    /// Each event is handled on its own task so per-tab sequences
    /// interleave. Control panel messages are answered with
    /// `runtime.reply`. Returns when the shim disconnects, or at once if
    /// the events were already claimed.
    pub async fn serve(self: Arc<Self>, coordinator: Coordinator) {
        let Some(mut events) = self.connection.take_events() else {
            warn!("Bridge events already claimed, not serving");
            return;
        };

        debug!("Serving bridge events");

        while let Some(event) = events.recv().await {
            trace!(method = %event.method, "Dispatching event");

            let host = Arc::clone(&self);
            let coordinator = coordinator.clone();

            tokio::spawn(async move {
                match event.parse() {
                    HostEvent::Message {
                        message_id,
                        message,
                    } => {
                        let reply = coordinator.handle_message(message).await;
                        if let Err(e) = host.reply(message_id, reply).await {
                            warn!(%message_id, error = %e, "Failed to reply to control message");
                        }
                    }
                    other => coordinator.handle_event(other).await,
                }
            });
        }

        debug!("Event stream ended");
    }
}

// ============================================================================
// RemoteHost - Internal
// ============================================================================

impl RemoteHost {
    /// Sends one bridge command and unwraps the result.
    async fn call(&self, command: Command) -> Result<Value> {
        let request = Request::new(command);
        let method = request.method();
        let response = self.connection.call(request).await?;
        response.into_result(method)
    }

    /// Decodes an array result, dropping entries the host shaped differently.
    fn decode_list<T: DeserializeOwned>(method: &str, value: Value) -> Vec<T> {
        let Value::Array(items) = value else {
            warn!(method, "Expected array result");
            return Vec::new();
        };

        items
            .into_iter()
            .filter_map(|item| match serde_json::from_value(item) {
                Ok(decoded) => Some(decoded),
                Err(e) => {
                    trace!(method, error = %e, "Skipping undecodable entry");
                    None
                }
            })
            .collect()
    }
}

// ============================================================================
// Instrumentation
// ============================================================================

#[async_trait]
impl Instrumentation for RemoteHost {
    async fn attach(&self, tab_id: TabId, version: &str) -> Result<()> {
        let command = Command::Debugger(DebuggerCommand::Attach {
            tab_id,
            version: version.to_string(),
        });

        match self.call(command).await {
            Ok(_) => Ok(()),
            Err(Error::HostCommand { message, .. }) if is_already_attached_message(&message) => {
                Err(Error::already_attached(tab_id))
            }
            Err(e) => Err(e),
        }
    }

    async fn send_command(&self, target: &DebugTarget, command: DevToolsCommand) -> Result<Value> {
        self.call(Command::Debugger(DebuggerCommand::SendCommand {
            target: target.clone(),
            command,
        }))
        .await
    }

    async fn detach(&self, target: &DebugTarget) -> Result<()> {
        self.call(Command::Debugger(DebuggerCommand::Detach {
            target: target.clone(),
        }))
        .await?;
        Ok(())
    }

    async fn targets(&self) -> Result<Vec<TargetInfo>> {
        let value = self
            .call(Command::Debugger(DebuggerCommand::GetTargets))
            .await?;
        Ok(Self::decode_list("debugger.getTargets", value))
    }
}

// ============================================================================
// TabHost
// ============================================================================

#[async_trait]
impl TabHost for RemoteHost {
    async fn active_tabs(&self) -> Result<Vec<TabInfo>> {
        let value = self
            .call(Command::Tabs(TabsCommand::Query {
                active: true,
                current_window: true,
            }))
            .await?;
        Ok(Self::decode_list("tabs.query", value))
    }

    async fn tab(&self, tab_id: TabId) -> Result<TabInfo> {
        match self.call(Command::Tabs(TabsCommand::Get { tab_id })).await {
            Ok(value) => Ok(serde_json::from_value(value)?),
            Err(Error::HostCommand { .. }) => Err(Error::tab_not_found(tab_id)),
            Err(e) => Err(e),
        }
    }

    async fn open(&self, url: &str) -> Result<()> {
        self.call(Command::Tabs(TabsCommand::Create {
            url: url.to_string(),
        }))
        .await?;
        Ok(())
    }
}

// ============================================================================
// KeyValueStore
// ============================================================================

#[async_trait]
impl KeyValueStore for RemoteHost {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let value = self
            .call(Command::Storage(StorageCommand::Get {
                key: key.to_string(),
            }))
            .await?;

        Ok(match value {
            Value::Null => None,
            value => Some(value),
        })
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.call(Command::Storage(StorageCommand::Set {
            key: key.to_string(),
            value,
        }))
        .await
        .map_err(|e| Error::storage(format!("storage.set {key}: {e}")))?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
