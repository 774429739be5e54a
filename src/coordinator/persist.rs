//! Background state writer.
//!
//! State snapshots go through one ordered channel to a single task, so
//! writes land in mutation order without callers waiting on the store.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::store::KeyValueStore;

use super::state::SpoofState;

// ============================================================================
// Types
// ============================================================================

enum PersistCommand {
    /// Write a state snapshot.
    Write(SpoofState),
    /// Signal once every earlier write is done.
    Flush(oneshot::Sender<()>),
}

// ============================================================================
// Persister
// ============================================================================

/// Handle to the writer task. The task exits when the handle is dropped.
#[derive(Debug, Clone)]
pub(crate) struct Persister {
    tx: mpsc::UnboundedSender<PersistCommand>,
}

impl Persister {
    /// Spawns the writer task.
    ///
    /// Must be called from within a Tokio runtime.
    pub(crate) fn spawn(store: Arc<dyn KeyValueStore>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(Self::run(store, rx));
        Self { tx }
    }

    /// Queues a snapshot for writing.
    pub(crate) fn save(&self, state: SpoofState) {
        if self.tx.send(PersistCommand::Write(state)).is_err() {
            warn!("State writer stopped, dropping snapshot");
        }
    }

    /// Waits until every queued snapshot has been written.
    pub(crate) async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(PersistCommand::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }

    async fn run(store: Arc<dyn KeyValueStore>, mut rx: mpsc::UnboundedReceiver<PersistCommand>) {
        while let Some(command) = rx.recv().await {
            match command {
                PersistCommand::Write(state) => {
                    if let Err(e) = state.save(store.as_ref()).await {
                        warn!(error = %e, "Failed to persist state");
                    }
                }
                PersistCommand::Flush(done) => {
                    let _ = done.send(());
                }
            }
        }

        debug!("State writer stopped");
    }
}

// ============================================================================
// Tests
// ============================================================================
