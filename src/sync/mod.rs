//! Live synchronization of the agent collection with the backend.
//!
//! `SwarmSync` owns the store and the poller for one observer. It is the only
//! place snapshot results are written, and it checks each result against the
//! poller's current generation before doing so.

pub mod poller;
pub mod status;
pub mod store;

pub use poller::{FetchKind, PollEvent, Poller};
pub use status::{StatusEvent, StatusWatcher};
pub use store::{AgentStore, Snapshot};

use crate::api::SnapshotSource;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

/// What applying a poll event did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Issued under a torn-down scope; ignored.
    Stale,
    /// Merged, identical to what the store already held.
    Unchanged,
    /// Merged, subscribers notified.
    Changed,
    /// Periodic fetch failed; previous contents kept.
    Retained,
}

impl Applied {
    /// The event belonged to the live scope.
    pub fn is_current(&self) -> bool {
        !matches!(self, Applied::Stale)
    }
}

/// Store plus the poller that feeds it.
pub struct SwarmSync<S: SnapshotSource> {
    store: AgentStore,
    poller: Poller<S>,
    events: mpsc::UnboundedReceiver<PollEvent>,
}

impl<S: SnapshotSource> SwarmSync<S> {
    pub fn new(source: Arc<S>, period: Duration) -> Self {
        let (tx, events) = mpsc::unbounded_channel();
        Self {
            store: AgentStore::new(),
            poller: Poller::new(source, period, tx),
            events,
        }
    }

    pub fn store(&self) -> &AgentStore {
        &self.store
    }

    pub fn poller(&self) -> &Poller<S> {
        &self.poller
    }

    /// Switch to `scope`. The previous scope's agents are discarded.
    pub fn set_scope(&mut self, scope: Option<String>) -> bool {
        if !self.poller.set_scope(scope) {
            return false;
        }
        self.store.reset();
        true
    }

    /// Wait for the next fetch result.
    pub async fn next_event(&mut self) -> Option<PollEvent> {
        self.events.recv().await
    }

    /// Apply a fetch result to the store if it belongs to the live scope.
    pub fn apply(&mut self, event: PollEvent) -> Applied {
        if !self.poller.accepts(&event) {
            debug!(
                "Dropping result for {:?} from generation {} (current {})",
                event.scope,
                event.generation,
                self.poller.generation()
            );
            return Applied::Stale;
        }

        let agents = match (event.result, event.kind) {
            (Ok(agents), _) => agents,
            (Err(e), FetchKind::Initial) => {
                warn!("Initial agent fetch failed, showing no data: {}", e);
                Vec::new()
            }
            (Err(e), FetchKind::Periodic) => {
                if e.is_transient() {
                    warn!("Agent poll failed, keeping previous data: {}", e);
                } else {
                    error!("Agent poll rejected, keeping previous data: {}", e);
                }
                return Applied::Retained;
            }
        };

        if self.store.merge(agents) {
            Applied::Changed
        } else {
            Applied::Unchanged
        }
    }

    /// Stop polling; results still in flight will be ignored.
    pub fn stop(&mut self) {
        self.poller.stop();
    }
}
