//! Authoritative in-memory agent collection.
//!
//! The backend returns a full snapshot on every poll. The store replaces its
//! collection wholesale, and only when the incoming snapshot differs, so
//! subscribers are notified exactly when something observable changed.

use crate::models::AgentRecord;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// What the client currently knows about a task's agents.
#[derive(Debug, Clone, Default)]
pub enum Snapshot {
    /// Nothing received yet for the current scope.
    #[default]
    Loading,
    /// The latest snapshot. May be empty: "zero agents" is not "no data".
    Ready(Arc<Vec<AgentRecord>>),
}

impl Snapshot {
    pub fn is_loading(&self) -> bool {
        matches!(self, Snapshot::Loading)
    }

    /// Agents in arrival order; empty while loading.
    pub fn agents(&self) -> &[AgentRecord] {
        match self {
            Snapshot::Loading => &[],
            Snapshot::Ready(agents) => agents,
        }
    }

    /// Both ready and backed by the same allocation.
    #[cfg(test)]
    pub fn same_as(&self, other: &Snapshot) -> bool {
        match (self, other) {
            (Snapshot::Loading, Snapshot::Loading) => true,
            (Snapshot::Ready(a), Snapshot::Ready(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Reconcile `current` with a full `incoming` snapshot.
///
/// Returns the next snapshot and whether it differs from `current`. When
/// nothing changed the existing `Arc` is handed back.
pub fn merge(current: &Snapshot, incoming: Vec<AgentRecord>) -> (Snapshot, bool) {
    match current {
        Snapshot::Loading if incoming.is_empty() => (Snapshot::Loading, false),
        Snapshot::Loading => (Snapshot::Ready(Arc::new(incoming)), true),
        Snapshot::Ready(agents) if **agents == incoming => (current.clone(), false),
        Snapshot::Ready(_) => (Snapshot::Ready(Arc::new(incoming)), true),
    }
}

/// Store of the current snapshot with change notification.
#[derive(Debug)]
pub struct AgentStore {
    tx: watch::Sender<Snapshot>,
}

impl Default for AgentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Snapshot::Loading);
        Self { tx }
    }

    /// The current snapshot (cheap clone).
    pub fn snapshot(&self) -> Snapshot {
        self.tx.borrow().clone()
    }

    /// Receiver that is marked changed after every effective merge or reset.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.tx.subscribe()
    }

    /// Merge a full snapshot. Returns true when subscribers were notified.
    pub fn merge(&self, incoming: Vec<AgentRecord>) -> bool {
        let count = incoming.len();
        let changed = self.tx.send_if_modified(|current| {
            let (next, changed) = merge(current, incoming);
            if changed {
                *current = next;
            }
            changed
        });

        if changed {
            debug!("Store updated with {} agents", count);
        }
        changed
    }

    /// Forget everything; used when the scope changes.
    pub fn reset(&self) -> bool {
        self.tx.send_if_modified(|current| {
            if current.is_loading() {
                false
            } else {
                *current = Snapshot::Loading;
                true
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{completed_agent, pending_agent};

    #[test]
    fn test_empty_before_data_stays_loading() {
        let (next, changed) = merge(&Snapshot::Loading, Vec::new());
        assert!(next.is_loading());
        assert!(!changed);
    }

    #[test]
    fn test_empty_after_data_is_zero_agents() {
        let (ready, _) = merge(&Snapshot::Loading, vec![pending_agent(1, "Ann")]);
        let (next, changed) = merge(&ready, Vec::new());
        assert!(changed);
        assert!(!next.is_loading());
        assert!(next.agents().is_empty());
    }

    #[test]
    fn test_merge_idempotent_keeps_reference() {
        let snapshot = vec![pending_agent(1, "Ann"), pending_agent(2, "Bo")];
        let (once, changed) = merge(&Snapshot::Loading, snapshot.clone());
        assert!(changed);

        let (twice, changed) = merge(&once, snapshot);
        assert!(!changed);
        assert!(twice.same_as(&once));
    }

    #[test]
    fn test_status_transition_replaces_snapshot() {
        let (first, _) = merge(&Snapshot::Loading, vec![pending_agent(1, "Ann")]);
        let (second, changed) = merge(
            &first,
            vec![completed_agent(1, "Ann", 80.0, "Nice and fast")],
        );
        assert!(changed);
        assert!(!second.same_as(&first));
        assert!(second.agents()[0].is_rated());
    }

    #[test]
    fn test_out_of_order_snapshot_is_applied_as_is() {
        // The backend is authoritative; an older-looking snapshot still wins.
        let (done, _) = merge(
            &Snapshot::Loading,
            vec![completed_agent(1, "Ann", 80.0, "Nice")],
        );
        let (next, changed) = merge(&done, vec![pending_agent(1, "Ann")]);
        assert!(changed);
        assert!(!next.agents()[0].is_rated());
    }

    #[test]
    fn test_store_notifies_only_on_change() {
        let store = AgentStore::new();
        let mut rx = store.subscribe();
        assert!(!rx.has_changed().unwrap());

        assert!(!store.merge(Vec::new()));
        assert!(!rx.has_changed().unwrap());

        assert!(store.merge(vec![pending_agent(1, "Ann")]));
        assert!(rx.has_changed().unwrap());
        let _ = rx.borrow_and_update();

        assert!(!store.merge(vec![pending_agent(1, "Ann")]));
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_reset_returns_to_loading() {
        let store = AgentStore::new();
        assert!(!store.reset());

        store.merge(vec![pending_agent(1, "Ann")]);
        assert!(store.reset());
        assert!(store.snapshot().is_loading());
    }
}
