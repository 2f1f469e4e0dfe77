//! Fixed-interval snapshot polling for one scope at a time.
//!
//! Every scope change cancels the running loop, fetches immediately and then
//! re-arms the interval. Fetch results travel back to the owner over a
//! channel tagged with the generation they were issued under; the owner drops
//! anything from an older generation, so a fetch that resolves after its
//! scope was torn down can never reach the store.

use crate::api::SnapshotSource;
use crate::error::ApiError;
use crate::models::AgentRecord;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Default polling period.
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(2);

/// Whether a fetch was the first one after a scope change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Initial,
    Periodic,
}

/// Outcome of one fetch, delivered to the poller's owner.
#[derive(Debug)]
pub struct PollEvent {
    pub generation: u64,
    pub scope: Option<String>,
    pub kind: FetchKind,
    pub result: Result<Vec<AgentRecord>, ApiError>,
}

struct ActivePoll {
    scope: Option<String>,
    handle: JoinHandle<()>,
}

/// Repeating fetcher bound to a single scope key.
pub struct Poller<S: SnapshotSource> {
    source: Arc<S>,
    period: Duration,
    events: mpsc::UnboundedSender<PollEvent>,
    generation: Arc<AtomicU64>,
    active: Option<ActivePoll>,
}

impl<S: SnapshotSource> Poller<S> {
    pub fn new(source: Arc<S>, period: Duration, events: mpsc::UnboundedSender<PollEvent>) -> Self {
        Self {
            source,
            period,
            events,
            generation: Arc::new(AtomicU64::new(0)),
            active: None,
        }
    }

    /// Generation of the currently running loop.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Whether `event` was issued by the running loop and may be applied.
    pub fn accepts(&self, event: &PollEvent) -> bool {
        self.is_running() && event.generation == self.generation()
    }

    /// Poll `scope`, restarting the loop if it differs from the current one.
    ///
    /// Returns true when a new loop was started.
    pub fn set_scope(&mut self, scope: Option<String>) -> bool {
        if let Some(active) = &self.active {
            if active.scope == scope {
                return false;
            }
        }

        self.stop();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        info!(
            "Polling agents for {} every {:?}",
            describe_scope(scope.as_deref()),
            self.period
        );

        let handle = tokio::spawn(poll_loop(
            self.source.clone(),
            scope.clone(),
            self.period,
            generation,
            self.generation.clone(),
            self.events.clone(),
        ));
        self.active = Some(ActivePoll { scope, handle });
        true
    }

    /// Cancel the timer and every in-flight fetch.
    pub fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            // Bump first so anything already queued is recognised as stale.
            self.generation.fetch_add(1, Ordering::SeqCst);
            active.handle.abort();
            debug!("Stopped polling {}", describe_scope(active.scope.as_deref()));
        }
    }
}

impl<S: SnapshotSource> Drop for Poller<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn describe_scope(scope: Option<&str>) -> String {
    match scope {
        Some(task_id) => format!("task {}", task_id),
        None => "latest task".to_string(),
    }
}

/// Timer loop. Each tick spawns its fetch so a slow request never delays the
/// next one; the `JoinSet` is dropped with the loop, aborting them all.
async fn poll_loop<S: SnapshotSource>(
    source: Arc<S>,
    scope: Option<String>,
    period: Duration,
    generation: u64,
    live: Arc<AtomicU64>,
    events: mpsc::UnboundedSender<PollEvent>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut in_flight = JoinSet::new();
    let mut kind = FetchKind::Initial;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                in_flight.spawn(fetch_once(
                    source.clone(),
                    scope.clone(),
                    kind,
                    generation,
                    live.clone(),
                    events.clone(),
                ));
                kind = FetchKind::Periodic;
            }
            Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
        }
    }
}

async fn fetch_once<S: SnapshotSource>(
    source: Arc<S>,
    scope: Option<String>,
    kind: FetchKind,
    generation: u64,
    live: Arc<AtomicU64>,
    events: mpsc::UnboundedSender<PollEvent>,
) {
    let result = source.fetch_agents(scope.as_deref()).await;

    if live.load(Ordering::SeqCst) != generation {
        debug!("Discarding fetch for torn-down {}", describe_scope(scope.as_deref()));
        return;
    }

    // The owner may already be gone; nothing to deliver to then.
    let _ = events.send(PollEvent {
        generation,
        scope,
        kind,
        result,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{pending_agent, FakeBackend};

    fn poller(backend: FakeBackend) -> (Poller<FakeBackend>, mpsc::UnboundedReceiver<PollEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Poller::new(Arc::new(backend), DEFAULT_PERIOD, tx), rx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_fetch_then_periodic() {
        let backend = FakeBackend::new().with_snapshots(Some("t1"), vec![Ok(vec![pending_agent(1, "Ann")])]);
        let (mut poller, mut rx) = poller(backend);

        let start = tokio::time::Instant::now();
        assert!(poller.set_scope(Some("t1".to_string())));

        let first = rx.recv().await.unwrap();
        assert_eq!(first.kind, FetchKind::Initial);
        assert_eq!(first.scope.as_deref(), Some("t1"));
        assert!(start.elapsed() < Duration::from_millis(10));

        let second = rx.recv().await.unwrap();
        assert_eq!(second.kind, FetchKind::Periodic);
        assert!(start.elapsed() >= DEFAULT_PERIOD);
        assert!(poller.accepts(&second));
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_scope_does_not_restart() {
        let (mut poller, _rx) = poller(FakeBackend::new());
        assert!(poller.set_scope(None));
        let generation = poller.generation();

        assert!(!poller.set_scope(None));
        assert_eq!(poller.generation(), generation);

        assert!(poller.set_scope(Some("t1".to_string())));
        assert!(poller.generation() > generation);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scope_change_drops_in_flight_fetch() {
        let backend = FakeBackend::new()
            .with_snapshots(Some("old"), vec![Ok(vec![pending_agent(1, "Old")])])
            .with_delay(Some("old"), Duration::from_secs(5))
            .with_snapshots(Some("new"), vec![Ok(vec![pending_agent(2, "New")])]);
        let (mut poller, mut rx) = poller(backend);

        poller.set_scope(Some("old".to_string()));
        tokio::time::sleep(Duration::from_secs(1)).await;
        poller.set_scope(Some("new".to_string()));

        // Let the old fetch's delay elapse several times over.
        tokio::time::sleep(Duration::from_secs(12)).await;
        while let Ok(event) = rx.try_recv() {
            assert_eq!(event.scope.as_deref(), Some("new"));
            assert!(poller.accepts(&event));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_event_rejected_after_stop() {
        let (mut poller, mut rx) = poller(FakeBackend::new());
        poller.set_scope(None);
        let event = rx.recv().await.unwrap();
        assert!(poller.accepts(&event));

        poller.stop();
        assert!(!poller.is_running());
        assert!(!poller.accepts(&event));

        // No further timer firings once stopped.
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
    }
}
