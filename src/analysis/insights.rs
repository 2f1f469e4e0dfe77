//! Memoized derivations over the live store.
//!
//! `Insights` subscribes to the store and keeps the last computed aggregate,
//! progress and theme report. Recomputation happens synchronously in
//! `refresh`, and only when the store has published a new snapshot.

use crate::analysis::aggregator::{aggregate, progress, AggregateStatistics, Progress};
use crate::analysis::themes::{classify_reviews, ThemeConfig, ThemeReport};
use crate::sync::Snapshot;
use tokio::sync::watch;

pub struct Insights {
    rx: watch::Receiver<Snapshot>,
    themes_config: ThemeConfig,
    snapshot: Snapshot,
    aggregate: Option<AggregateStatistics>,
    progress: Progress,
    themes: ThemeReport,
}

impl Insights {
    /// Subscribe and compute from the store's current contents.
    pub fn new(rx: watch::Receiver<Snapshot>, themes_config: ThemeConfig) -> Self {
        let mut insights = Self {
            rx,
            themes_config,
            snapshot: Snapshot::Loading,
            aggregate: None,
            progress: Progress::default(),
            themes: ThemeReport::default(),
        };
        insights.recompute();
        insights
    }

    /// Recompute if the store changed since the last call.
    pub fn refresh(&mut self) -> bool {
        if !self.rx.has_changed().unwrap_or(false) {
            return false;
        }
        self.recompute();
        true
    }

    fn recompute(&mut self) {
        self.snapshot = self.rx.borrow_and_update().clone();
        let agents = self.snapshot.agents();
        self.aggregate = aggregate(agents);
        self.progress = progress(agents);
        self.themes = classify_reviews(agents, &self.themes_config);
    }

    /// Snapshot the outputs were computed from.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn aggregate(&self) -> Option<&AggregateStatistics> {
        self.aggregate.as_ref()
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    pub fn themes(&self) -> &ThemeReport {
        &self.themes
    }
}
