//! End-to-end review session.
//!
//! A session validates the URL, kicks off agent generation in the background
//! and then follows the swarm until the task settles. Everything that can fail
//! after validation degrades to a default or a retry; the only failure a user
//! ever sees is a rejected URL.

use crate::analysis::{summary_line, AggregateStatistics, Insights, Progress, ThemeConfig, ThemeReport};
use crate::api::{Backend, LaunchApi};
use crate::config::Config;
use crate::models::{TargetAudience, TaskState};
use crate::sync::{Snapshot, StatusEvent, StatusWatcher, SwarmSync};
use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// A user-facing message that clears itself after a fixed delay.
#[derive(Debug, Clone)]
pub struct Notice {
    message: String,
    expires_at: Instant,
}

impl Notice {
    pub fn new(message: impl Into<String>, ttl: Duration) -> Self {
        Self {
            message: message.into(),
            expires_at: Instant::now() + ttl,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    #[allow(dead_code)] // Polled by interactive front-ends
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Knobs for one session.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub agents_interval: Duration,
    pub status_interval: Duration,
    /// Give up following the task after this long.
    pub max_wait: Duration,
    pub notice_ttl: Duration,
    /// Ask the backend for a target audience before launching.
    pub use_audience: bool,
    pub show_progress: bool,
    pub themes: ThemeConfig,
}

impl SessionSettings {
    pub fn from_config(config: &Config, use_audience: bool, show_progress: bool) -> Self {
        Self {
            agents_interval: Duration::from_millis(config.polling.agents_interval_ms),
            status_interval: Duration::from_millis(config.polling.status_interval_ms),
            max_wait: Duration::from_secs(config.polling.max_wait_seconds),
            notice_ttl: Duration::from_secs(config.general.notice_seconds),
            use_audience,
            show_progress,
            themes: config.themes.clone(),
        }
    }
}

/// Everything known when a session ends.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub website_url: Option<String>,
    pub task_id: Option<String>,
    /// Last status reported for the task.
    pub task_state: Option<TaskState>,
    pub snapshot: Snapshot,
    pub aggregate: Option<AggregateStatistics>,
    pub progress: Progress,
    pub themes: ThemeReport,
    pub elapsed: Duration,
    /// Ended on deadline or Ctrl-C instead of task completion.
    pub interrupted: bool,
}

#[derive(Debug)]
pub enum SessionOutcome {
    /// The URL failed validation; nothing was launched.
    Rejected(Notice),
    Finished(SessionSummary),
}

/// Drives one review run against a backend.
pub struct Session<B: Backend> {
    backend: Arc<B>,
    settings: SessionSettings,
}

impl<B: Backend> Session<B> {
    pub fn new(backend: Arc<B>, settings: SessionSettings) -> Self {
        Self { backend, settings }
    }

    /// Validate `url`, launch a swarm for it and follow the result.
    ///
    /// `shutdown` resolving ends the session early.
    pub async fn launch<F>(&self, url: &str, shutdown: F) -> SessionOutcome
    where
        F: Future<Output = ()>,
    {
        match self.backend.check_link(url).await {
            Ok(true) => {}
            Ok(false) => {
                return SessionOutcome::Rejected(Notice::new(
                    format!("'{}' is not a valid, reachable website URL", url),
                    self.settings.notice_ttl,
                ));
            }
            Err(e) => {
                warn!("Link check failed: {}", e);
                return SessionOutcome::Rejected(Notice::new(
                    format!("Could not verify '{}': {}", url, e),
                    self.settings.notice_ttl,
                ));
            }
        }

        info!("Launching agents for {}", url);
        let (tx, rx) = oneshot::channel();
        let backend = self.backend.clone();
        let website_url = url.to_string();
        let use_audience = self.settings.use_audience;
        tokio::spawn(async move {
            let task_id = launch_in_background(backend, website_url, use_audience).await;
            // The session may already have ended.
            let _ = tx.send(task_id);
        });

        let summary = self
            .follow(Some(url.to_string()), None, Some(rx), shutdown)
            .await;
        SessionOutcome::Finished(summary)
    }

    /// Follow an already running task.
    pub async fn attach<F>(&self, task_id: &str, shutdown: F) -> SessionSummary
    where
        F: Future<Output = ()>,
    {
        info!("Attaching to task {}", task_id);
        self.follow(None, Some(task_id.to_string()), None, shutdown)
            .await
    }

    fn watch_status(
        &self,
        task_id: &str,
        events: &mpsc::UnboundedSender<StatusEvent>,
    ) -> StatusWatcher {
        StatusWatcher::spawn(
            self.backend.clone(),
            task_id.to_string(),
            self.settings.status_interval,
            events.clone(),
        )
    }

    fn progress_bar(&self) -> ProgressBar {
        if !self.settings.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    }

    async fn follow<F>(
        &self,
        website_url: Option<String>,
        mut task_id: Option<String>,
        mut launch: Option<oneshot::Receiver<Option<String>>>,
        shutdown: F,
    ) -> SessionSummary
    where
        F: Future<Output = ()>,
    {
        let started = Instant::now();
        let mut sync = SwarmSync::new(self.backend.clone(), self.settings.agents_interval);
        let mut insights = Insights::new(sync.store().subscribe(), self.settings.themes.clone());

        // Kept alive here so the receiver never reports closed between watchers.
        let (status_tx, mut status_rx) = mpsc::unbounded_channel();
        let mut watcher = task_id.as_deref().map(|id| self.watch_status(id, &status_tx));
        sync.set_scope(task_id.clone());

        let mut task_state = None;
        let mut awaiting_final_poll = false;
        let mut interrupted = false;
        let bar = self.progress_bar();
        bar.set_message(summary_line(insights.progress(), insights.aggregate()));

        let deadline = tokio::time::sleep(self.settings.max_wait);
        tokio::pin!(deadline);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                Some(event) = sync.next_event() => {
                    if !sync.apply(event).is_current() {
                        continue;
                    }
                    if insights.refresh() {
                        let progress = insights.progress();
                        bar.set_length(progress.total as u64);
                        bar.set_position(progress.completed as u64);
                        bar.set_message(summary_line(progress, insights.aggregate()));
                    }
                    if awaiting_final_poll {
                        break;
                    }
                    if task_id.is_none() && launch.is_none() && insights.progress().is_finished() {
                        info!("Every agent has completed");
                        break;
                    }
                }
                Some(event) = status_rx.recv() => {
                    let Some(current) = watcher.as_ref().filter(|w| w.accepts(&event)) else {
                        continue;
                    };
                    if let Ok(status) = event.result {
                        task_state = Some(status.status);
                        if status.status.is_terminal() {
                            match status.status {
                                TaskState::Failed => warn!(
                                    "Task {} failed: {}",
                                    current.task_id(),
                                    status.error.as_deref().unwrap_or(&status.message)
                                ),
                                _ => info!("Task {} {}", current.task_id(), status.status),
                            }
                            awaiting_final_poll = true;
                        }
                    }
                }
                launched = recv_launch(&mut launch), if launch.is_some() => {
                    launch = None;
                    match launched {
                        Some(id) => {
                            watcher = Some(self.watch_status(&id, &status_tx));
                            sync.set_scope(Some(id.clone()));
                            debug!(
                                "Switched to task {} (generation {})",
                                id,
                                sync.poller().generation()
                            );
                            task_id = Some(id);
                        }
                        None => warn!("No task id from launch, following the latest task"),
                    }
                }
                _ = &mut deadline => {
                    warn!("Stopped waiting after {}s", self.settings.max_wait.as_secs());
                    interrupted = true;
                    break;
                }
                _ = &mut shutdown => {
                    warn!("Interrupted, reporting partial results");
                    interrupted = true;
                    break;
                }
            }
        }

        sync.stop();
        bar.finish_and_clear();
        debug!(
            "Session ended with {} agents in the store",
            sync.store().snapshot().agents().len()
        );

        SessionSummary {
            website_url,
            task_id,
            task_state,
            snapshot: insights.snapshot().clone(),
            aggregate: insights.aggregate().copied(),
            progress: *insights.progress(),
            themes: insights.themes().clone(),
            elapsed: started.elapsed(),
            interrupted,
        }
    }
}

async fn recv_launch(launch: &mut Option<oneshot::Receiver<Option<String>>>) -> Option<String> {
    match launch {
        Some(rx) => rx.await.ok().flatten(),
        None => std::future::pending().await,
    }
}

/// Ask the backend for an audience, falling back to the fixed default.
pub async fn resolve_audience<L: LaunchApi>(api: &L, website_url: &str) -> TargetAudience {
    match api.generate_audience(website_url).await {
        Ok(Some(audience)) => audience,
        Ok(None) => {
            warn!("Backend could not suggest an audience, using the default");
            TargetAudience::default()
        }
        Err(e) => {
            warn!("Audience generation failed, using the default: {}", e);
            TargetAudience::default()
        }
    }
}

async fn launch_in_background<B: LaunchApi>(
    backend: Arc<B>,
    website_url: String,
    use_audience: bool,
) -> Option<String> {
    let audience = if use_audience {
        Some(resolve_audience(backend.as_ref(), &website_url).await)
    } else {
        None
    };

    match backend.launch_agents(&website_url, audience.as_ref()).await {
        Ok(response) => {
            info!("Swarm launched as task {}", response.task_id);
            Some(response.task_id)
        }
        Err(e) => {
            warn!("Agent launch failed: {}", e);
            None
        }
    }
}
