//! Background task status polling.
//!
//! Unlike the agent poller this loop is sequential and finite: it stops by
//! itself after delivering a terminal status.

use crate::api::TaskStatusSource;
use crate::error::ApiError;
use crate::models::TaskStatus;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct StatusEvent {
    pub task_id: String,
    pub result: Result<TaskStatus, ApiError>,
}

/// Handle to a running status loop; aborts the loop when dropped.
pub struct StatusWatcher {
    task_id: String,
    handle: JoinHandle<()>,
}

impl StatusWatcher {
    pub fn spawn<S: TaskStatusSource>(
        source: Arc<S>,
        task_id: String,
        period: Duration,
        events: mpsc::UnboundedSender<StatusEvent>,
    ) -> Self {
        let handle = tokio::spawn(status_loop(source, task_id.clone(), period, events));
        Self { task_id, handle }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Whether `event` belongs to this watcher's task.
    pub fn accepts(&self, event: &StatusEvent) -> bool {
        event.task_id == self.task_id
    }
}

impl Drop for StatusWatcher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn status_loop<S: TaskStatusSource>(
    source: Arc<S>,
    task_id: String,
    period: Duration,
    events: mpsc::UnboundedSender<StatusEvent>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let result = source.fetch_task_status(&task_id).await;

        let terminal = match &result {
            Ok(status) => {
                debug!(
                    "Task {} is {} ({}%): {}",
                    task_id, status.status, status.progress, status.message
                );
                status.status.is_terminal()
            }
            Err(e) => {
                warn!("Status check for task {} failed: {}", task_id, e);
                false
            }
        };

        let event = StatusEvent {
            task_id: task_id.clone(),
            result,
        };
        if events.send(event).is_err() || terminal {
            break;
        }
    }
}
