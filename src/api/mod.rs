//! Backend API access.
//!
//! The sync engine and the session only see the traits below, so they can be
//! driven by `BackendClient` in production and by an in-memory fake in tests.

pub mod client;
#[cfg(test)]
pub mod fake;

pub use client::BackendClient;

use crate::error::ApiError;
use crate::models::{AgentRecord, ChatMessage, ChatReply, LaunchResponse, TargetAudience, TaskStatus};
use async_trait::async_trait;

/// Source of full agent snapshots for a task scope.
#[async_trait]
pub trait SnapshotSource: Send + Sync + 'static {
    /// Fetch every agent for `task_id`, or for the backend's most recent
    /// task when `task_id` is `None`.
    async fn fetch_agents(&self, task_id: Option<&str>) -> Result<Vec<AgentRecord>, ApiError>;
}

/// Source of background task status.
#[async_trait]
pub trait TaskStatusSource: Send + Sync + 'static {
    async fn fetch_task_status(&self, task_id: &str) -> Result<TaskStatus, ApiError>;
}

/// Endpoints used to start a new review run.
#[async_trait]
pub trait LaunchApi: Send + Sync + 'static {
    async fn check_link(&self, url: &str) -> Result<bool, ApiError>;

    /// `Ok(None)` when the backend answered but could not suggest an audience.
    async fn generate_audience(&self, website_url: &str)
        -> Result<Option<TargetAudience>, ApiError>;

    async fn launch_agents(
        &self,
        website_url: &str,
        audience: Option<&TargetAudience>,
    ) -> Result<LaunchResponse, ApiError>;
}

/// One-to-one conversations with a reviewer agent.
#[async_trait]
pub trait ChatApi: Send + Sync + 'static {
    /// Open a conversation. Returns its id.
    async fn start_conversation(&self, agent_id: i64) -> Result<String, ApiError>;

    /// Send `message` along with everything said so far.
    async fn send_message(
        &self,
        agent_id: i64,
        message: &str,
        history: &[ChatMessage],
    ) -> Result<ChatReply, ApiError>;
}

/// Everything a session needs from the backend.
pub trait Backend: SnapshotSource + TaskStatusSource + LaunchApi {}

impl<T> Backend for T where T: SnapshotSource + TaskStatusSource + LaunchApi {}
