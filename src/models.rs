//! Data models shared by the client.
//!
//! Agent records and the request/response bodies of the backend API, plus
//! the report structure written at the end of a session. Field names follow
//! the backend's camelCase JSON.

use crate::analysis::{AggregateStatistics, Progress, ThemeMatch};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a single agent.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    /// Waiting to be evaluated
    #[default]
    Pending,
    /// Evaluation in progress
    Reviewing,
    /// Ratings and review are available
    Completed,
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentStatus::Pending => write!(f, "Pending"),
            AgentStatus::Reviewing => write!(f, "Reviewing"),
            AgentStatus::Completed => write!(f, "Completed"),
        }
    }
}

/// Scores given by a completed agent, each in 0-100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ratings {
    pub overall: f64,
    pub clarity: f64,
    pub ux: f64,
    pub value_proposition: f64,
}

/// One simulated reviewer as reported by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRecord {
    /// Backend-assigned identity, stable for the life of a task.
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub age: u32,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub occupation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub life_views: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub innovation_attitude: Option<String>,
    /// 1-10
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_tolerance: Option<u8>,
    /// 1-10
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gullibility: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_color: Option<String>,
    #[serde(default)]
    pub status: AgentStatus,
    /// Present only once the agent has completed.
    #[serde(default)]
    pub ratings: Option<Ratings>,
    /// Present only once the agent has completed.
    #[serde(default)]
    pub review: Option<String>,
}

impl AgentRecord {
    /// Completed and carrying ratings. The backend is expected to keep
    /// status and ratings consistent, but this checks both.
    pub fn is_rated(&self) -> bool {
        self.status == AgentStatus::Completed && self.ratings.is_some()
    }

    /// Review text of a completed agent, if it has any non-blank text.
    pub fn completed_review(&self) -> Option<&str> {
        if self.status != AgentStatus::Completed {
            return None;
        }
        self.review
            .as_deref()
            .filter(|review| !review.trim().is_empty())
    }

    /// Name with the agent's emoji in front, when it has one.
    pub fn display_name(&self) -> String {
        match &self.emoji {
            Some(emoji) => format!("{} {}", emoji, self.name),
            None => self.name.clone(),
        }
    }
}

/// Background task state reported by `ai-status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Started,
    Running,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

impl TaskState {
    /// Completed or failed; status polling stops here.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskState::Started => write!(f, "started"),
            TaskState::Running => write!(f, "running"),
            TaskState::Completed => write!(f, "completed"),
            TaskState::Failed => write!(f, "failed"),
            TaskState::Unknown => write!(f, "unknown"),
        }
    }
}

/// Response of `GET /api/agents/ai-status/{task_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub task_id: String,
    pub status: TaskState,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Audience descriptor used to seed agent generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetAudience {
    pub age_range: [u32; 2],
    pub gender: String,
    pub occupation: String,
    pub life_views: String,
    pub innovation_attitude: String,
    pub risk_tolerance: u8,
    pub gullibility: u8,
}

impl Default for TargetAudience {
    /// Used whenever the backend cannot suggest an audience.
    fn default() -> Self {
        Self {
            age_range: [25, 45],
            gender: "any".to_string(),
            occupation: "General consumers".to_string(),
            life_views: "moderate".to_string(),
            innovation_attitude: "moderate".to_string(),
            risk_tolerance: 5,
            gullibility: 5,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CheckLinkRequest<'a> {
    pub url: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct CheckLinkResponse {
    pub is_valid: bool,
}

#[derive(Debug, Serialize)]
pub struct AudienceRequest<'a> {
    pub website_url: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct AudienceResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Option<TargetAudience>,
}

#[derive(Debug, Serialize)]
pub struct LaunchRequest<'a> {
    pub website_url: &'a str,
    pub target_audience: Option<&'a TargetAudience>,
}

/// Response of `POST /api/agents/ai-launch`.
#[derive(Debug, Clone, Deserialize)]
pub struct LaunchResponse {
    pub task_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A single turn in an agent conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// "user" or "assistant"
    pub role: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StartConversationRequest {
    pub agent_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct StartConversationResponse {
    pub conversation_id: String,
}

#[derive(Debug, Serialize)]
pub struct SendMessageRequest<'a> {
    pub agent_id: i64,
    pub message: &'a str,
    pub conversation_history: &'a [ChatMessage],
}

/// Response of `POST /api/chat/send-message`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatReply {
    pub message: String,
    #[serde(default)]
    pub agent_name: Option<String>,
    #[serde(default)]
    pub agent_emoji: Option<String>,
}

/// Metadata about a finished session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// URL under review, unknown when attaching to an existing task.
    pub website_url: Option<String>,
    pub task_id: Option<String>,
    /// Last task state observed, if any.
    pub task_state: Option<TaskState>,
    pub generated_at: DateTime<Utc>,
    pub duration_seconds: f64,
    /// The session ended on deadline or Ctrl-C rather than task completion.
    pub interrupted: bool,
}

/// The complete session report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwarmReport {
    pub metadata: ReportMetadata,
    pub progress: Progress,
    /// `None` while no agent has completed.
    pub aggregate: Option<AggregateStatistics>,
    /// Full ranked list; views truncate.
    pub pain_points: Vec<ThemeMatch>,
    pub liked_features: Vec<ThemeMatch>,
    /// Completed agents in the requested order.
    pub agents: Vec<AgentRecord>,
}
