//! In-memory backend for tests.
//!
//! Responses are scripted per scope; each call consumes the next scripted
//! response and the last one repeats forever.

use crate::api::{ChatApi, LaunchApi, SnapshotSource, TaskStatusSource};
use crate::error::ApiError;
use crate::models::{
    AgentRecord, ChatMessage, ChatReply, LaunchResponse, TargetAudience, TaskState, TaskStatus,
};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

type Scope = Option<String>;

pub struct FakeBackend {
    snapshots: Mutex<HashMap<Scope, VecDeque<Result<Vec<AgentRecord>, ApiError>>>>,
    delays: Mutex<HashMap<Scope, Duration>>,
    statuses: Mutex<HashMap<String, VecDeque<TaskStatus>>>,
    link_valid: Mutex<Result<bool, ApiError>>,
    audience: Mutex<Result<Option<TargetAudience>, ApiError>>,
    launch: Mutex<Result<LaunchResponse, ApiError>>,
    launch_delay: Mutex<Duration>,
    fetch_log: Mutex<Vec<Scope>>,
    launched_with: Mutex<Vec<(String, Option<TargetAudience>)>>,
    chat_error: Mutex<Option<ApiError>>,
    sent_histories: Mutex<Vec<Vec<ChatMessage>>>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            snapshots: Mutex::new(HashMap::new()),
            delays: Mutex::new(HashMap::new()),
            statuses: Mutex::new(HashMap::new()),
            link_valid: Mutex::new(Ok(true)),
            audience: Mutex::new(Ok(None)),
            launch: Mutex::new(Ok(LaunchResponse {
                task_id: "task-1".to_string(),
                status: Some("started".to_string()),
                message: None,
            })),
            launch_delay: Mutex::new(Duration::ZERO),
            fetch_log: Mutex::new(Vec::new()),
            launched_with: Mutex::new(Vec::new()),
            chat_error: Mutex::new(None),
            sent_histories: Mutex::new(Vec::new()),
        }
    }
}

fn next_scripted<T: Clone>(queue: &mut VecDeque<T>) -> Option<T> {
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshots(
        self,
        scope: Option<&str>,
        responses: Vec<Result<Vec<AgentRecord>, ApiError>>,
    ) -> Self {
        self.snapshots
            .lock()
            .unwrap()
            .insert(scope.map(String::from), responses.into());
        self
    }

    pub fn with_delay(self, scope: Option<&str>, delay: Duration) -> Self {
        self.delays
            .lock()
            .unwrap()
            .insert(scope.map(String::from), delay);
        self
    }

    pub fn with_statuses(self, task_id: &str, states: Vec<TaskState>) -> Self {
        let statuses = states
            .into_iter()
            .map(|state| status(task_id, state))
            .collect();
        self.statuses
            .lock()
            .unwrap()
            .insert(task_id.to_string(), statuses);
        self
    }

    pub fn with_link_valid(self, result: Result<bool, ApiError>) -> Self {
        *self.link_valid.lock().unwrap() = result;
        self
    }

    pub fn with_audience(self, result: Result<Option<TargetAudience>, ApiError>) -> Self {
        *self.audience.lock().unwrap() = result;
        self
    }

    pub fn with_launch(self, result: Result<LaunchResponse, ApiError>) -> Self {
        *self.launch.lock().unwrap() = result;
        self
    }

    pub fn with_launch_delay(self, delay: Duration) -> Self {
        *self.launch_delay.lock().unwrap() = delay;
        self
    }

    /// Make every chat call fail with `error`.
    pub fn with_chat_error(self, error: ApiError) -> Self {
        *self.chat_error.lock().unwrap() = Some(error);
        self
    }

    /// History sent along with each chat message.
    pub fn sent_histories(&self) -> Vec<Vec<ChatMessage>> {
        self.sent_histories.lock().unwrap().clone()
    }

    /// Scopes of every `fetch_agents` call, in call order.
    pub fn fetch_log(&self) -> Vec<Scope> {
        self.fetch_log.lock().unwrap().clone()
    }

    /// Arguments of every launch call.
    pub fn launched_with(&self) -> Vec<(String, Option<TargetAudience>)> {
        self.launched_with.lock().unwrap().clone()
    }
}

/// Build a task status with a message matching its state.
pub fn status(task_id: &str, state: TaskState) -> TaskStatus {
    TaskStatus {
        task_id: task_id.to_string(),
        status: state,
        message: format!("task is {}", state),
        progress: if state == TaskState::Completed { 100 } else { 50 },
        error: None,
    }
}

#[async_trait]
impl SnapshotSource for FakeBackend {
    async fn fetch_agents(&self, task_id: Option<&str>) -> Result<Vec<AgentRecord>, ApiError> {
        let scope = task_id.map(String::from);
        self.fetch_log.lock().unwrap().push(scope.clone());

        let response = self
            .snapshots
            .lock()
            .unwrap()
            .get_mut(&scope)
            .and_then(next_scripted)
            .unwrap_or_else(|| Ok(Vec::new()));
        let delay = self.delays.lock().unwrap().get(&scope).copied();

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        response
    }
}

#[async_trait]
impl TaskStatusSource for FakeBackend {
    async fn fetch_task_status(&self, task_id: &str) -> Result<TaskStatus, ApiError> {
        self.statuses
            .lock()
            .unwrap()
            .get_mut(task_id)
            .and_then(next_scripted)
            .ok_or_else(|| ApiError::Status {
                status: 404,
                body: "Task not found".to_string(),
            })
    }
}

#[async_trait]
impl LaunchApi for FakeBackend {
    async fn check_link(&self, _url: &str) -> Result<bool, ApiError> {
        self.link_valid.lock().unwrap().clone()
    }

    async fn generate_audience(
        &self,
        _website_url: &str,
    ) -> Result<Option<TargetAudience>, ApiError> {
        self.audience.lock().unwrap().clone()
    }

    async fn launch_agents(
        &self,
        website_url: &str,
        audience: Option<&TargetAudience>,
    ) -> Result<LaunchResponse, ApiError> {
        self.launched_with
            .lock()
            .unwrap()
            .push((website_url.to_string(), audience.cloned()));

        let delay = *self.launch_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.launch.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatApi for FakeBackend {
    async fn start_conversation(&self, agent_id: i64) -> Result<String, ApiError> {
        if let Some(error) = self.chat_error.lock().unwrap().clone() {
            return Err(error);
        }
        Ok(format!("conv-{}", agent_id))
    }

    async fn send_message(
        &self,
        agent_id: i64,
        message: &str,
        history: &[ChatMessage],
    ) -> Result<ChatReply, ApiError> {
        if let Some(error) = self.chat_error.lock().unwrap().clone() {
            return Err(error);
        }
        self.sent_histories.lock().unwrap().push(history.to_vec());
        Ok(ChatReply {
            message: format!("You said: {}", message),
            agent_name: Some(format!("Agent {}", agent_id)),
            agent_emoji: None,
        })
    }
}

/// An agent that has not produced a review yet.
pub fn pending_agent(id: i64, name: &str) -> AgentRecord {
    AgentRecord {
        id,
        name: name.to_string(),
        age: 30,
        gender: "female".to_string(),
        occupation: "Engineer".to_string(),
        ..Default::default()
    }
}

/// A completed agent whose four ratings all equal `overall`.
pub fn completed_agent(id: i64, name: &str, overall: f64, review: &str) -> AgentRecord {
    AgentRecord {
        status: crate::models::AgentStatus::Completed,
        ratings: Some(crate::models::Ratings {
            overall,
            clarity: overall,
            ux: overall,
            value_proposition: overall,
        }),
        review: Some(review.to_string()),
        ..pending_agent(id, name)
    }
}
