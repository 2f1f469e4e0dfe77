//! HTTP client for the review backend.

use crate::api::{ChatApi, LaunchApi, SnapshotSource, TaskStatusSource};
use crate::error::ApiError;
use crate::models::{
    AgentRecord, AudienceRequest, AudienceResponse, ChatMessage, ChatReply, CheckLinkRequest,
    CheckLinkResponse, LaunchRequest, LaunchResponse, SendMessageRequest,
    StartConversationRequest, StartConversationResponse, TargetAudience, TaskStatus,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Thin wrapper over `reqwest` bound to one backend base URL.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    timeout_seconds: u64,
}

impl BackendClient {
    /// Create a client for `base_url` with a per-request timeout.
    pub fn new(base_url: &str, timeout_seconds: u64) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| ApiError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_seconds,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and decode a JSON body, mapping every failure to `ApiError`.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(e, &self.base_url, self.timeout_seconds))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl SnapshotSource for BackendClient {
    async fn fetch_agents(&self, task_id: Option<&str>) -> Result<Vec<AgentRecord>, ApiError> {
        let mut request = self.http.get(self.url("/api/agents/"));
        if let Some(task_id) = task_id {
            request = request.query(&[("task_id", task_id)]);
        }
        self.send(request).await
    }
}

#[async_trait]
impl TaskStatusSource for BackendClient {
    async fn fetch_task_status(&self, task_id: &str) -> Result<TaskStatus, ApiError> {
        let request = self
            .http
            .get(self.url(&format!("/api/agents/ai-status/{}", task_id)));
        self.send(request).await
    }
}

#[async_trait]
impl LaunchApi for BackendClient {
    async fn check_link(&self, url: &str) -> Result<bool, ApiError> {
        let request = self
            .http
            .post(self.url("/api/evaluations/check-link"))
            .json(&CheckLinkRequest { url });

        let response: CheckLinkResponse = self.send(request).await?;
        Ok(response.is_valid)
    }

    async fn generate_audience(
        &self,
        website_url: &str,
    ) -> Result<Option<TargetAudience>, ApiError> {
        let request = self
            .http
            .post(self.url("/api/target-audience/generate"))
            .json(&AudienceRequest { website_url });

        let response: AudienceResponse = self.send(request).await?;
        if response.success {
            Ok(response.data)
        } else {
            Ok(None)
        }
    }

    async fn launch_agents(
        &self,
        website_url: &str,
        audience: Option<&TargetAudience>,
    ) -> Result<LaunchResponse, ApiError> {
        let request = self
            .http
            .post(self.url("/api/agents/ai-launch"))
            .json(&LaunchRequest {
                website_url,
                target_audience: audience,
            });

        let response: LaunchResponse = self.send(request).await?;
        debug!(
            "Launch accepted: task {} ({}) {}",
            response.task_id,
            response.status.as_deref().unwrap_or("unknown"),
            response.message.as_deref().unwrap_or_default()
        );
        Ok(response)
    }
}

#[async_trait]
impl ChatApi for BackendClient {
    async fn start_conversation(&self, agent_id: i64) -> Result<String, ApiError> {
        let request = self
            .http
            .post(self.url("/api/chat/start-conversation"))
            .json(&StartConversationRequest { agent_id });

        let response: StartConversationResponse = self.send(request).await?;
        debug!(
            "Started conversation {} with agent {}",
            response.conversation_id, agent_id
        );
        Ok(response.conversation_id)
    }

    async fn send_message(
        &self,
        agent_id: i64,
        message: &str,
        history: &[ChatMessage],
    ) -> Result<ChatReply, ApiError> {
        let request = self
            .http
            .post(self.url("/api/chat/send-message"))
            .json(&SendMessageRequest {
                agent_id,
                message,
                conversation_history: history,
            });

        self.send(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash() {
        let client = BackendClient::new("http://localhost:8000/", 5).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(
            client.url("/api/agents/"),
            "http://localhost:8000/api/agents/"
        );
    }

    #[test]
    fn test_launch_request_body() {
        let audience = TargetAudience::default();
        let body = serde_json::to_value(LaunchRequest {
            website_url: "https://example.com",
            target_audience: Some(&audience),
        })
        .unwrap();
        assert_eq!(body["website_url"], "https://example.com");
        assert_eq!(body["target_audience"]["ageRange"], serde_json::json!([25, 45]));

        let body = serde_json::to_value(LaunchRequest {
            website_url: "https://example.com",
            target_audience: None,
        })
        .unwrap();
        assert!(body["target_audience"].is_null());
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_connect_error() {
        // Port 1 is reserved and closed on any sane test host.
        let client = BackendClient::new("http://127.0.0.1:1", 2).unwrap();
        let err = client.fetch_agents(None).await.unwrap_err();
        assert!(err.is_transient());
    }
}
