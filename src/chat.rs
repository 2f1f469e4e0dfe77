//! Follow-up conversations with a single reviewer agent.

use crate::api::ChatApi;
use crate::error::ApiError;
use crate::models::{ChatMessage, ChatReply};
use chrono::Utc;
use tracing::debug;

/// An open conversation and everything said in it so far.
#[derive(Debug, Clone)]
pub struct Conversation {
    agent_id: i64,
    conversation_id: String,
    history: Vec<ChatMessage>,
}

impl Conversation {
    /// Open a conversation with `agent_id`.
    pub async fn start<C: ChatApi>(api: &C, agent_id: i64) -> Result<Self, ApiError> {
        let conversation_id = api.start_conversation(agent_id).await?;
        Ok(Self {
            agent_id,
            conversation_id,
            history: Vec::new(),
        })
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Send `message` with the prior history. Both turns are recorded only
    /// when the agent answered.
    pub async fn send<C: ChatApi>(&mut self, api: &C, message: &str) -> Result<ChatReply, ApiError> {
        let reply = api
            .send_message(self.agent_id, message, &self.history)
            .await?;
        self.record_exchange(message, &reply);
        Ok(reply)
    }

    fn record_exchange(&mut self, message: &str, reply: &ChatReply) {
        let timestamp = Some(Utc::now().to_rfc3339());
        self.history.push(ChatMessage {
            role: "user".to_string(),
            content: message.to_string(),
            timestamp: timestamp.clone(),
        });
        self.history.push(ChatMessage {
            role: "assistant".to_string(),
            content: reply.message.clone(),
            timestamp,
        });
        debug!(
            "Conversation {} now has {} messages",
            self.conversation_id,
            self.history.len()
        );
    }
}
