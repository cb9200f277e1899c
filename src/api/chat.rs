//! Chat and conversation endpoints: `/api/{user}/chat`, `/api/{user}/conversations`.

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;

use crate::api::client::ApiClient;
use crate::chat::model::{ChatReply, ChatRequest, Conversation, ConversationDetail};
use crate::error::ApiError;
use crate::tools::{RawToolCall, ToolCall};

/// Wire shape of a chat response. `tool_calls` may be absent or `null`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub conversation_id: String,
    #[serde(default)]
    pub tool_calls: Option<Vec<RawToolCall>>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl From<ChatResponse> for ChatReply {
    fn from(resp: ChatResponse) -> Self {
        Self {
            response: resp.response,
            conversation_id: resp.conversation_id,
            tool_calls: resp
                .tool_calls
                .unwrap_or_default()
                .into_iter()
                .map(ToolCall::from)
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConversationList {
    conversations: Vec<Conversation>,
}

/// Backend chat operations.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Send one user message and receive the assistant's reply.
    async fn send_message(&self, user_id: &str, request: &ChatRequest)
        -> Result<ChatReply, ApiError>;

    /// List a user's conversations, most recently updated first.
    async fn list_conversations(
        &self,
        user_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Conversation>, ApiError>;

    /// Fetch one conversation with its messages.
    async fn get_conversation(
        &self,
        user_id: &str,
        conversation_id: &str,
    ) -> Result<ConversationDetail, ApiError>;
}

#[async_trait]
impl ChatApi for ApiClient {
    async fn send_message(
        &self,
        user_id: &str,
        request: &ChatRequest,
    ) -> Result<ChatReply, ApiError> {
        let body = serde_json::to_value(request).map_err(|e| ApiError::Request(e.to_string()))?;
        let resp: ChatResponse = self
            .request(Method::POST, &["api", user_id, "chat"], &[], Some(&body))
            .await?;
        Ok(resp.into())
    }

    async fn list_conversations(
        &self,
        user_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Conversation>, ApiError> {
        let list: ConversationList = self
            .request(
                Method::GET,
                &["api", user_id, "conversations"],
                &[("limit", limit.to_string()), ("offset", offset.to_string())],
                None,
            )
            .await?;
        Ok(list.conversations)
    }

    async fn get_conversation(
        &self,
        user_id: &str,
        conversation_id: &str,
    ) -> Result<ConversationDetail, ApiError> {
        self.request(
            Method::GET,
            &["api", user_id, "conversations", conversation_id],
            &[],
            None,
        )
        .await
    }
}
