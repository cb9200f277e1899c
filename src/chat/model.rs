//! Chat data model: transcript messages and stored conversations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tools::ToolCall;

/// Who authored a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One entry of the in-memory chat transcript. Not persisted by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub content: String,
    pub role: ChatRole,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            role,
            created_at: Utc::now(),
            conversation_id: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }

    /// Builder: tag with a conversation id.
    pub fn in_conversation(mut self, conversation_id: Option<String>) -> Self {
        self.conversation_id = conversation_id;
        self
    }
}

/// Body of `POST /api/{user}/chat`. `conversation_id` is always serialized,
/// as `null` when starting a new conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub conversation_id: Option<String>,
}

/// A chat turn's result after tool calls have been normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub response: String,
    pub conversation_id: String,
    pub tool_calls: Vec<ToolCall>,
}

/// Conversation summary from `GET /api/{user}/conversations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub conversation_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(deserialize_with = "crate::timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "crate::timestamp::deserialize")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub status: Option<String>,
}

/// A persisted message inside a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub message_id: String,
    pub sender_type: String,
    pub content: String,
    #[serde(deserialize_with = "crate::timestamp::deserialize")]
    pub timestamp: DateTime<Utc>,
}

impl StoredMessage {
    /// Convert into a transcript entry. Anything not sent by the user is shown
    /// as an assistant message.
    pub fn into_chat_message(self, conversation_id: &str) -> ChatMessage {
        let role = if self.sender_type.eq_ignore_ascii_case("user") {
            ChatRole::User
        } else {
            ChatRole::Assistant
        };
        ChatMessage {
            id: self.message_id,
            content: self.content,
            role,
            created_at: self.timestamp,
            conversation_id: Some(conversation_id.to_string()),
        }
    }
}

/// Conversation with its full message history from
/// `GET /api/{user}/conversations/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationDetail {
    pub conversation_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(deserialize_with = "crate::timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "crate::timestamp::deserialize")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub messages: Vec<StoredMessage>,
}
