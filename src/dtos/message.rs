//! Message DTOs.

use crate::entities::{Message, MessageType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

/// Placeholder shown in place of soft-deleted content on non-privileged
/// read paths. The stored content is never altered.
pub const DELETED_PLACEHOLDER: &str = "[message deleted]";

/// Outward-facing view of a message.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MessageView {
    pub id: Uuid,
    pub group_id: Uuid,
    pub sender_id: Option<Uuid>,
    pub sender_username: Option<String>,
    pub content: String,
    pub message_type: MessageType,
    pub reply_to_id: Option<Uuid>,
    pub metadata: Value,
    pub is_edited: bool,
    pub edited_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MessageView {
    /// Tombstone rendering: deleted messages keep their position in pages
    /// and threads, but their content is withheld from non-privileged
    /// viewers.
    pub fn redacted(mut self) -> Self {
        if self.is_deleted {
            self.content = DELETED_PLACEHOLDER.to_string();
        }
        self
    }
}

impl From<Message> for MessageView {
    fn from(value: Message) -> Self {
        Self {
            id: value.id,
            group_id: value.group_id,
            sender_id: value.sender_id,
            sender_username: value.sender_username,
            content: value.content,
            message_type: value.message_type,
            reply_to_id: value.reply_to_id,
            metadata: value.metadata.0,
            is_edited: value.is_edited,
            edited_at: value.edited_at,
            is_deleted: value.is_deleted,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct SendMessageRequest {
    #[validate(length(min = 1, max = 5000, message = "Message content must be between 1 and 5000 characters"))]
    pub content: String,

    #[serde(default = "default_message_type")]
    pub message_type: MessageType,

    #[serde(default)]
    pub reply_to_id: Option<Uuid>,

    #[serde(default)]
    pub metadata: Option<Value>,
}

fn default_message_type() -> MessageType {
    MessageType::Text
}

impl SendMessageRequest {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            message_type: MessageType::Text,
            reply_to_id: None,
            metadata: None,
        }
    }

    pub fn reply_to(mut self, message_id: Uuid) -> Self {
        self.reply_to_id = Some(message_id);
        self
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct EditMessageRequest {
    #[validate(length(min = 1, max = 5000, message = "Message content must be between 1 and 5000 characters"))]
    pub content: String,
}
