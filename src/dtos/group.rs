//! Group DTOs.

use crate::entities::ChatGroup;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Outward-facing view of a group.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GroupView {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub is_default: bool,
    pub is_public: bool,
    pub invite_code: Option<String>,
    pub created_by: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_count: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GroupView {
    /// Invite codes are only shown to group admins and the service itself.
    pub fn without_invite_code(mut self) -> Self {
        self.invite_code = None;
        self
    }

    pub fn with_member_count(mut self, count: i64) -> Self {
        self.member_count = Some(count);
        self
    }
}

impl From<ChatGroup> for GroupView {
    fn from(value: ChatGroup) -> Self {
        Self {
            id: value.id,
            name: value.name,
            description: value.description,
            is_default: value.is_default,
            is_public: value.is_public,
            invite_code: value.invite_code,
            created_by: value.created_by,
            member_count: None,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateGroupRequest {
    #[validate(length(min = 1, max = 255, message = "Group name must be between 1 and 255 characters"))]
    pub name: String,

    #[validate(length(max = 4096, message = "Group description must be at most 4096 characters"))]
    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub is_public: bool,
}

/// Partial update; only `Some(_)` fields are touched.
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct UpdateGroupRequest {
    #[validate(length(min = 1, max = 255, message = "Group name must be between 1 and 255 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 4096, message = "Group description must be at most 4096 characters"))]
    pub description: Option<String>,
}
