//! Membership DTOs.

use crate::entities::{GroupMember, MemberRole};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MemberView {
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}

impl From<GroupMember> for MemberView {
    fn from(value: GroupMember) -> Self {
        Self {
            group_id: value.group_id,
            user_id: value.user_id,
            username: value.username,
            role: value.role,
            joined_at: value.joined_at,
        }
    }
}
