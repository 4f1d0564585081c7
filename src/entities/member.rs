//! GroupMember entity - one row per (group, user) pair.

use super::enums::MemberRole;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct GroupMember {
    pub id: Uuid,
    pub group_id: Uuid,
    pub user_id: Uuid,
    // Cached from the identity service, refreshed opportunistically.
    pub username: String,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}
