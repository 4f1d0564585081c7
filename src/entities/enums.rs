//! Enumerations backing the TEXT-encoded columns.

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Admin,
    Member,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Text,
    System,
    AdminAnnouncement,
}

impl MessageType {
    /// System-authored types are the only ones stored without a sender.
    pub fn system_authored(&self) -> bool {
        matches!(self, MessageType::System | MessageType::AdminAnnouncement)
    }
}
