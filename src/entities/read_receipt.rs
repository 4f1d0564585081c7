//! ReadReceipt entity - per-user read progress, one row per (message, user).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct ReadReceipt {
    pub id: Uuid,
    pub message_id: Uuid,
    pub user_id: Uuid,
    // First-read timestamp; re-reads never move it.
    pub read_at: DateTime<Utc>,
}
