//! Query DTOs - pagination cursors.

use crate::dtos::MessageView;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Cursor for message pagination. A boundary `(created_at, id)` pair is
/// stable under concurrent inserts, unlike an offset.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct PageQuery {
    #[serde(default)]
    pub before_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub before_id: Option<Uuid>,
    #[serde(default)]
    pub limit: Option<i64>,
}

impl PageQuery {
    pub fn first(limit: i64) -> Self {
        Self {
            before_at: None,
            before_id: None,
            limit: Some(limit),
        }
    }

    /// Cursor pointing strictly past `oldest`, the last message of the
    /// previously fetched page.
    pub fn older_than(oldest: &MessageView, limit: i64) -> Self {
        Self {
            before_at: Some(oldest.created_at),
            before_id: Some(oldest.id),
            limit: Some(limit),
        }
    }
}
