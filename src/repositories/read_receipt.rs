//! ReadReceiptRepository - storage operations for read progress.

use crate::entities::ReadReceipt;
use chrono::{DateTime, Utc};
use sqlx::{Error, SqlitePool};
use uuid::Uuid;

pub struct ReadReceiptRepository {
    connection_pool: SqlitePool,
}

impl ReadReceiptRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    /// Idempotent mark-read. `UNIQUE(message_id, user_id)` turns a repeat
    /// into a conflict no-op, so the stored `read_at` is always the first
    /// read's timestamp. Returns whether a row was created.
    pub async fn insert_if_absent(
        &self,
        message_id: &Uuid,
        user_id: &Uuid,
        read_at: DateTime<Utc>,
    ) -> Result<bool, Error> {
        let affected = sqlx::query(
            r#"
            INSERT INTO message_read_status (id, message_id, user_id, read_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(message_id)
        .bind(user_id)
        .bind(read_at)
        .execute(&self.connection_pool)
        .await?
        .rows_affected();

        Ok(affected == 1)
    }

    pub async fn find_by_message_and_user(
        &self,
        message_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<Option<ReadReceipt>, Error> {
        sqlx::query_as::<_, ReadReceipt>(
            "SELECT * FROM message_read_status WHERE message_id = ? AND user_id = ?",
        )
        .bind(message_id)
        .bind(user_id)
        .fetch_optional(&self.connection_pool)
        .await
    }

    /// Messages in a group since `since` that the user has not read.
    /// Tombstoned messages are not counted as unread.
    pub async fn count_unread(
        &self,
        group_id: &Uuid,
        user_id: &Uuid,
        since: DateTime<Utc>,
    ) -> Result<i64, Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM messages
            WHERE group_id = ?
              AND created_at >= ?
              AND is_deleted = 0
              AND id NOT IN (
                  SELECT message_id FROM message_read_status WHERE user_id = ?
              )
            "#,
        )
        .bind(group_id)
        .bind(since)
        .bind(user_id)
        .fetch_one(&self.connection_pool)
        .await
    }
}
