//! MessageRepository - storage operations for messages.

use super::{Create, Read};
use crate::entities::{Message, MessageType};
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{Error, SqlitePool};
use uuid::Uuid;

pub struct CreateMessageData {
    pub group_id: Uuid,
    pub sender_id: Option<Uuid>,
    pub sender_username: Option<String>,
    pub content: String,
    pub message_type: MessageType,
    pub reply_to_id: Option<Uuid>,
    pub metadata: Value,
}

pub struct MessageRepository {
    connection_pool: SqlitePool,
}

impl MessageRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    /// One page of a group's history, newest first, `id` as the tie-break
    /// for equal timestamps so the order is total and matches the feed.
    ///
    /// The cursor is the `(created_at, id)` pair of the last message of the
    /// previous page; rows strictly older than it are returned. Deleted
    /// messages are included (the caller renders tombstones).
    pub async fn find_page(
        &self,
        group_id: &Uuid,
        before: Option<(DateTime<Utc>, Uuid)>,
        limit: i64,
    ) -> Result<Vec<Message>, Error> {
        let messages = if let Some((before_at, before_id)) = before {
            sqlx::query_as::<_, Message>(
                r#"
                SELECT * FROM messages
                WHERE group_id = ?
                  AND (created_at < ? OR (created_at = ? AND id < ?))
                ORDER BY created_at DESC, id DESC
                LIMIT ?
                "#,
            )
            .bind(group_id)
            .bind(before_at)
            .bind(before_at)
            .bind(before_id)
            .bind(limit)
            .fetch_all(&self.connection_pool)
            .await?
        } else {
            sqlx::query_as::<_, Message>(
                r#"
                SELECT * FROM messages
                WHERE group_id = ?
                ORDER BY created_at DESC, id DESC
                LIMIT ?
                "#,
            )
            .bind(group_id)
            .bind(limit)
            .fetch_all(&self.connection_pool)
            .await?
        };

        Ok(messages)
    }

    /// Direct replies to a message, oldest first.
    pub async fn find_replies(&self, message_id: &Uuid) -> Result<Vec<Message>, Error> {
        sqlx::query_as::<_, Message>(
            r#"
            SELECT * FROM messages
            WHERE reply_to_id = ?
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(message_id)
        .fetch_all(&self.connection_pool)
        .await
    }

    /// Applies an edit: new content, edit flags, `updated_at` bump.
    /// `created_at` is untouched so pagination order is stable under edits.
    pub async fn apply_edit(
        &self,
        id: &Uuid,
        content: &str,
        edited_at: DateTime<Utc>,
    ) -> Result<Message, Error> {
        let affected = sqlx::query(
            r#"
            UPDATE messages
            SET content = ?, is_edited = 1, edited_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(content)
        .bind(edited_at)
        .bind(edited_at)
        .bind(id)
        .execute(&self.connection_pool)
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(Error::RowNotFound);
        }
        self.read(id).await?.ok_or(Error::RowNotFound)
    }

    /// Soft delete: flips the flag and bumps `updated_at`. Content stays in
    /// storage; redaction happens on the read path.
    pub async fn apply_soft_delete(
        &self,
        id: &Uuid,
        deleted_at: DateTime<Utc>,
    ) -> Result<Message, Error> {
        let affected = sqlx::query(
            "UPDATE messages SET is_deleted = 1, updated_at = ? WHERE id = ?",
        )
        .bind(deleted_at)
        .bind(id)
        .execute(&self.connection_pool)
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(Error::RowNotFound);
        }
        self.read(id).await?.ok_or(Error::RowNotFound)
    }
}

impl Create<Message, CreateMessageData> for MessageRepository {
    async fn create(&self, data: &CreateMessageData) -> Result<Message, Error> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO messages
                (id, group_id, sender_id, sender_username, content, message_type,
                 reply_to_id, metadata, is_edited, edited_at, is_deleted, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, NULL, 0, ?, ?)
            "#,
        )
        .bind(id)
        .bind(data.group_id)
        .bind(data.sender_id)
        .bind(&data.sender_username)
        .bind(&data.content)
        .bind(data.message_type)
        .bind(data.reply_to_id)
        .bind(Json(&data.metadata))
        .bind(now)
        .bind(now)
        .execute(&self.connection_pool)
        .await?;

        Ok(Message {
            id,
            group_id: data.group_id,
            sender_id: data.sender_id,
            sender_username: data.sender_username.clone(),
            content: data.content.clone(),
            message_type: data.message_type,
            reply_to_id: data.reply_to_id,
            metadata: Json(data.metadata.clone()),
            is_edited: false,
            edited_at: None,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        })
    }
}

impl Read<Message, Uuid> for MessageRepository {
    async fn read(&self, id: &Uuid) -> Result<Option<Message>, Error> {
        sqlx::query_as::<_, Message>("SELECT * FROM messages WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }
}
