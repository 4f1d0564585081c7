//! GroupRepository - storage operations for chat groups.

use super::{Create, Read};
use crate::entities::{ChatGroup, MemberRole};
use chrono::{DateTime, Utc};
use sqlx::{Error, SqlitePool};
use uuid::Uuid;

/// Row data for a new non-default group. The creator becomes the group's
/// admin member in the same transaction.
pub struct CreateGroupData {
    pub name: String,
    pub description: String,
    pub is_public: bool,
    pub invite_code: Option<String>,
    pub created_by: Uuid,
    pub creator_username: String,
}

/// Row data for the idempotent default-group ensure.
pub struct EnsureDefaultData {
    pub name: String,
    pub description: String,
    pub admin_id: Uuid,
    pub admin_username: String,
}

pub struct GroupRepository {
    connection_pool: SqlitePool,
}

impl GroupRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    /// Atomic insert-if-absent for the default group, keyed on the partial
    /// unique index over `is_default = 1`. Safe under concurrent first boot
    /// of multiple instances: losers of the race get a conflict no-op and
    /// read back the winner's row. Returns `(group, created)`.
    pub async fn ensure_default(&self, data: &EnsureDefaultData) -> Result<(ChatGroup, bool), Error> {
        let mut tx = self.connection_pool.begin().await?;
        let now = Utc::now();

        let inserted = sqlx::query(
            r#"
            INSERT INTO chat_groups
                (id, name, description, is_default, is_public, invite_code, created_by, created_at, updated_at)
            VALUES (?, ?, ?, 1, 1, NULL, ?, ?, ?)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.admin_id)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let group = sqlx::query_as::<_, ChatGroup>(
            "SELECT * FROM chat_groups WHERE is_default = 1",
        )
        .fetch_one(&mut *tx)
        .await?;

        if inserted == 1 {
            // Seed the bootstrap admin membership alongside the group.
            sqlx::query(
                r#"
                INSERT INTO group_members (id, group_id, user_id, username, role, joined_at)
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(group.id)
            .bind(data.admin_id)
            .bind(&data.admin_username)
            .bind(MemberRole::Admin)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok((group, inserted == 1))
    }

    pub async fn find_default(&self) -> Result<Option<ChatGroup>, Error> {
        sqlx::query_as::<_, ChatGroup>("SELECT * FROM chat_groups WHERE is_default = 1")
            .fetch_optional(&self.connection_pool)
            .await
    }

    pub async fn find_by_invite_code(&self, code: &str) -> Result<Option<ChatGroup>, Error> {
        sqlx::query_as::<_, ChatGroup>("SELECT * FROM chat_groups WHERE invite_code = ?")
            .bind(code)
            .fetch_optional(&self.connection_pool)
            .await
    }

    /// Groups visible to a user: their memberships plus the default group.
    pub async fn find_many_visible_to(&self, user_id: &Uuid) -> Result<Vec<ChatGroup>, Error> {
        sqlx::query_as::<_, ChatGroup>(
            r#"
            SELECT * FROM chat_groups
            WHERE is_default = 1
               OR id IN (SELECT group_id FROM group_members WHERE user_id = ?)
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.connection_pool)
        .await
    }

    pub async fn find_all(&self) -> Result<Vec<ChatGroup>, Error> {
        sqlx::query_as::<_, ChatGroup>("SELECT * FROM chat_groups ORDER BY created_at ASC")
            .fetch_all(&self.connection_pool)
            .await
    }

    /// Partial update of name/description; bumps `updated_at`.
    pub async fn update_fields(
        &self,
        id: &Uuid,
        name: Option<&str>,
        description: Option<&str>,
        updated_at: DateTime<Utc>,
    ) -> Result<ChatGroup, Error> {
        sqlx::query(
            r#"
            UPDATE chat_groups
            SET name = COALESCE(?, name),
                description = COALESCE(?, description),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(updated_at)
        .bind(id)
        .execute(&self.connection_pool)
        .await?;

        self.read(id).await?.ok_or(Error::RowNotFound)
    }

    /// Replaces the invite code. Unique violations propagate so the caller
    /// can retry with a fresh code.
    pub async fn set_invite_code(
        &self,
        id: &Uuid,
        code: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), Error> {
        let affected = sqlx::query(
            "UPDATE chat_groups SET invite_code = ?, updated_at = ? WHERE id = ?",
        )
        .bind(code)
        .bind(updated_at)
        .bind(id)
        .execute(&self.connection_pool)
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(Error::RowNotFound);
        }
        Ok(())
    }
}

impl Create<ChatGroup, CreateGroupData> for GroupRepository {
    /// Group insert and creator's admin membership share one transaction.
    async fn create(&self, data: &CreateGroupData) -> Result<ChatGroup, Error> {
        let mut tx = self.connection_pool.begin().await?;
        let now = Utc::now();
        let group_id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO chat_groups
                (id, name, description, is_default, is_public, invite_code, created_by, created_at, updated_at)
            VALUES (?, ?, ?, 0, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(group_id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.is_public)
        .bind(&data.invite_code)
        .bind(data.created_by)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO group_members (id, group_id, user_id, username, role, joined_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(group_id)
        .bind(data.created_by)
        .bind(&data.creator_username)
        .bind(MemberRole::Admin)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(ChatGroup {
            id: group_id,
            name: data.name.clone(),
            description: data.description.clone(),
            is_default: false,
            is_public: data.is_public,
            invite_code: data.invite_code.clone(),
            created_by: data.created_by,
            created_at: now,
            updated_at: now,
        })
    }
}

impl Read<ChatGroup, Uuid> for GroupRepository {
    async fn read(&self, id: &Uuid) -> Result<Option<ChatGroup>, Error> {
        sqlx::query_as::<_, ChatGroup>("SELECT * FROM chat_groups WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }
}
