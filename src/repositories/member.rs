//! MemberRepository - storage operations for group memberships.

use super::Create;
use crate::entities::{GroupMember, MemberRole};
use chrono::Utc;
use sqlx::{Error, SqlitePool};
use uuid::Uuid;

pub struct CreateMemberData {
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub role: MemberRole,
}

pub struct MemberRepository {
    connection_pool: SqlitePool,
}

impl MemberRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    pub async fn find_by_group_and_user(
        &self,
        group_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<Option<GroupMember>, Error> {
        sqlx::query_as::<_, GroupMember>(
            "SELECT * FROM group_members WHERE group_id = ? AND user_id = ?",
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_optional(&self.connection_pool)
        .await
    }

    /// Members of a group in join order.
    pub async fn find_many_by_group(&self, group_id: &Uuid) -> Result<Vec<GroupMember>, Error> {
        sqlx::query_as::<_, GroupMember>(
            "SELECT * FROM group_members WHERE group_id = ? ORDER BY joined_at ASC, id ASC",
        )
        .bind(group_id)
        .fetch_all(&self.connection_pool)
        .await
    }

    /// All of a user's memberships across groups.
    pub async fn find_many_by_user(&self, user_id: &Uuid) -> Result<Vec<GroupMember>, Error> {
        sqlx::query_as::<_, GroupMember>("SELECT * FROM group_members WHERE user_id = ?")
            .bind(user_id)
            .fetch_all(&self.connection_pool)
            .await
    }

    /// Conflict-tolerant insert; returns whether a row was created. Used
    /// where duplicate membership is the idempotent no-op case rather than
    /// an error (default-group auto-enrollment).
    pub async fn insert_if_absent(&self, data: &CreateMemberData) -> Result<bool, Error> {
        let affected = sqlx::query(
            r#"
            INSERT INTO group_members (id, group_id, user_id, username, role, joined_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.group_id)
        .bind(data.user_id)
        .bind(&data.username)
        .bind(data.role)
        .bind(Utc::now())
        .execute(&self.connection_pool)
        .await?
        .rows_affected();

        Ok(affected == 1)
    }

    /// Removes a membership; returns whether a row existed.
    pub async fn delete_by_group_and_user(
        &self,
        group_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<bool, Error> {
        let affected = sqlx::query("DELETE FROM group_members WHERE group_id = ? AND user_id = ?")
            .bind(group_id)
            .bind(user_id)
            .execute(&self.connection_pool)
            .await?
            .rows_affected();

        Ok(affected == 1)
    }

    /// Changes a member's role; returns whether a row existed.
    pub async fn set_role(
        &self,
        group_id: &Uuid,
        user_id: &Uuid,
        role: MemberRole,
    ) -> Result<bool, Error> {
        let affected = sqlx::query(
            "UPDATE group_members SET role = ? WHERE group_id = ? AND user_id = ?",
        )
        .bind(role)
        .bind(group_id)
        .bind(user_id)
        .execute(&self.connection_pool)
        .await?
        .rows_affected();

        Ok(affected == 1)
    }

    /// Opportunistic refresh of the cached username across all of a user's
    /// memberships.
    pub async fn refresh_username(&self, user_id: &Uuid, username: &str) -> Result<(), Error> {
        sqlx::query("UPDATE group_members SET username = ? WHERE user_id = ? AND username <> ?")
            .bind(username)
            .bind(user_id)
            .bind(username)
            .execute(&self.connection_pool)
            .await?;
        Ok(())
    }

    pub async fn count_by_group(&self, group_id: &Uuid) -> Result<i64, Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM group_members WHERE group_id = ?")
            .bind(group_id)
            .fetch_one(&self.connection_pool)
            .await
    }

    pub async fn count_admins(&self, group_id: &Uuid) -> Result<i64, Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM group_members WHERE group_id = ? AND role = ?",
        )
        .bind(group_id)
        .bind(MemberRole::Admin)
        .fetch_one(&self.connection_pool)
        .await
    }
}

impl Create<GroupMember, CreateMemberData> for MemberRepository {
    /// Plain insert relying on `UNIQUE(group_id, user_id)`; callers
    /// translate a unique violation into the already-member signal.
    async fn create(&self, data: &CreateMemberData) -> Result<GroupMember, Error> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO group_members (id, group_id, user_id, username, role, joined_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(data.group_id)
        .bind(data.user_id)
        .bind(&data.username)
        .bind(data.role)
        .bind(now)
        .execute(&self.connection_pool)
        .await?;

        Ok(GroupMember {
            id,
            group_id: data.group_id,
            user_id: data.user_id,
            username: data.username.clone(),
            role: data.role,
            joined_at: now,
        })
    }
}
