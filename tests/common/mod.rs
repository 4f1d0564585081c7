//! Shared helpers for the integration tests.
//!
//! `#[sqlx::test]` provisions an isolated database per test and applies
//! `migrations/`; fixtures are built through the service API.

#![allow(dead_code)]

use chat_core::core::AppState;
use chat_core::dtos::{CreateGroupRequest, GroupView, SendMessageRequest};
use chat_core::{Caller, Config, services};
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

pub fn test_state(pool: SqlitePool) -> Arc<AppState> {
    Arc::new(AppState::new(pool, &Config::default()))
}

/// An identified external user.
pub fn user(name: &str) -> Caller {
    Caller::user(Uuid::new_v4(), name)
}

/// The backend acting as itself.
pub fn service() -> Caller {
    Caller::service(Uuid::new_v4(), "backend")
}

pub async fn create_public_group(state: &AppState, creator: &Caller, name: &str) -> GroupView {
    services::create_group(
        state,
        creator,
        CreateGroupRequest {
            name: name.to_string(),
            description: String::new(),
            is_public: true,
        },
    )
    .await
    .expect("group creation failed")
}

pub async fn create_private_group(state: &AppState, creator: &Caller, name: &str) -> GroupView {
    services::create_group(
        state,
        creator,
        CreateGroupRequest {
            name: name.to_string(),
            description: String::new(),
            is_public: false,
        },
    )
    .await
    .expect("group creation failed")
}

pub async fn send_text(
    state: &AppState,
    sender: &Caller,
    group_id: Uuid,
    content: &str,
) -> chat_core::dtos::MessageView {
    services::send(state, sender, group_id, SendMessageRequest::text(content))
        .await
        .expect("send failed")
}
