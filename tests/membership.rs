//! Membership: join paths, the (group, user) uniqueness invariant, roles,
//! and the no-existence-leak authorization contract.

mod common;

use chat_core::entities::MemberRole;
use chat_core::{ChatError, services};
use common::*;
use sqlx::SqlitePool;
use uuid::Uuid;

#[sqlx::test]
async fn joining_a_private_group_requires_the_right_code(pool: SqlitePool) -> sqlx::Result<()> {
    let state = test_state(pool);
    let alice = user("alice");
    let bob = user("bob");
    let group = create_private_group(&state, &alice, "secret plans").await;
    let code = group.invite_code.clone().unwrap();

    // No code at all.
    let err = services::join(&state, &bob, group.id, None).await.unwrap_err();
    assert_eq!(err, ChatError::InvalidInviteCode);

    // A code belonging to a different group.
    let other = create_private_group(&state, &alice, "other plans").await;
    let err = services::join(&state, &bob, group.id, other.invite_code.as_deref())
        .await
        .unwrap_err();
    assert_eq!(err, ChatError::InvalidInviteCode);

    // The right code.
    let member = services::join(&state, &bob, group.id, Some(&code))
        .await
        .unwrap();
    assert_eq!(member.role, MemberRole::Member);
    assert_eq!(member.user_id, bob.user_id);
    Ok(())
}

#[sqlx::test]
async fn public_groups_ignore_invite_codes(pool: SqlitePool) -> sqlx::Result<()> {
    let state = test_state(pool);
    let alice = user("alice");
    let bob = user("bob");
    let group = create_public_group(&state, &alice, "town square").await;

    let member = services::join(&state, &bob, group.id, Some("whatever"))
        .await
        .unwrap();
    assert_eq!(member.group_id, group.id);
    Ok(())
}

#[sqlx::test]
async fn joining_twice_is_already_member_not_a_silent_success(pool: SqlitePool) -> sqlx::Result<()> {
    let state = test_state(pool.clone());
    let alice = user("alice");
    let bob = user("bob");
    let group = create_public_group(&state, &alice, "town square").await;

    services::join(&state, &bob, group.id, None).await.unwrap();
    let err = services::join(&state, &bob, group.id, None).await.unwrap_err();
    assert_eq!(err, ChatError::AlreadyMember);

    let rows: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM group_members WHERE group_id = ? AND user_id = ?",
    )
    .bind(group.id)
    .bind(bob.user_id)
    .fetch_one(&pool)
    .await?;
    assert_eq!(rows, 1);
    Ok(())
}

#[sqlx::test]
async fn leave_requires_membership(pool: SqlitePool) -> sqlx::Result<()> {
    let state = test_state(pool);
    let alice = user("alice");
    let bob = user("bob");
    let group = create_public_group(&state, &alice, "town square").await;

    let err = services::leave(&state, &bob, group.id).await.unwrap_err();
    assert_eq!(err, ChatError::NotAMember);

    services::join(&state, &bob, group.id, None).await.unwrap();
    services::leave(&state, &bob, group.id).await.unwrap();
    let err = services::leave(&state, &bob, group.id).await.unwrap_err();
    assert_eq!(err, ChatError::NotAMember);
    Ok(())
}

#[sqlx::test]
async fn the_sole_admin_may_leave(pool: SqlitePool) -> sqlx::Result<()> {
    let state = test_state(pool);
    let alice = user("alice");
    let bob = user("bob");
    let group = create_public_group(&state, &alice, "town square").await;
    services::join(&state, &bob, group.id, None).await.unwrap();

    services::leave(&state, &alice, group.id).await.unwrap();

    let members = services::list_members(&state, &bob, group.id).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].role, MemberRole::Member);
    Ok(())
}

#[sqlx::test]
async fn the_default_group_cannot_be_left(pool: SqlitePool) -> sqlx::Result<()> {
    let state = test_state(pool);
    let admin_id = Uuid::new_v4();
    let group = services::ensure_default_group(&state, admin_id, "admin")
        .await
        .unwrap();
    let alice = user("alice");
    services::ensure_in_default_group(&state, &alice).await.unwrap();

    let err = services::leave(&state, &alice, group.id).await.unwrap_err();
    assert!(matches!(err, ChatError::Validation(_)));
    Ok(())
}

#[sqlx::test]
async fn default_group_enrollment_is_idempotent(pool: SqlitePool) -> sqlx::Result<()> {
    let state = test_state(pool);
    services::ensure_default_group(&state, Uuid::new_v4(), "admin")
        .await
        .unwrap();
    let alice = user("alice");

    assert!(services::ensure_in_default_group(&state, &alice).await.unwrap());
    assert!(!services::ensure_in_default_group(&state, &alice).await.unwrap());
    Ok(())
}

#[sqlx::test]
async fn set_role_is_admin_only(pool: SqlitePool) -> sqlx::Result<()> {
    let state = test_state(pool);
    let alice = user("alice");
    let bob = user("bob");
    let carol = user("carol");
    let group = create_public_group(&state, &alice, "town square").await;
    services::join(&state, &bob, group.id, None).await.unwrap();
    services::join(&state, &carol, group.id, None).await.unwrap();

    let err = services::set_role(&state, &bob, group.id, carol.user_id, MemberRole::Admin)
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::NotAuthorized(_)));

    services::set_role(&state, &alice, group.id, bob.user_id, MemberRole::Admin)
        .await
        .unwrap();
    let members = services::list_members(&state, &alice, group.id).await.unwrap();
    let bob_row = members.iter().find(|m| m.user_id == bob.user_id).unwrap();
    assert_eq!(bob_row.role, MemberRole::Admin);
    Ok(())
}

#[sqlx::test]
async fn remove_member_is_admin_only(pool: SqlitePool) -> sqlx::Result<()> {
    let state = test_state(pool);
    let alice = user("alice");
    let bob = user("bob");
    let carol = user("carol");
    let group = create_public_group(&state, &alice, "town square").await;
    services::join(&state, &bob, group.id, None).await.unwrap();
    services::join(&state, &carol, group.id, None).await.unwrap();

    let err = services::remove_member(&state, &bob, group.id, carol.user_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::NotAuthorized(_)));

    services::remove_member(&state, &alice, group.id, carol.user_id)
        .await
        .unwrap();
    let members = services::list_members(&state, &alice, group.id).await.unwrap();
    assert!(members.iter().all(|m| m.user_id != carol.user_id));
    Ok(())
}

#[sqlx::test]
async fn members_are_listed_in_join_order(pool: SqlitePool) -> sqlx::Result<()> {
    let state = test_state(pool);
    let alice = user("alice");
    let bob = user("bob");
    let carol = user("carol");
    let group = create_public_group(&state, &alice, "town square").await;
    services::join(&state, &bob, group.id, None).await.unwrap();
    services::join(&state, &carol, group.id, None).await.unwrap();

    let members = services::list_members(&state, &alice, group.id).await.unwrap();
    let usernames: Vec<_> = members.iter().map(|m| m.username.as_str()).collect();
    assert_eq!(usernames, ["alice", "bob", "carol"]);
    assert!(members.windows(2).all(|w| w[0].joined_at <= w[1].joined_at));
    Ok(())
}

#[sqlx::test]
async fn non_members_get_not_authorized_never_not_found(pool: SqlitePool) -> sqlx::Result<()> {
    let state = test_state(pool);
    let alice = user("alice");
    let stranger = user("stranger");
    let group = create_private_group(&state, &alice, "secret plans").await;

    // Every group-scoped operation hides the group's existence.
    let err = services::list_members(&state, &stranger, group.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::NotAuthorized(_)));

    let err = services::list_page(
        &state,
        &stranger,
        group.id,
        chat_core::dtos::PageQuery::first(10),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ChatError::NotAuthorized(_)));

    let err = send_text_err(&state, &stranger, group.id).await;
    assert!(matches!(err, ChatError::NotAuthorized(_)));

    let err = services::unread_count(&state, &stranger, group.id, chrono::Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::NotAuthorized(_)));
    Ok(())
}

async fn send_text_err(
    state: &chat_core::core::AppState,
    caller: &chat_core::Caller,
    group_id: Uuid,
) -> ChatError {
    services::send(
        state,
        caller,
        group_id,
        chat_core::dtos::SendMessageRequest::text("hello"),
    )
    .await
    .unwrap_err()
}
