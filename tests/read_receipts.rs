//! Read receipts: idempotent marking, batch marking and unread counts.

mod common;

use chat_core::{ChatError, services};
use chrono::{TimeZone, Utc};
use common::*;
use sqlx::SqlitePool;
use uuid::Uuid;

fn epoch() -> chrono::DateTime<Utc> {
    Utc.timestamp_opt(0, 0).single().unwrap()
}

#[sqlx::test]
async fn marking_read_is_idempotent(pool: SqlitePool) -> sqlx::Result<()> {
    let state = test_state(pool.clone());
    let alice = user("alice");
    let bob = user("bob");
    let group = create_public_group(&state, &alice, "town square").await;
    services::join(&state, &bob, group.id, None).await.unwrap();
    let m1 = send_text(&state, &alice, group.id, "hello").await;

    let first = services::mark_read(&state, &bob, m1.id).await.unwrap();
    let second = services::mark_read(&state, &bob, m1.id).await.unwrap();

    // Re-marking neither creates a second row nor moves read_at.
    assert_eq!(first.id, second.id);
    assert_eq!(first.read_at, second.read_at);

    let rows: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM message_read_status WHERE message_id = ?")
            .bind(m1.id)
            .fetch_one(&pool)
            .await?;
    assert_eq!(rows, 1);
    Ok(())
}

#[sqlx::test]
async fn unread_counts_are_per_user(pool: SqlitePool) -> sqlx::Result<()> {
    let state = test_state(pool);
    let alice = user("alice");
    let bob = user("bob");
    let group = create_public_group(&state, &alice, "town square").await;
    services::join(&state, &bob, group.id, None).await.unwrap();

    let baseline_alice = services::unread_count(&state, &alice, group.id, epoch())
        .await
        .unwrap();
    let baseline_bob = services::unread_count(&state, &bob, group.id, epoch())
        .await
        .unwrap();

    let m1 = send_text(&state, &alice, group.id, "morning").await;
    services::mark_read(&state, &alice, m1.id).await.unwrap();

    let for_alice = services::unread_count(&state, &alice, group.id, epoch())
        .await
        .unwrap();
    let for_bob = services::unread_count(&state, &bob, group.id, epoch())
        .await
        .unwrap();
    assert_eq!(for_alice, baseline_alice);
    assert_eq!(for_bob, baseline_bob + 1);
    Ok(())
}

#[sqlx::test]
async fn batch_marking_reports_newly_created_receipts(pool: SqlitePool) -> sqlx::Result<()> {
    let state = test_state(pool);
    let alice = user("alice");
    let bob = user("bob");
    let group = create_public_group(&state, &alice, "town square").await;
    services::join(&state, &bob, group.id, None).await.unwrap();

    let m1 = send_text(&state, &alice, group.id, "one").await;
    let m2 = send_text(&state, &alice, group.id, "two").await;
    let m3 = send_text(&state, &alice, group.id, "three").await;
    services::mark_read(&state, &bob, m2.id).await.unwrap();

    let created = services::mark_read_many(&state, &bob, &[m1.id, m2.id, m3.id])
        .await
        .unwrap();
    assert_eq!(created, 2);

    let unread = services::unread_count(&state, &bob, group.id, m1.created_at)
        .await
        .unwrap();
    assert_eq!(unread, 0);
    Ok(())
}

#[sqlx::test]
async fn non_members_cannot_mark_or_count(pool: SqlitePool) -> sqlx::Result<()> {
    let state = test_state(pool);
    let alice = user("alice");
    let mallory = user("mallory");
    let group = create_public_group(&state, &alice, "town square").await;
    let m1 = send_text(&state, &alice, group.id, "private-ish").await;

    let err = services::mark_read(&state, &mallory, m1.id).await.unwrap_err();
    assert!(matches!(err, ChatError::NotAuthorized(_)));

    let err = services::unread_count(&state, &mallory, group.id, epoch())
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::NotAuthorized(_)));

    let err = services::mark_read_many(&state, &mallory, &[m1.id])
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::NotAuthorized(_)));
    Ok(())
}

#[sqlx::test]
async fn marking_an_unknown_message_is_not_found(pool: SqlitePool) -> sqlx::Result<()> {
    let state = test_state(pool);
    let alice = user("alice");
    create_public_group(&state, &alice, "town square").await;

    let err = services::mark_read(&state, &alice, Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(err, ChatError::NotFound("message"));
    Ok(())
}

#[sqlx::test]
async fn tombstones_do_not_count_as_unread(pool: SqlitePool) -> sqlx::Result<()> {
    let state = test_state(pool);
    let alice = user("alice");
    let bob = user("bob");
    let group = create_public_group(&state, &alice, "town square").await;
    services::join(&state, &bob, group.id, None).await.unwrap();

    let m1 = send_text(&state, &alice, group.id, "soon gone").await;
    let before = services::unread_count(&state, &bob, group.id, m1.created_at)
        .await
        .unwrap();
    assert_eq!(before, 1);

    services::soft_delete(&state, &alice, m1.id).await.unwrap();
    let after = services::unread_count(&state, &bob, group.id, m1.created_at)
        .await
        .unwrap();
    assert_eq!(after, 0);
    Ok(())
}
