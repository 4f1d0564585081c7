//! ReadReceiptTracker - idempotent per-user read progress.

use crate::core::{AppState, Caller, ChatError, require_member};
use crate::entities::ReadReceipt;
use crate::repositories::Read;
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Marks a message read by the caller. Upsert semantics: the receipt is
/// created if absent, and re-marking is a no-op that does not move
/// `read_at`, the time of first read being authoritative.
#[instrument(skip(state, caller), fields(message_id = %message_id, user_id = %caller.user_id))]
pub async fn mark_read(
    state: &AppState,
    caller: &Caller,
    message_id: Uuid,
) -> Result<ReadReceipt, ChatError> {
    let message = state
        .msg
        .read(&message_id)
        .await?
        .ok_or(ChatError::NotFound("message"))?;

    require_member(state, &message.group_id, caller).await?;

    let created = state
        .receipts
        .insert_if_absent(&message_id, &caller.user_id, Utc::now())
        .await?;
    debug!(created, "Read receipt upserted");

    state
        .receipts
        .find_by_message_and_user(&message_id, &caller.user_id)
        .await?
        .ok_or_else(|| ChatError::Constraint("read receipt vanished after upsert".to_string()))
}

/// Batch form of `mark_read`, one membership check per distinct group.
/// Returns how many receipts were newly created.
#[instrument(skip(state, caller, message_ids), fields(user_id = %caller.user_id))]
pub async fn mark_read_many(
    state: &AppState,
    caller: &Caller,
    message_ids: &[Uuid],
) -> Result<usize, ChatError> {
    let mut verified_groups: Vec<Uuid> = Vec::new();
    let mut created = 0;
    let now = Utc::now();

    for message_id in message_ids {
        let message = state
            .msg
            .read(message_id)
            .await?
            .ok_or(ChatError::NotFound("message"))?;

        if !verified_groups.contains(&message.group_id) {
            require_member(state, &message.group_id, caller).await?;
            verified_groups.push(message.group_id);
        }

        if state
            .receipts
            .insert_if_absent(message_id, &caller.user_id, now)
            .await?
        {
            created += 1;
        }
    }

    info!(created, total = message_ids.len(), "Marked messages read");
    Ok(created)
}

/// Messages in the group created at or after `since` that the caller has
/// not read. Tombstones do not count.
#[instrument(skip(state, caller), fields(group_id = %group_id, user_id = %caller.user_id))]
pub async fn unread_count(
    state: &AppState,
    caller: &Caller,
    group_id: Uuid,
    since: DateTime<Utc>,
) -> Result<i64, ChatError> {
    require_member(state, &group_id, caller).await?;

    let count = state
        .receipts
        .count_unread(&group_id, &caller.user_id, since)
        .await?;
    debug!(count, "Unread count computed");
    Ok(count)
}
