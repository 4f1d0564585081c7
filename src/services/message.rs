//! MessageStore - send, edit, soft delete, pagination and threads.

use crate::core::{AppState, Caller, ChatError, require_member, require_role};
use crate::dtos::{EditMessageRequest, MessageView, PageQuery, SendMessageRequest};
use crate::entities::{GroupMember, MemberRole, Message, MessageType};
use crate::feed::MessageEvent;
use crate::repositories::{Create, CreateMessageData, Read};
use chrono::Utc;
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Maximum page size a caller may request.
const MAX_PAGE_SIZE: i64 = 200;

/// Sends a message into a group.
///
/// External callers must be current members; an `AdminAnnouncement`
/// additionally requires the admin role. `System` messages are reserved for
/// the service itself and are stored sender-less. A `reply_to_id` must name
/// a non-deleted message in the same group. After the insert commits the
/// message is handed to the ChangeFeed.
#[instrument(skip(state, caller, request), fields(group_id = %group_id, user_id = %caller.user_id))]
pub async fn send(
    state: &AppState,
    caller: &Caller,
    group_id: Uuid,
    request: SendMessageRequest,
) -> Result<MessageView, ChatError> {
    use validator::Validate;
    request.validate()?;

    let system_authored = caller.is_service() && request.message_type.system_authored();

    let (sender_id, sender_username) = if system_authored {
        (None, None)
    } else {
        let member = require_member(state, &group_id, caller).await?;
        match request.message_type {
            MessageType::System => {
                warn!("External caller attempted to send a system message");
                return Err(ChatError::NotAuthorized(
                    "system messages are service-authored",
                ));
            }
            MessageType::AdminAnnouncement => {
                if let Some(member) = &member {
                    require_role(member, &[MemberRole::Admin])?;
                }
            }
            MessageType::Text => {}
        }
        (Some(caller.user_id), Some(caller.username.clone()))
    };

    if let Some(reply_to_id) = request.reply_to_id {
        validate_reply_target(state, &group_id, &reply_to_id).await?;
    }

    let message = state
        .msg
        .create(&CreateMessageData {
            group_id,
            sender_id,
            sender_username,
            content: request.content,
            message_type: request.message_type,
            reply_to_id: request.reply_to_id,
            metadata: request.metadata.unwrap_or_else(|| json!({})),
        })
        .await?;

    info!(message_id = %message.id, "Message stored");
    publish(state, message.clone());
    Ok(MessageView::from(message))
}

/// Stores a sender-less system message and feeds it to subscribers. Used by
/// the group and membership lifecycle paths.
#[instrument(skip(state, content), fields(group_id = %group_id))]
pub async fn send_system_message(
    state: &AppState,
    group_id: Uuid,
    content: impl Into<String>,
) -> Result<MessageView, ChatError> {
    let message = state
        .msg
        .create(&CreateMessageData {
            group_id,
            sender_id: None,
            sender_username: None,
            content: content.into(),
            message_type: MessageType::System,
            reply_to_id: None,
            metadata: json!({}),
        })
        .await?;

    publish(state, message.clone());
    Ok(MessageView::from(message))
}

/// Stores an announcement authored by `sender` without a membership check.
/// Internal to the registry (e.g. new-group announcements into the default
/// group, where the creator need not be a member).
#[instrument(skip(state, sender, content, metadata), fields(group_id = %group_id))]
pub(crate) async fn post_announcement(
    state: &AppState,
    group_id: Uuid,
    sender: &Caller,
    content: String,
    metadata: Value,
) -> Result<MessageView, ChatError> {
    let message = state
        .msg
        .create(&CreateMessageData {
            group_id,
            sender_id: Some(sender.user_id),
            sender_username: Some(sender.username.clone()),
            content,
            message_type: MessageType::AdminAnnouncement,
            reply_to_id: None,
            metadata,
        })
        .await?;

    publish(state, message.clone());
    Ok(MessageView::from(message))
}

/// Edits a message's text. Only the original sender may edit; system
/// messages are not editable. Absent or already-deleted messages surface as
/// `NotFound`. `created_at` is never touched, so pagination order is stable
/// under edits.
#[instrument(skip(state, caller, request), fields(message_id = %message_id, user_id = %caller.user_id))]
pub async fn edit(
    state: &AppState,
    caller: &Caller,
    message_id: Uuid,
    request: EditMessageRequest,
) -> Result<MessageView, ChatError> {
    use validator::Validate;
    request.validate()?;

    let message = state
        .msg
        .read(&message_id)
        .await?
        .filter(|m| !m.is_deleted)
        .ok_or(ChatError::NotFound("message"))?;

    if message.message_type == MessageType::System {
        return Err(ChatError::NotAuthorized("system messages cannot be edited"));
    }
    if !caller.is_service() && message.sender_id != Some(caller.user_id) {
        warn!("Edit attempted by someone other than the sender");
        return Err(ChatError::NotAuthorized("only the sender can edit a message"));
    }

    let edited = state
        .msg
        .apply_edit(&message_id, &request.content, Utc::now())
        .await?;

    info!("Message edited");
    Ok(MessageView::from(edited))
}

/// Soft-deletes a message: the flag flips, the content stays in storage and
/// non-privileged read paths render a tombstone. Allowed for the sender, a
/// group admin, or the service. Deleting a tombstone is a no-op.
#[instrument(skip(state, caller), fields(message_id = %message_id, user_id = %caller.user_id))]
pub async fn soft_delete(
    state: &AppState,
    caller: &Caller,
    message_id: Uuid,
) -> Result<MessageView, ChatError> {
    let message = state
        .msg
        .read(&message_id)
        .await?
        .ok_or(ChatError::NotFound("message"))?;

    if message.is_deleted {
        return Ok(MessageView::from(message).redacted());
    }

    let is_sender = message.sender_id == Some(caller.user_id);
    let mut deleted_by_admin = false;
    if !caller.is_service() && !is_sender {
        let member = require_member(state, &message.group_id, caller).await?;
        if let Some(member) = &member {
            require_role(member, &[MemberRole::Admin])?;
            deleted_by_admin = true;
        }
    }

    let deleted = state.msg.apply_soft_delete(&message_id, Utc::now()).await?;
    info!("Message soft-deleted");

    if deleted_by_admin && message.sender_id.is_some() {
        // Leave a visible trace when an admin removes someone else's message.
        if let Err(err) = send_system_message(
            state,
            message.group_id,
            format!("A message was removed by {}", caller.username),
        )
        .await
        {
            warn!("Failed to post removal notice: {err}");
        }
    }

    Ok(MessageView::from(deleted).redacted())
}

/// One page of a group's history, newest first, `(created_at, id)` cursor.
/// Deleted messages are returned tombstoned, never omitted, so reply
/// threads show no gaps. Group admins and the service see tombstone content
/// verbatim.
#[instrument(skip(state, caller, page), fields(group_id = %group_id, user_id = %caller.user_id))]
pub async fn list_page(
    state: &AppState,
    caller: &Caller,
    group_id: Uuid,
    page: PageQuery,
) -> Result<Vec<MessageView>, ChatError> {
    let member = require_member(state, &group_id, caller).await?;
    let privileged = is_privileged(caller, member.as_ref());

    let limit = page
        .limit
        .unwrap_or(state.default_page_size)
        .clamp(1, MAX_PAGE_SIZE);
    // A timestamp-only cursor means "strictly older than this instant".
    let before = page
        .before_at
        .map(|at| (at, page.before_id.unwrap_or(Uuid::nil())));

    let messages = state.msg.find_page(&group_id, before, limit).await?;
    debug!(count = messages.len(), "Fetched message page");

    Ok(messages
        .into_iter()
        .map(|m| render(m, privileged))
        .collect())
}

/// Direct replies to a message, oldest first.
#[instrument(skip(state, caller), fields(message_id = %message_id, user_id = %caller.user_id))]
pub async fn get_thread(
    state: &AppState,
    caller: &Caller,
    message_id: Uuid,
) -> Result<Vec<MessageView>, ChatError> {
    let parent = state
        .msg
        .read(&message_id)
        .await?
        .ok_or(ChatError::NotFound("message"))?;

    let member = require_member(state, &parent.group_id, caller).await?;
    let privileged = is_privileged(caller, member.as_ref());

    let replies = state.msg.find_replies(&message_id).await?;
    Ok(replies.into_iter().map(|m| render(m, privileged)).collect())
}

async fn validate_reply_target(
    state: &AppState,
    group_id: &Uuid,
    reply_to_id: &Uuid,
) -> Result<(), ChatError> {
    let target = state
        .msg
        .read(reply_to_id)
        .await?
        .ok_or(ChatError::InvalidReplyTarget("message does not exist"))?;

    if target.group_id != *group_id {
        warn!("Reply target belongs to a different group");
        return Err(ChatError::InvalidReplyTarget(
            "message belongs to a different group",
        ));
    }
    if target.is_deleted {
        return Err(ChatError::InvalidReplyTarget("message was deleted"));
    }
    Ok(())
}

fn is_privileged(caller: &Caller, member: Option<&GroupMember>) -> bool {
    caller.is_service() || member.is_some_and(|m| m.role == MemberRole::Admin)
}

fn render(message: Message, privileged: bool) -> MessageView {
    let view = MessageView::from(message);
    if privileged { view } else { view.redacted() }
}

/// Fan-out is decoupled from the write transaction: the event is published
/// only after the insert committed, and a failed delivery never fails the
/// originating write.
fn publish(state: &AppState, message: Message) {
    let group_id = message.group_id;
    state.feed.publish(MessageEvent {
        group_id,
        message: MessageView::from(message),
    });
}
