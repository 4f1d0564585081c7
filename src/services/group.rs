//! GroupRegistry - group lifecycle, default-group and invite-code
//! invariants.

use crate::core::{AppState, Caller, ChatError, is_unique_violation, require_admin, require_member};
use crate::dtos::{CreateGroupRequest, GroupView, UpdateGroupRequest};
use crate::entities::{ChatGroup, MemberRole};
use crate::repositories::{Create, CreateGroupData, EnsureDefaultData, Read};
use crate::services::message;
use chrono::Utc;
use futures::future::try_join_all;
use rand::Rng;
use rand::distr::Alphanumeric;
use serde_json::json;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

const INVITE_CODE_LEN: usize = 32;
/// With 62^32 codes a collision retry is effectively unreachable; the bound
/// exists so a broken RNG cannot loop forever.
const INVITE_CODE_ATTEMPTS: u32 = 4;

fn generate_invite_code() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(INVITE_CODE_LEN)
        .map(char::from)
        .collect()
}

/// Idempotently guarantees exactly one public default group. Safe under
/// concurrent startup of multiple instances: the insert is conditional on
/// the storage-level partial unique index, not on a prior read.
#[instrument(skip(state, admin_username), fields(admin_id = %admin_id))]
pub async fn ensure_default_group(
    state: &AppState,
    admin_id: Uuid,
    admin_username: &str,
) -> Result<GroupView, ChatError> {
    let (group, created) = state
        .groups
        .ensure_default(&EnsureDefaultData {
            name: state.default_group_name.clone(),
            description: state.default_group_description.clone(),
            admin_id,
            admin_username: admin_username.to_string(),
        })
        .await?;

    if created {
        info!(group_id = %group.id, "Default group created");
    } else {
        debug!(group_id = %group.id, "Default group already present");
    }
    Ok(GroupView::from(group))
}

/// Creates a non-default group; the creator becomes its admin member.
/// Private groups get a unique invite code, retried on collision.
#[instrument(skip(state, caller, request), fields(user_id = %caller.user_id))]
pub async fn create_group(
    state: &AppState,
    caller: &Caller,
    request: CreateGroupRequest,
) -> Result<GroupView, ChatError> {
    use validator::Validate;
    request.validate()?;

    let group = insert_with_code_retry(state, caller, &request).await?;
    info!(group_id = %group.id, "Group created");

    if let Err(err) = message::send_system_message(
        state,
        group.id,
        format!("Group \"{}\" created by {}", group.name, caller.username),
    )
    .await
    {
        warn!("Failed to post creation message: {err}");
    }

    announce_to_default_group(state, caller, &group).await;

    Ok(GroupView::from(group))
}

async fn insert_with_code_retry(
    state: &AppState,
    caller: &Caller,
    request: &CreateGroupRequest,
) -> Result<ChatGroup, ChatError> {
    for attempt in 0..INVITE_CODE_ATTEMPTS {
        let invite_code = (!request.is_public).then(generate_invite_code);
        let data = CreateGroupData {
            name: request.name.clone(),
            description: request.description.clone(),
            is_public: request.is_public,
            invite_code,
            created_by: caller.user_id,
            creator_username: caller.username.clone(),
        };

        match state.groups.create(&data).await {
            Ok(group) => return Ok(group),
            // The group id is fresh, so a unique violation here can only be
            // the invite code colliding.
            Err(err) if is_unique_violation(&err) && !request.is_public => {
                warn!(attempt, "Invite code collision, regenerating");
            }
            Err(err) => return Err(err.into()),
        }
    }
    Err(ChatError::DuplicateInviteCode)
}

/// New-group announcement into the default public group, carrying enough
/// metadata for clients to render a join affordance. Best effort: a failure
/// never fails the creation.
async fn announce_to_default_group(state: &AppState, caller: &Caller, group: &ChatGroup) {
    let default = match state.groups.find_default().await {
        Ok(Some(default)) if default.id != group.id => default,
        Ok(_) => return,
        Err(err) => {
            warn!("Could not look up default group for announcement: {err}");
            return;
        }
    };

    let content = if group.is_public {
        format!("New public group available: \"{}\"", group.name)
    } else {
        format!("New private group created: \"{}\"", group.name)
    };
    let metadata = json!({
        "group_invite": true,
        "target_group_id": group.id,
        "target_group_name": group.name,
        "target_group_description": group.description,
        "is_public": group.is_public,
        "invite_code": group.invite_code,
    });

    if let Err(err) = message::post_announcement(state, default.id, caller, content, metadata).await
    {
        warn!("Failed to announce new group: {err}");
    }
}

/// Admin-only rename/re-describe; bumps `updated_at` and leaves a system
/// message describing what changed.
#[instrument(skip(state, caller, request), fields(group_id = %group_id, user_id = %caller.user_id))]
pub async fn update_group(
    state: &AppState,
    caller: &Caller,
    group_id: Uuid,
    request: UpdateGroupRequest,
) -> Result<GroupView, ChatError> {
    use validator::Validate;
    request.validate()?;

    require_admin(state, &group_id, caller).await?;

    let current = state
        .groups
        .read(&group_id)
        .await?
        .ok_or(ChatError::NotFound("group"))?;

    let mut changes = Vec::new();
    if let Some(name) = &request.name {
        if *name != current.name {
            changes.push(format!("name \"{}\" to \"{}\"", current.name, name));
        }
    }
    if request
        .description
        .as_ref()
        .is_some_and(|d| *d != current.description)
    {
        changes.push("description updated".to_string());
    }
    if changes.is_empty() {
        return Ok(GroupView::from(current));
    }

    let updated = state
        .groups
        .update_fields(
            &group_id,
            request.name.as_deref(),
            request.description.as_deref(),
            Utc::now(),
        )
        .await?;

    info!("Group updated");
    if let Err(err) = message::send_system_message(
        state,
        group_id,
        format!("{} changed the group: {}", caller.username, changes.join(", ")),
    )
    .await
    {
        warn!("Failed to post update message: {err}");
    }

    Ok(GroupView::from(updated))
}

/// Replaces a private group's invite code, invalidating the old one.
/// Admin-only; the default and public groups carry no code.
#[instrument(skip(state, caller), fields(group_id = %group_id, user_id = %caller.user_id))]
pub async fn rotate_invite_code(
    state: &AppState,
    caller: &Caller,
    group_id: Uuid,
) -> Result<String, ChatError> {
    require_admin(state, &group_id, caller).await?;

    let group = state
        .groups
        .read(&group_id)
        .await?
        .ok_or(ChatError::NotFound("group"))?;

    if group.is_default || group.is_public {
        return Err(ChatError::Validation(
            "public groups have no invite code".to_string(),
        ));
    }

    for attempt in 0..INVITE_CODE_ATTEMPTS {
        let code = generate_invite_code();
        match state.groups.set_invite_code(&group_id, &code, Utc::now()).await {
            Ok(()) => {
                info!("Invite code rotated");
                return Ok(code);
            }
            Err(err) if is_unique_violation(&err) => {
                warn!(attempt, "Invite code collision, regenerating");
            }
            Err(err) => return Err(err.into()),
        }
    }
    Err(ChatError::DuplicateInviteCode)
}

/// Resolves an invite code to its group. Intentionally reveals the group's
/// existence: that is what makes joining possible.
#[instrument(skip(state, code))]
pub async fn resolve_invite_code(state: &AppState, code: &str) -> Result<GroupView, ChatError> {
    let group = state
        .groups
        .find_by_invite_code(code)
        .await?
        .ok_or(ChatError::InvalidInviteCode)?;

    debug!(group_id = %group.id, "Invite code resolved");
    Ok(GroupView::from(group).without_invite_code())
}

/// A single group as seen by the caller. Invite codes are only shown to
/// group admins and the service.
#[instrument(skip(state, caller), fields(group_id = %group_id, user_id = %caller.user_id))]
pub async fn get_group(
    state: &AppState,
    caller: &Caller,
    group_id: Uuid,
) -> Result<GroupView, ChatError> {
    let member = require_member(state, &group_id, caller).await?;

    let group = state
        .groups
        .read(&group_id)
        .await?
        .ok_or(ChatError::NotFound("group"))?;
    let count = state.members.count_by_group(&group_id).await?;

    let view = GroupView::from(group).with_member_count(count);
    let privileged = caller.is_service() || member.is_some_and(|m| m.role == MemberRole::Admin);
    Ok(if privileged { view } else { view.without_invite_code() })
}

/// Groups visible to the caller (memberships plus the default group;
/// everything under service trust), each with a member count. Invite codes
/// stay visible where the caller is that group's admin, as in `get_group`.
#[instrument(skip(state, caller), fields(user_id = %caller.user_id))]
pub async fn list_groups_for(state: &AppState, caller: &Caller) -> Result<Vec<GroupView>, ChatError> {
    let groups = if caller.is_service() {
        state.groups.find_all().await?
    } else {
        state.groups.find_many_visible_to(&caller.user_id).await?
    };

    let counts = try_join_all(
        groups
            .iter()
            .map(|g| state.members.count_by_group(&g.id)),
    )
    .await?;

    let admin_of: Vec<Uuid> = if caller.is_service() {
        Vec::new()
    } else {
        state
            .members
            .find_many_by_user(&caller.user_id)
            .await?
            .into_iter()
            .filter(|m| m.role == MemberRole::Admin)
            .map(|m| m.group_id)
            .collect()
    };

    let views = groups
        .into_iter()
        .zip(counts)
        .map(|(group, count)| {
            let privileged = caller.is_service() || admin_of.contains(&group.id);
            let view = GroupView::from(group).with_member_count(count);
            if privileged { view } else { view.without_invite_code() }
        })
        .collect::<Vec<_>>();

    info!(count = views.len(), "Listed groups");
    Ok(views)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invite_codes_are_opaque_alphanumeric_tokens() {
        let code = generate_invite_code();
        assert_eq!(code.len(), INVITE_CODE_LEN);
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn invite_codes_do_not_repeat() {
        assert_ne!(generate_invite_code(), generate_invite_code());
    }
}
