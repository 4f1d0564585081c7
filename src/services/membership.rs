//! MembershipManager - join, leave, roles.

use crate::core::{AppState, Caller, ChatError, is_unique_violation, require_admin, require_member};
use crate::dtos::MemberView;
use crate::entities::MemberRole;
use crate::repositories::{Create, CreateMemberData, Read};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Joins a group. Public groups ignore any invite code; private groups
/// require a code resolving to this very group. Joining twice is a distinct
/// `AlreadyMember` signal, surfaced via the storage-level
/// `UNIQUE(group_id, user_id)` rather than a racy pre-check.
#[instrument(skip(state, caller, invite_code), fields(group_id = %group_id, user_id = %caller.user_id))]
pub async fn join(
    state: &AppState,
    caller: &Caller,
    group_id: Uuid,
    invite_code: Option<&str>,
) -> Result<MemberView, ChatError> {
    let group = state
        .groups
        .read(&group_id)
        .await?
        .ok_or(ChatError::NotFound("group"))?;

    if !group.is_public {
        let code = invite_code.ok_or(ChatError::InvalidInviteCode)?;
        let resolved = state
            .groups
            .find_by_invite_code(code)
            .await?
            .ok_or(ChatError::InvalidInviteCode)?;
        if resolved.id != group.id {
            warn!("Invite code resolves to a different group");
            return Err(ChatError::InvalidInviteCode);
        }
    }

    let member = state
        .members
        .create(&CreateMemberData {
            group_id,
            user_id: caller.user_id,
            username: caller.username.clone(),
            role: MemberRole::Member,
        })
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                ChatError::AlreadyMember
            } else {
                err.into()
            }
        })?;

    info!("User joined group");
    if let Err(err) = super::message::send_system_message(
        state,
        group_id,
        format!("{} joined the group", caller.username),
    )
    .await
    {
        warn!("Failed to post join message: {err}");
    }

    Ok(MemberView::from(member))
}

/// Idempotent enrollment into the default group; every user belongs to it.
/// Returns whether a membership row was created. Also refreshes the cached
/// username while it is at it.
#[instrument(skip(state, caller), fields(user_id = %caller.user_id))]
pub async fn ensure_in_default_group(state: &AppState, caller: &Caller) -> Result<bool, ChatError> {
    let Some(default) = state.groups.find_default().await? else {
        debug!("No default group yet, nothing to enroll into");
        return Ok(false);
    };

    let created = state
        .members
        .insert_if_absent(&CreateMemberData {
            group_id: default.id,
            user_id: caller.user_id,
            username: caller.username.clone(),
            role: MemberRole::Member,
        })
        .await?;

    if created {
        info!(group_id = %default.id, "User enrolled into default group");
        if let Err(err) = super::message::send_system_message(
            state,
            default.id,
            format!("{} joined the group", caller.username),
        )
        .await
        {
            warn!("Failed to post join message: {err}");
        }
    } else {
        state
            .members
            .refresh_username(&caller.user_id, &caller.username)
            .await?;
    }

    Ok(created)
}

/// Leaves a group. The default group cannot be left. The sole remaining
/// admin may leave; the orphaned group is logged, not blocked.
#[instrument(skip(state, caller), fields(group_id = %group_id, user_id = %caller.user_id))]
pub async fn leave(state: &AppState, caller: &Caller, group_id: Uuid) -> Result<(), ChatError> {
    let group = state
        .groups
        .read(&group_id)
        .await?
        .ok_or(ChatError::NotFound("group"))?;
    if group.is_default {
        return Err(ChatError::Validation(
            "the default group cannot be left".to_string(),
        ));
    }

    let membership = state
        .members
        .find_by_group_and_user(&group_id, &caller.user_id)
        .await?
        .ok_or(ChatError::NotAMember)?;

    if membership.role == MemberRole::Admin
        && state.members.count_admins(&group_id).await? == 1
    {
        warn!("Sole admin is leaving, group is left without an admin");
    }

    if !state
        .members
        .delete_by_group_and_user(&group_id, &caller.user_id)
        .await?
    {
        // Raced with another leave; the membership is gone either way.
        return Err(ChatError::NotAMember);
    }

    info!("User left group");
    if let Err(err) = super::message::send_system_message(
        state,
        group_id,
        format!("{} left the group", caller.username),
    )
    .await
    {
        warn!("Failed to post leave message: {err}");
    }
    Ok(())
}

/// Admin-only removal of another member.
#[instrument(skip(state, caller), fields(group_id = %group_id, target = %target_user_id, user_id = %caller.user_id))]
pub async fn remove_member(
    state: &AppState,
    caller: &Caller,
    group_id: Uuid,
    target_user_id: Uuid,
) -> Result<(), ChatError> {
    require_admin(state, &group_id, caller).await?;

    let target = state
        .members
        .find_by_group_and_user(&group_id, &target_user_id)
        .await?
        .ok_or(ChatError::NotAMember)?;

    state
        .members
        .delete_by_group_and_user(&group_id, &target_user_id)
        .await?;

    info!("Member removed");
    if let Err(err) = super::message::send_system_message(
        state,
        group_id,
        format!("{} was removed from the group by {}", target.username, caller.username),
    )
    .await
    {
        warn!("Failed to post removal message: {err}");
    }
    Ok(())
}

/// Admin-only role change.
#[instrument(skip(state, caller), fields(group_id = %group_id, target = %target_user_id, user_id = %caller.user_id))]
pub async fn set_role(
    state: &AppState,
    caller: &Caller,
    group_id: Uuid,
    target_user_id: Uuid,
    role: MemberRole,
) -> Result<(), ChatError> {
    require_admin(state, &group_id, caller).await?;

    if !state.members.set_role(&group_id, &target_user_id, role).await? {
        return Err(ChatError::NotAMember);
    }

    info!(?role, "Member role updated");
    Ok(())
}

/// Members of a group in join order. Membership-scoped like every other
/// read.
#[instrument(skip(state, caller), fields(group_id = %group_id, user_id = %caller.user_id))]
pub async fn list_members(
    state: &AppState,
    caller: &Caller,
    group_id: Uuid,
) -> Result<Vec<MemberView>, ChatError> {
    require_member(state, &group_id, caller).await?;

    let members = state.members.find_many_by_group(&group_id).await?;
    debug!(count = members.len(), "Listed members");
    Ok(members.into_iter().map(MemberView::from).collect())
}
