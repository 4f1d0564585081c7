//! AccessGuard - membership-scoped authorization.
//!
//! The original storage engine enforced row-level policies keyed on a
//! trusted "service" principal plus membership lookups. Here that policy is
//! an explicit, testable function evaluated before every group-scoped
//! operation: either the caller carries `Service` trust (in-process backend
//! only, full bypass), or it must hold a current membership in the target
//! group, with admin-only operations additionally requiring the admin role.

use crate::core::{AppState, ChatError};
use crate::entities::{GroupMember, MemberRole};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustLevel {
    /// The serving backend itself. Never exposed externally.
    Service,
    /// An identified end user; every check applies.
    External,
}

/// Caller identity as supplied by the external identity service.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user_id: Uuid,
    pub username: String,
    pub trust: TrustLevel,
}

impl Caller {
    pub fn user(user_id: Uuid, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
            trust: TrustLevel::External,
        }
    }

    pub fn service(user_id: Uuid, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
            trust: TrustLevel::Service,
        }
    }

    pub fn is_service(&self) -> bool {
        self.trust == TrustLevel::Service
    }
}

/// Requires the caller to be a current member of `group_id`.
///
/// Returns the membership row, or `None` for a service-trust bypass.
/// Absent membership is `NotAuthorized`, never `NotFound`: the check must
/// not reveal whether the group exists.
#[instrument(skip(state, caller), fields(group_id = %group_id, user_id = %caller.user_id))]
pub async fn require_member(
    state: &AppState,
    group_id: &Uuid,
    caller: &Caller,
) -> Result<Option<GroupMember>, ChatError> {
    if caller.is_service() {
        debug!("Service trust, membership check bypassed");
        return Ok(None);
    }

    match state.members.find_by_group_and_user(group_id, &caller.user_id).await? {
        Some(member) => {
            debug!("Membership check passed");
            Ok(Some(member))
        }
        None => {
            warn!("Caller is not a member of the target group");
            Err(ChatError::NotAuthorized("group access requires membership"))
        }
    }
}

/// Requires the caller to be an admin member of `group_id` (service trust
/// bypasses as everywhere).
#[instrument(skip(state, caller), fields(group_id = %group_id, user_id = %caller.user_id))]
pub async fn require_admin(
    state: &AppState,
    group_id: &Uuid,
    caller: &Caller,
) -> Result<Option<GroupMember>, ChatError> {
    match require_member(state, group_id, caller).await? {
        None => Ok(None),
        Some(member) => {
            require_role(&member, &[MemberRole::Admin])?;
            Ok(Some(member))
        }
    }
}

/// Checks that a membership row carries one of the allowed roles.
#[instrument(skip(member))]
pub fn require_role(member: &GroupMember, allowed_roles: &[MemberRole]) -> Result<(), ChatError> {
    if !allowed_roles.contains(&member.role) {
        warn!(
            "User {} has insufficient role {:?} in group {}",
            member.user_id, member.role, member.group_id
        );
        return Err(ChatError::NotAuthorized("insufficient role"));
    }
    Ok(())
}
