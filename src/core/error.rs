//! Error taxonomy for the persistence core.
//!
//! Storage-level failures are translated into these kinds at the component
//! boundary; nothing is silently swallowed. Authorization failures use
//! `NotAuthorized` rather than `NotFound` so that probing a group id does
//! not reveal whether it exists.

use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// Caller lacks membership, or the required role, for the target group.
    NotAuthorized(&'static str),
    /// Entity absent; used only where existence-leak is acceptable.
    NotFound(&'static str),
    /// The (group, user) membership pair already exists.
    AlreadyMember,
    /// The (group, user) membership pair does not exist.
    NotAMember,
    /// `reply_to_id` does not name a live message in the same group.
    InvalidReplyTarget(&'static str),
    /// The invite code resolves to no group, or to a different group.
    InvalidInviteCode,
    /// Invite-code generation exhausted its collision retries.
    DuplicateInviteCode,
    /// Request payload failed validation.
    Validation(String),
    /// Catch-all for storage-level integrity failures.
    Constraint(String),
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatError::NotAuthorized(what) => write!(f, "not authorized: {what}"),
            ChatError::NotFound(what) => write!(f, "{what} not found"),
            ChatError::AlreadyMember => write!(f, "already a member of this group"),
            ChatError::NotAMember => write!(f, "not a member of this group"),
            ChatError::InvalidReplyTarget(why) => write!(f, "invalid reply target: {why}"),
            ChatError::InvalidInviteCode => write!(f, "invalid or expired invite code"),
            ChatError::DuplicateInviteCode => write!(f, "could not generate a unique invite code"),
            ChatError::Validation(details) => write!(f, "validation error: {details}"),
            ChatError::Constraint(details) => write!(f, "storage constraint violation: {details}"),
        }
    }
}

impl Error for ChatError {}

impl From<sqlx::Error> for ChatError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ChatError::NotFound("resource"),
            other => ChatError::Constraint(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ChatError {
    fn from(err: validator::ValidationErrors) -> Self {
        ChatError::Validation(err.to_string())
    }
}

/// Uniqueness-as-concurrency-control: callers attempt the insert and treat a
/// unique violation as the duplicate case instead of pre-checking.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.is_unique_violation(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err = ChatError::from(sqlx::Error::RowNotFound);
        assert_eq!(err, ChatError::NotFound("resource"));
    }

    #[test]
    fn display_is_lowercase_prose() {
        assert_eq!(
            ChatError::InvalidInviteCode.to_string(),
            "invalid or expired invite code"
        );
        assert_eq!(
            ChatError::NotAuthorized("group access").to_string(),
            "not authorized: group access"
        );
    }
}
