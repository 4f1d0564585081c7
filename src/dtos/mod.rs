//! DTOs module - Data Transfer Objects.
//!
//! DTOs separate the outward representation (what callers and feed
//! subscribers see) from the persisted entities.

pub mod group;
pub mod member;
pub mod message;
pub mod query;

pub use group::{CreateGroupRequest, GroupView, UpdateGroupRequest};
pub use member::MemberView;
pub use message::{DELETED_PLACEHOLDER, EditMessageRequest, MessageView, SendMessageRequest};
pub use query::PageQuery;
