//! Services module - the component operations, one module per component.
//!
//! Every function takes the shared `AppState` and the authenticated
//! `Caller`; the access guard runs before anything touches a group.

pub mod group;
pub mod membership;
pub mod message;
pub mod read_receipt;

pub use group::{
    create_group, ensure_default_group, get_group, list_groups_for, resolve_invite_code,
    rotate_invite_code, update_group,
};
pub use membership::{
    ensure_in_default_group, join, leave, list_members, remove_member, set_role,
};
pub use message::{edit, get_thread, list_page, send, send_system_message, soft_delete};
pub use read_receipt::{mark_read, mark_read_many, unread_count};
