//! Entities module - persisted row types.
//!
//! Each entity corresponds to one table of the schema contract.

pub mod enums;
pub mod group;
pub mod member;
pub mod message;
pub mod read_receipt;

pub use enums::{MemberRole, MessageType};
pub use group::ChatGroup;
pub use member::GroupMember;
pub use message::Message;
pub use read_receipt::ReadReceipt;
