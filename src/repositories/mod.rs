//! Repositories module - one repository per table.
//!
//! Queries are runtime-checked (`sqlx::query`/`query_as` with `.bind`)
//! against the schema in `migrations/`. Inserts that rely on uniqueness as
//! concurrency control (`ON CONFLICT DO NOTHING`, or propagating the unique
//! violation as a domain signal) are noted on the methods.

pub mod group;
pub mod member;
pub mod message;
pub mod read_receipt;
pub mod traits;

pub use traits::{Create, Read};

pub use group::{CreateGroupData, EnsureDefaultData, GroupRepository};
pub use member::{CreateMemberData, MemberRepository};
pub use message::{CreateMessageData, MessageRepository};
pub use read_receipt::ReadReceiptRepository;
