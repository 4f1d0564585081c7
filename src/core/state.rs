//! Application state - repositories, feed and tunables shared by every
//! component.

use crate::config::Config;
use crate::feed::ChangeFeed;
use crate::repositories::{
    GroupRepository, MemberRepository, MessageRepository, ReadReceiptRepository,
};
use sqlx::SqlitePool;

pub struct AppState {
    /// Repository for group rows.
    pub groups: GroupRepository,

    /// Repository for membership rows.
    pub members: MemberRepository,

    /// Repository for message rows.
    pub msg: MessageRepository,

    /// Repository for read-receipt rows.
    pub receipts: ReadReceiptRepository,

    /// Per-group fan-out of committed message inserts.
    pub feed: ChangeFeed,

    /// Name given to the default group when it is first created.
    pub default_group_name: String,

    /// Description given to the default group when it is first created.
    pub default_group_description: String,

    /// Page size used when a pagination query does not specify one.
    pub default_page_size: i64,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: &Config) -> Self {
        Self {
            groups: GroupRepository::new(pool.clone()),
            members: MemberRepository::new(pool.clone()),
            msg: MessageRepository::new(pool.clone()),
            receipts: ReadReceiptRepository::new(pool),
            feed: ChangeFeed::new(config.feed_capacity),
            default_group_name: config.default_group_name.clone(),
            default_group_description: config.default_group_description.clone(),
            default_page_size: config.default_page_size,
        }
    }
}
