//! ChangeFeed - per-group stream of committed message inserts.
//!
//! One broadcast channel per group, created lazily on first subscription.
//! Publishing happens strictly after the insert commits, so subscribers
//! never see a message from a rolled-back transaction. Events within one
//! group arrive in commit order (`created_at`, tie-broken by `id`, the same
//! total order pagination uses); there is no ordering guarantee across
//! groups. The buffer is bounded: a subscriber that lags loses the oldest
//! events and must reconcile by re-fetching, and delivery is at-least-once,
//! so subscribers de-duplicate by message id. A slow or vanished subscriber
//! never blocks or fails the write path.

use crate::dtos::MessageView;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::broadcast::{self, Receiver, Sender};
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// A committed message insert, as handed to any real-time transport built
/// on top of this core.
#[derive(Debug, Clone)]
pub struct MessageEvent {
    pub group_id: Uuid,
    pub message: MessageView,
}

pub struct ChangeFeed {
    /// tx head of each group's broadcast channel, keyed by group id.
    channels: DashMap<Uuid, Sender<Arc<MessageEvent>>>,
    capacity: usize,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        ChangeFeed {
            channels: DashMap::new(),
            capacity,
        }
    }

    /// Channel creation goes through the atomic entry API: concurrent first
    /// subscribers to the same group must end up on the same sender, or one
    /// of them would miss every subsequent event.
    #[instrument(skip(self), fields(group_id = %group_id))]
    pub fn subscribe(&self, group_id: &Uuid) -> Receiver<Arc<MessageEvent>> {
        self.channels
            .entry(*group_id)
            .or_insert_with(|| {
                info!("Creating broadcast channel for group");
                // Arc<MessageEvent> shares the payload across receivers
                // instead of cloning it per subscriber.
                broadcast::channel::<Arc<MessageEvent>>(self.capacity).0
            })
            .subscribe()
    }

    /// Fire-and-forget publish of a committed insert. Returns the number of
    /// live receivers; zero is not an error.
    #[instrument(skip(self, event), fields(group_id = %event.group_id))]
    pub fn publish(&self, event: MessageEvent) -> usize {
        let group_id = event.group_id;
        let Some(entry) = self.channels.get(&group_id) else {
            debug!("No subscribers for group, event dropped");
            return 0;
        };

        match entry.send(Arc::new(event)) {
            Ok(n) => {
                debug!(receivers = n, "Event delivered");
                n
            }
            Err(_) => {
                // Last receiver went away; tear the channel down so an idle
                // group does not keep buffering. A subscriber may have
                // arrived since the failed send, so only remove the channel
                // if it is still receiver-less.
                debug!("No active receivers, removing channel");
                drop(entry);
                self.channels
                    .remove_if(&group_id, |_, tx| tx.receiver_count() == 0);
                0
            }
        }
    }

    pub fn active_groups(&self) -> usize {
        self.channels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtos::MessageView;
    use crate::entities::MessageType;
    use chrono::Utc;
    use serde_json::json;

    fn event(group_id: Uuid, content: &str) -> MessageEvent {
        let now = Utc::now();
        MessageEvent {
            group_id,
            message: MessageView {
                id: Uuid::new_v4(),
                group_id,
                sender_id: Some(Uuid::new_v4()),
                sender_username: Some("alice".into()),
                content: content.into(),
                message_type: MessageType::Text,
                reply_to_id: None,
                metadata: json!({}),
                is_edited: false,
                edited_at: None,
                is_deleted: false,
                created_at: now,
                updated_at: now,
            },
        }
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_a_noop() {
        let feed = ChangeFeed::new(8);
        assert_eq!(feed.publish(event(Uuid::new_v4(), "hello")), 0);
    }

    #[tokio::test]
    async fn subscribers_receive_events_in_publish_order() {
        let feed = ChangeFeed::new(8);
        let group = Uuid::new_v4();
        let mut rx = feed.subscribe(&group);

        feed.publish(event(group, "first"));
        feed.publish(event(group, "second"));

        assert_eq!(rx.recv().await.unwrap().message.content, "first");
        assert_eq!(rx.recv().await.unwrap().message.content, "second");
    }

    #[tokio::test]
    async fn groups_are_isolated() {
        let feed = ChangeFeed::new(8);
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut rx_a = feed.subscribe(&a);
        let _rx_b = feed.subscribe(&b);

        feed.publish(event(b, "for b"));
        feed.publish(event(a, "for a"));

        assert_eq!(rx_a.recv().await.unwrap().message.content, "for a");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_subscribers_all_receive_the_event() {
        let feed = Arc::new(ChangeFeed::new(8));

        for _ in 0..500 {
            let group = Uuid::new_v4();
            let barrier = Arc::new(tokio::sync::Barrier::new(2));

            let tasks: Vec<_> = (0..2)
                .map(|_| {
                    let feed = feed.clone();
                    let barrier = barrier.clone();
                    tokio::spawn(async move {
                        barrier.wait().await;
                        feed.subscribe(&group)
                    })
                })
                .collect();

            let mut receivers = Vec::new();
            for task in tasks {
                receivers.push(task.await.unwrap());
            }

            assert_eq!(feed.publish(event(group, "committed")), 2);
            for rx in &mut receivers {
                assert_eq!(rx.recv().await.unwrap().message.content, "committed");
            }
            feed.channels.remove(&group);
        }
    }

    #[tokio::test]
    async fn resubscribing_after_teardown_gets_a_live_channel() {
        let feed = ChangeFeed::new(8);
        let group = Uuid::new_v4();

        drop(feed.subscribe(&group));
        feed.publish(event(group, "nobody listens"));
        assert_eq!(feed.active_groups(), 0);

        let mut rx = feed.subscribe(&group);
        assert_eq!(feed.publish(event(group, "fresh start")), 1);
        assert_eq!(rx.recv().await.unwrap().message.content, "fresh start");
    }

    #[tokio::test]
    async fn channel_is_removed_after_last_receiver_drops() {
        let feed = ChangeFeed::new(8);
        let group = Uuid::new_v4();
        let rx = feed.subscribe(&group);
        assert_eq!(feed.active_groups(), 1);

        drop(rx);
        feed.publish(event(group, "nobody listens"));
        assert_eq!(feed.active_groups(), 0);
    }
}
