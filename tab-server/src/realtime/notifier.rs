//! Notifier: 已提交变更的实时推送
//!
//! ```text
//! TabService (per-tab lock held)
//!       │ tab_updated / item_served
//!       ▼
//! Notifier ── broadcast::Sender<Envelope>
//!       │
//!       ├── socket forwarder (rooms = topic names)
//!       └── test subscribers
//! ```
//!
//! Publishing never fails a committed mutation. With no subscriber attached
//! the event is dropped.

use shared::message::{ChatMessage, ItemServed, TabEvent, TabUpdated};
use shared::models::{Tab, TabItem};
use shared::util::now_millis;
use tokio::sync::broadcast;

use super::topic::Topic;

/// One event addressed to one topic
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub topic: Topic,
    pub event: TabEvent,
}

#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Envelope>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Returns the number of receivers the event reached
    pub fn publish(&self, topic: Topic, event: TabEvent) -> usize {
        let name = event.name();
        match self.tx.send(Envelope { topic, event }) {
            Ok(receivers) => {
                tracing::debug!(topic = %topic, event = name, receivers, "Event published");
                receivers
            }
            // 无订阅者时 send 返回 Err，事件丢弃
            Err(_) => {
                tracing::trace!(topic = %topic, event = name, "Event dropped, no subscribers");
                0
            }
        }
    }

    /// Tab changed: delivered to the tab, its restaurant's managers and all managers
    pub fn tab_updated(&self, tab: &Tab, items: &[TabItem]) {
        let event = TabEvent::TabUpdated(TabUpdated {
            tab_id: tab.id,
            restaurant_id: tab.restaurant_id,
            tab: tab.clone(),
            items: items.to_vec(),
            timestamp: now_millis(),
        });

        for topic in Topic::for_tab(tab.id, tab.restaurant_id) {
            self.publish(topic, event.clone());
        }
    }

    /// Served flag changed: delivered to the tab topic only
    pub fn item_served(&self, item: &TabItem) {
        self.publish(
            Topic::Tab(item.tab_id),
            TabEvent::ItemServed(ItemServed {
                tab_id: item.tab_id,
                item_id: item.id,
                served: item.served,
                timestamp: now_millis(),
            }),
        );
    }

    pub fn chat_message(&self, message: ChatMessage) {
        self.publish(
            Topic::RestaurantChat(message.restaurant_id),
            TabEvent::NewMessage(message),
        );
    }
}
