//! 实时推送
//!
//! ```text
//! TabService ──► Notifier ──broadcast──► forwarder ──► socket.io rooms
//!                                                          ▲
//! socket events ──► RealtimeBridge ──► SubscriptionHub ────┘ (join / leave)
//! ```

pub mod chat;
pub mod hub;
pub mod notifier;
pub mod socket;
pub mod topic;

pub use chat::ChatPolicy;
pub use hub::{ChatJoin, ConnectionId, SubscriptionHub};
pub use notifier::{Envelope, Notifier};
pub use socket::{RealtimeBridge, forward_events};
pub use topic::Topic;
