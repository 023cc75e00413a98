//! 实时事件消息类型定义
//!
//! 这些类型在 tab-server 和客户端之间共享，作为 socket 事件的负载。
//! 事件只是"重新获取"的提示：客户端不能依赖不同事件之间的相对顺序。

use serde::{Deserialize, Serialize};

use crate::models::{RestaurantId, Tab, TabId, TabItem, TabItemId, UserId};

/// Event name: a tab changed (opened, item added, served toggled, closed)
pub const TAB_UPDATED: &str = "tab_updated";
/// Event name: one line's served flag changed
pub const ITEM_SERVED: &str = "item_served";
/// Event name: restaurant chat message
pub const NEW_MESSAGE: &str = "new_message";

/// Refreshed tab state after a committed mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabUpdated {
    pub tab_id: TabId,
    pub restaurant_id: RestaurantId,
    pub tab: Tab,
    pub items: Vec<TabItem>,
    /// Unix millis
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemServed {
    pub tab_id: TabId,
    pub item_id: TabItemId,
    pub served: bool,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub user_id: UserId,
    pub user_name: String,
    pub message: String,
    pub restaurant_id: RestaurantId,
    pub timestamp: i64,
}

/// 推送给订阅者的事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum TabEvent {
    TabUpdated(TabUpdated),
    ItemServed(ItemServed),
    NewMessage(ChatMessage),
}

impl TabEvent {
    /// Socket event name
    pub fn name(&self) -> &'static str {
        match self {
            TabEvent::TabUpdated(_) => TAB_UPDATED,
            TabEvent::ItemServed(_) => ITEM_SERVED,
            TabEvent::NewMessage(_) => NEW_MESSAGE,
        }
    }

    /// Payload without the enum envelope
    pub fn payload(&self) -> serde_json::Value {
        let value = match self {
            TabEvent::TabUpdated(p) => serde_json::to_value(p),
            TabEvent::ItemServed(p) => serde_json::to_value(p),
            TabEvent::NewMessage(p) => serde_json::to_value(p),
        };
        value.unwrap_or(serde_json::Value::Null)
    }
}
