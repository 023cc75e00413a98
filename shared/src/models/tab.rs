//! Tab Model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type TabId = i64;
pub type TabItemId = i64;
pub type UserId = i64;
pub type RestaurantId = i64;
pub type MenuItemId = i64;
pub type PaymentMethodId = i64;

/// 账单状态 (OPEN 为初始状态, CLOSED 为终态)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TabStatus {
    Open,
    Closed,
}

/// One continuous ordering session for one user at one restaurant.
///
/// `close_time` and `payment_method_id` are set exactly when `is_open` is
/// false. `total` is a cached projection of the item subtotals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tab {
    pub id: TabId,
    pub user_id: UserId,
    pub restaurant_id: RestaurantId,
    pub payment_method_id: Option<PaymentMethodId>,
    pub open_time: DateTime<Utc>,
    pub close_time: Option<DateTime<Utc>>,
    pub is_open: bool,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Tab {
    pub fn status(&self) -> TabStatus {
        if self.is_open {
            TabStatus::Open
        } else {
            TabStatus::Closed
        }
    }
}

/// One line within a tab. At most one line exists per (tab, menu item).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabItem {
    pub id: TabItemId,
    pub tab_id: TabId,
    pub menu_item_id: MenuItemId,
    pub quantity: u32,
    /// Unit price x quantity, captured at the last mutating call
    pub subtotal: Decimal,
    pub served: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tab(is_open: bool) -> Tab {
        let now = Utc::now();
        Tab {
            id: 1,
            user_id: 10,
            restaurant_id: 20,
            payment_method_id: (!is_open).then_some(5),
            open_time: now,
            close_time: (!is_open).then_some(now),
            is_open,
            total: Decimal::ZERO,
            created_at: now,
        }
    }

    #[test]
    fn test_status_follows_open_flag() {
        assert_eq!(tab(true).status(), TabStatus::Open);
        assert_eq!(tab(false).status(), TabStatus::Closed);
    }

    #[test]
    fn test_status_serializes_upper_case() {
        assert_eq!(serde_json::to_string(&TabStatus::Open).unwrap(), "\"OPEN\"");
        assert_eq!(serde_json::to_string(&TabStatus::Closed).unwrap(), "\"CLOSED\"");
    }

    #[test]
    fn test_total_serializes_as_string() {
        let mut t = tab(true);
        t.total = Decimal::new(2550, 2);
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["total"], "25.50");
    }
}
