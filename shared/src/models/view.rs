//! Capability-scoped tab projections
//!
//! Both views are built from the same `Tab`/`TabItem` rows. Customers see
//! their own tab; managers additionally see who owns it and what is still
//! waiting to be served.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::tab::{
    MenuItemId, PaymentMethodId, RestaurantId, TabId, TabItemId, TabStatus, UserId,
};

/// A tab line enriched with display data from the catalog.
///
/// Catalog fields are `None` when the menu item no longer resolves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabLine {
    pub id: TabItemId,
    pub menu_item_id: MenuItemId,
    pub name: Option<String>,
    pub item_type: Option<String>,
    pub unit_price: Option<Decimal>,
    pub quantity: u32,
    pub subtotal: Decimal,
    pub served: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerTabView {
    pub id: TabId,
    pub restaurant_id: RestaurantId,
    pub restaurant_name: Option<String>,
    pub status: TabStatus,
    pub open_time: DateTime<Utc>,
    pub close_time: Option<DateTime<Utc>>,
    pub payment_method_id: Option<PaymentMethodId>,
    pub total: Decimal,
    pub items: Vec<TabLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagerTabView {
    pub id: TabId,
    pub user_id: UserId,
    pub restaurant_id: RestaurantId,
    pub restaurant_name: Option<String>,
    pub status: TabStatus,
    pub open_time: DateTime<Utc>,
    pub close_time: Option<DateTime<Utc>>,
    pub total: Decimal,
    /// Lines not yet marked served
    pub pending_items: u32,
    pub items: Vec<TabLine>,
}

/// Single-tab read, shaped by the caller's relation to the tab
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum TabView {
    Customer(CustomerTabView),
    Manager(ManagerTabView),
}

impl TabView {
    pub fn id(&self) -> TabId {
        match self {
            TabView::Customer(v) => v.id,
            TabView::Manager(v) => v.id,
        }
    }
}

/// Open tabs of one managed restaurant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantTabs {
    pub restaurant_id: RestaurantId,
    pub name: Option<String>,
    pub tabs: Vec<ManagerTabView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerStatus {
    pub is_manager: bool,
    pub restaurant_ids: Vec<RestaurantId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_tab_view_is_tagged_by_scope() {
        let view = TabView::Customer(CustomerTabView {
            id: 3,
            restaurant_id: 1,
            restaurant_name: None,
            status: TabStatus::Open,
            open_time: Utc::now(),
            close_time: None,
            payment_method_id: None,
            total: Decimal::new(1700, 2),
            items: vec![],
        });

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["scope"], "customer");
        assert_eq!(json["id"], 3);
        assert_eq!(json["total"], "17.00");
        assert_eq!(view.id(), 3);
    }
}
