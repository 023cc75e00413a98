//! Catalog reference data
//!
//! Restaurants, menu offers and payment methods are owned by other
//! services; the tab server only reads them by id.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::tab::{MenuItemId, PaymentMethodId, RestaurantId, UserId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: RestaurantId,
    pub name: String,
    /// Users allowed to manage this restaurant's tabs
    #[serde(default)]
    pub manager_ids: Vec<UserId>,
}

/// A menu item as offered by one restaurant (餐厅菜单项)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuOffer {
    pub menu_item_id: MenuItemId,
    pub restaurant_id: RestaurantId,
    pub name: String,
    #[serde(default)]
    pub item_type: Option<String>,
    pub price: Decimal,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: PaymentMethodId,
    pub user_id: UserId,
    #[serde(default)]
    pub label: Option<String>,
}
