//! Tab → view projections
//!
//! Pure functions over already-resolved catalog data. Totals are always the
//! live sum of the lines, never the cached column.

use std::collections::HashMap;

use shared::models::{
    CustomerTabView, ManagerTabView, MenuItemId, MenuOffer, Restaurant, Tab, TabItem, TabLine,
};

use super::pricing;

/// Catalog data needed to render a tab
#[derive(Debug, Default, Clone)]
pub struct DisplayData {
    pub restaurant: Option<Restaurant>,
    pub offers: HashMap<MenuItemId, MenuOffer>,
}

impl DisplayData {
    fn restaurant_name(&self) -> Option<String> {
        self.restaurant.as_ref().map(|r| r.name.clone())
    }
}

pub fn line(item: &TabItem, offer: Option<&MenuOffer>) -> TabLine {
    TabLine {
        id: item.id,
        menu_item_id: item.menu_item_id,
        name: offer.map(|o| o.name.clone()),
        item_type: offer.and_then(|o| o.item_type.clone()),
        unit_price: offer.map(|o| o.price),
        quantity: item.quantity,
        subtotal: item.subtotal,
        served: item.served,
    }
}

fn lines(items: &[TabItem], display: &DisplayData) -> Vec<TabLine> {
    items
        .iter()
        .map(|item| line(item, display.offers.get(&item.menu_item_id)))
        .collect()
}

pub fn customer_view(tab: &Tab, items: &[TabItem], display: &DisplayData) -> CustomerTabView {
    CustomerTabView {
        id: tab.id,
        restaurant_id: tab.restaurant_id,
        restaurant_name: display.restaurant_name(),
        status: tab.status(),
        open_time: tab.open_time,
        close_time: tab.close_time,
        payment_method_id: tab.payment_method_id,
        total: pricing::total(items),
        items: lines(items, display),
    }
}

pub fn manager_view(tab: &Tab, items: &[TabItem], display: &DisplayData) -> ManagerTabView {
    ManagerTabView {
        id: tab.id,
        user_id: tab.user_id,
        restaurant_id: tab.restaurant_id,
        restaurant_name: display.restaurant_name(),
        status: tab.status(),
        open_time: tab.open_time,
        close_time: tab.close_time,
        total: pricing::total(items),
        pending_items: items.iter().filter(|i| !i.served).count() as u32,
        items: lines(items, display),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use shared::models::TabStatus;

    fn tab() -> Tab {
        Tab {
            id: 1,
            user_id: 2,
            restaurant_id: 3,
            payment_method_id: None,
            open_time: Utc::now(),
            close_time: None,
            is_open: true,
            // stale cached value, views must ignore it
            total: Decimal::new(1, 2),
            created_at: Utc::now(),
        }
    }

    fn item(id: i64, menu_item_id: i64, cents: i64, served: bool) -> TabItem {
        TabItem {
            id,
            tab_id: 1,
            menu_item_id,
            quantity: 1,
            subtotal: Decimal::new(cents, 2),
            served,
            created_at: Utc::now(),
        }
    }

    fn display() -> DisplayData {
        let mut offers = HashMap::new();
        offers.insert(
            10,
            MenuOffer {
                menu_item_id: 10,
                restaurant_id: 3,
                name: "Negroni".into(),
                item_type: Some("drink".into()),
                price: Decimal::new(850, 2),
                available: true,
            },
        );
        DisplayData {
            restaurant: Some(Restaurant {
                id: 3,
                name: "Bar Centrale".into(),
                manager_ids: vec![9],
            }),
            offers,
        }
    }

    #[test]
    fn test_customer_view_uses_live_total() {
        let items = vec![item(1, 10, 850, false), item(2, 11, 400, true)];
        let view = customer_view(&tab(), &items, &display());

        assert_eq!(view.total, Decimal::new(1250, 2));
        assert_eq!(view.status, TabStatus::Open);
        assert_eq!(view.restaurant_name.as_deref(), Some("Bar Centrale"));
        assert_eq!(view.items.len(), 2);
    }

    #[test]
    fn test_missing_catalog_data_yields_none() {
        let items = vec![item(2, 11, 400, false)];
        let view = customer_view(&tab(), &items, &DisplayData::default());

        assert!(view.restaurant_name.is_none());
        assert!(view.items[0].name.is_none());
        assert!(view.items[0].unit_price.is_none());
        assert_eq!(view.items[0].subtotal, Decimal::new(400, 2));
    }

    #[test]
    fn test_manager_view_counts_pending() {
        let items = vec![
            item(1, 10, 850, false),
            item(2, 11, 400, true),
            item(3, 12, 100, false),
        ];
        let view = manager_view(&tab(), &items, &display());

        assert_eq!(view.user_id, 2);
        assert_eq!(view.pending_items, 2);
        assert_eq!(view.items[0].name.as_deref(), Some("Negroni"));
        assert_eq!(view.items[0].item_type.as_deref(), Some("drink"));
    }
}
