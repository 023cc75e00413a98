//! In-memory catalog loaded from a JSON seed

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use async_trait::async_trait;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::error::AppResult;
use shared::models::{
    MenuItemId, MenuOffer, PaymentMethod, PaymentMethodId, Restaurant, RestaurantId, UserId,
};
use thiserror::Error;

use super::{Catalog, PaymentMethods};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog seed: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid catalog seed: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Seed file layout
///
/// ```json
/// {
///   "restaurants": [{ "id": 1, "name": "Bar Pepe", "manager_ids": [100] }],
///   "menu": [{ "menu_item_id": 7, "restaurant_id": 1, "name": "Caña", "price": "2.50" }],
///   "payment_methods": [{ "id": 3, "user_id": 200 }]
/// }
/// ```
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub restaurants: Vec<Restaurant>,
    #[serde(default)]
    pub menu: Vec<MenuOffer>,
    #[serde(default)]
    pub payment_methods: Vec<PaymentMethod>,
}

#[derive(Debug, Default)]
struct CatalogData {
    restaurants: HashMap<RestaurantId, Restaurant>,
    menu: HashMap<(MenuItemId, RestaurantId), MenuOffer>,
    payment_methods: HashMap<PaymentMethodId, PaymentMethod>,
}

#[derive(Debug, Default)]
pub struct FixtureCatalog {
    data: RwLock<CatalogData>,
}

impl FixtureCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: CatalogSeed) -> Self {
        let catalog = Self::new();
        for restaurant in seed.restaurants {
            catalog.upsert_restaurant(restaurant);
        }
        for offer in seed.menu {
            catalog.upsert_menu_offer(offer);
        }
        for method in seed.payment_methods {
            catalog.upsert_payment_method(method);
        }
        catalog
    }

    pub fn from_seed_file(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        let seed: CatalogSeed = serde_json::from_str(&raw)?;
        tracing::info!(
            path = %path.display(),
            restaurants = seed.restaurants.len(),
            menu_items = seed.menu.len(),
            payment_methods = seed.payment_methods.len(),
            "Catalog seed loaded"
        );
        Ok(Self::from_seed(seed))
    }

    pub fn upsert_restaurant(&self, restaurant: Restaurant) {
        self.data.write().restaurants.insert(restaurant.id, restaurant);
    }

    pub fn upsert_menu_offer(&self, offer: MenuOffer) {
        self.data
            .write()
            .menu
            .insert((offer.menu_item_id, offer.restaurant_id), offer);
    }

    pub fn upsert_payment_method(&self, method: PaymentMethod) {
        self.data.write().payment_methods.insert(method.id, method);
    }

    /// Returns false if the offer does not exist
    pub fn set_price(&self, menu_item_id: MenuItemId, restaurant_id: RestaurantId, price: Decimal) -> bool {
        match self.data.write().menu.get_mut(&(menu_item_id, restaurant_id)) {
            Some(offer) => {
                offer.price = price;
                true
            }
            None => false,
        }
    }

    /// Returns false if the offer does not exist
    pub fn set_available(
        &self,
        menu_item_id: MenuItemId,
        restaurant_id: RestaurantId,
        available: bool,
    ) -> bool {
        match self.data.write().menu.get_mut(&(menu_item_id, restaurant_id)) {
            Some(offer) => {
                offer.available = available;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl Catalog for FixtureCatalog {
    async fn menu_item(
        &self,
        menu_item_id: MenuItemId,
        restaurant_id: RestaurantId,
    ) -> AppResult<Option<MenuOffer>> {
        Ok(self.data.read().menu.get(&(menu_item_id, restaurant_id)).cloned())
    }

    async fn restaurant(&self, restaurant_id: RestaurantId) -> AppResult<Option<Restaurant>> {
        Ok(self.data.read().restaurants.get(&restaurant_id).cloned())
    }

    async fn managed_restaurants(&self, user_id: UserId) -> AppResult<BTreeSet<RestaurantId>> {
        Ok(self
            .data
            .read()
            .restaurants
            .values()
            .filter(|r| r.manager_ids.contains(&user_id))
            .map(|r| r.id)
            .collect())
    }
}

#[async_trait]
impl PaymentMethods for FixtureCatalog {
    async fn belongs_to_user(
        &self,
        payment_method_id: PaymentMethodId,
        user_id: UserId,
    ) -> AppResult<bool> {
        Ok(self
            .data
            .read()
            .payment_methods
            .get(&payment_method_id)
            .is_some_and(|m| m.user_id == user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str = r#"{
        "restaurants": [
            { "id": 1, "name": "Bar Pepe", "manager_ids": [100] },
            { "id": 2, "name": "Casa Lola", "manager_ids": [100, 101] }
        ],
        "menu": [
            { "menu_item_id": 7, "restaurant_id": 1, "name": "Caña", "item_type": "drink", "price": "2.50" },
            { "menu_item_id": 8, "restaurant_id": 1, "name": "Tortilla", "price": "6.00", "available": false }
        ],
        "payment_methods": [{ "id": 3, "user_id": 200, "label": "visa" }]
    }"#;

    fn catalog() -> FixtureCatalog {
        FixtureCatalog::from_seed(serde_json::from_str(SEED).unwrap())
    }

    #[tokio::test]
    async fn test_menu_item_is_scoped_to_restaurant() {
        let catalog = catalog();
        let offer = catalog.menu_item(7, 1).await.unwrap().unwrap();
        assert_eq!(offer.price, Decimal::new(250, 2));
        assert!(offer.available);
        assert!(catalog.menu_item(7, 2).await.unwrap().is_none());
        assert!(!catalog.menu_item(8, 1).await.unwrap().unwrap().available);
    }

    #[tokio::test]
    async fn test_managed_restaurants() {
        let catalog = catalog();
        assert_eq!(
            catalog.managed_restaurants(100).await.unwrap(),
            BTreeSet::from([1, 2])
        );
        assert_eq!(
            catalog.managed_restaurants(101).await.unwrap(),
            BTreeSet::from([2])
        );
        assert!(catalog.managed_restaurants(200).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_payment_method_ownership() {
        let catalog = catalog();
        assert!(catalog.belongs_to_user(3, 200).await.unwrap());
        assert!(!catalog.belongs_to_user(3, 201).await.unwrap());
        assert!(!catalog.belongs_to_user(99, 200).await.unwrap());
    }

    #[tokio::test]
    async fn test_price_and_availability_updates() {
        let catalog = catalog();
        assert!(catalog.set_price(7, 1, Decimal::new(300, 2)));
        assert!(catalog.set_available(8, 1, true));
        assert!(!catalog.set_price(7, 2, Decimal::ONE));

        let offer = catalog.menu_item(7, 1).await.unwrap().unwrap();
        assert_eq!(offer.price, Decimal::new(3, 0));
        assert!(catalog.menu_item(8, 1).await.unwrap().unwrap().available);
    }

    #[test]
    fn test_seed_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            FixtureCatalog::from_seed_file(&missing),
            Err(CatalogError::Io(_))
        ));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ not json").unwrap();
        assert!(matches!(
            FixtureCatalog::from_seed_file(&broken),
            Err(CatalogError::Parse(_))
        ));
    }
}
