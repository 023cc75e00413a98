//! 外部数据协作者
//!
//! The tab server never owns restaurants, menus or payment methods; it reads
//! them through these traits. [`FixtureCatalog`] is the in-memory binding
//! loaded from a JSON seed.

mod fixture;

use std::collections::BTreeSet;

use async_trait::async_trait;
use shared::error::AppResult;
use shared::models::{MenuItemId, MenuOffer, PaymentMethodId, Restaurant, RestaurantId, UserId};

pub use fixture::{CatalogError, CatalogSeed, FixtureCatalog};

#[async_trait]
pub trait Catalog: Send + Sync {
    /// Menu item as offered by `restaurant_id`, with its current price
    async fn menu_item(
        &self,
        menu_item_id: MenuItemId,
        restaurant_id: RestaurantId,
    ) -> AppResult<Option<MenuOffer>>;

    async fn restaurant(&self, restaurant_id: RestaurantId) -> AppResult<Option<Restaurant>>;

    /// Restaurants the user manages
    async fn managed_restaurants(&self, user_id: UserId) -> AppResult<BTreeSet<RestaurantId>>;

    async fn restaurant_exists(&self, restaurant_id: RestaurantId) -> AppResult<bool> {
        Ok(self.restaurant(restaurant_id).await?.is_some())
    }
}

#[async_trait]
pub trait PaymentMethods: Send + Sync {
    async fn belongs_to_user(
        &self,
        payment_method_id: PaymentMethodId,
        user_id: UserId,
    ) -> AppResult<bool>;
}
