//! TabService: tab lifecycle orchestration
//!
//! Every mutation follows the same steps:
//!
//! ```text
//! acquire per-tab lock
//!   → load tab → AccessPolicy → state machine
//!   → pricing → storage (one write txn, total recomputed)
//!   → Notifier publish
//! release lock
//! ```
//!
//! Events for one tab are therefore published in commit order.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{
    CustomerTabView, ManagerStatus, MenuItemId, PaymentMethodId, RestaurantId, RestaurantTabs,
    Tab, TabId, TabItem, TabItemId, TabView, UserId,
};

use super::locks::LockRegistry;
use super::policy::{AccessPolicy, Caller, ViewScope};
use super::pricing;
use super::projection::{self, DisplayData};
use super::state_machine::{TabAction, transition};
use super::storage::{StorageStats, TabRecord, TabStorage};
use crate::auth::CurrentUser;
use crate::catalog::{Catalog, PaymentMethods};
use crate::realtime::Notifier;

pub struct TabService {
    storage: TabStorage,
    catalog: Arc<dyn Catalog>,
    payments: Arc<dyn PaymentMethods>,
    notifier: Arc<Notifier>,
    tab_locks: LockRegistry<TabId>,
    /// Serializes opening per (user, restaurant)
    open_locks: LockRegistry<(UserId, RestaurantId)>,
}

impl std::fmt::Debug for TabService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TabService")
            .field("tab_locks", &self.tab_locks.len())
            .field("open_locks", &self.open_locks.len())
            .finish_non_exhaustive()
    }
}

impl TabService {
    pub fn new(
        storage: TabStorage,
        catalog: Arc<dyn Catalog>,
        payments: Arc<dyn PaymentMethods>,
        notifier: Arc<Notifier>,
        lock_timeout: Duration,
    ) -> Self {
        Self {
            storage,
            catalog,
            payments,
            notifier,
            tab_locks: LockRegistry::new(lock_timeout),
            open_locks: LockRegistry::new(lock_timeout),
        }
    }

    pub fn notifier(&self) -> &Arc<Notifier> {
        &self.notifier
    }

    pub fn stats(&self) -> AppResult<StorageStats> {
        Ok(self.storage.get_stats()?)
    }

    /// Resolve the caller's managed restaurants
    pub async fn caller(&self, user: &CurrentUser) -> AppResult<Caller> {
        let managed = self.catalog.managed_restaurants(user.id).await?;
        Ok(Caller::new(user.id, managed))
    }

    // ========== Mutations ==========

    /// 开启账单
    pub async fn open_tab(&self, user: &CurrentUser, restaurant_id: RestaurantId) -> AppResult<Tab> {
        if !self.catalog.restaurant_exists(restaurant_id).await? {
            return Err(AppError::new(ErrorCode::RestaurantNotFound)
                .with_detail("restaurant_id", restaurant_id));
        }

        let key = (user.id, restaurant_id);
        let _guard = self.open_locks.acquire(&key).await?;

        let tab = self.storage.create_tab(user.id, restaurant_id)?;
        tracing::info!(
            tab_id = tab.id,
            user_id = user.id,
            restaurant_id,
            "Tab opened"
        );
        self.notifier.tab_updated(&tab, &[]);
        Ok(tab)
    }

    /// 加菜：同一菜品合并为一行，数量累加，按当前价格重算小计
    pub async fn add_item(
        &self,
        user: &CurrentUser,
        tab_id: TabId,
        menu_item_id: MenuItemId,
        quantity: i64,
    ) -> AppResult<TabItem> {
        let quantity = pricing::validate_quantity(quantity)?;
        let caller = self.caller(user).await?;

        let _guard = self.tab_locks.acquire(&tab_id).await?;
        let tab = self.load_tab(tab_id)?;
        AccessPolicy::authorize(&caller, &tab, TabAction::AddItem)?;
        transition(&tab, TabAction::AddItem)?;

        let offer = self
            .catalog
            .menu_item(menu_item_id, tab.restaurant_id)
            .await?
            .filter(|offer| offer.available)
            .ok_or_else(|| {
                AppError::new(ErrorCode::MenuItemNotAvailable)
                    .with_detail("menu_item_id", menu_item_id)
                    .with_detail("restaurant_id", tab.restaurant_id)
            })?;

        let existing = self
            .storage
            .find_item(tab_id, menu_item_id)?
            .map(|item| item.quantity)
            .unwrap_or(0);
        let new_quantity = pricing::validate_quantity(i64::from(existing) + i64::from(quantity))?;
        let subtotal = pricing::subtotal(offer.price, new_quantity)?;

        let (record, item_id) =
            self.storage
                .upsert_item(tab_id, menu_item_id, new_quantity, subtotal)?;
        let item = Self::touched(&record, item_id)?;

        tracing::info!(
            tab_id,
            item_id,
            menu_item_id,
            quantity = new_quantity,
            subtotal = %subtotal,
            total = %record.tab.total,
            "Item added to tab"
        );
        self.notifier.tab_updated(&record.tab, &record.items);
        Ok(item)
    }

    /// 标记上菜状态（仅餐厅经理）
    pub async fn set_item_served(
        &self,
        user: &CurrentUser,
        tab_id: TabId,
        item_id: TabItemId,
        served: bool,
    ) -> AppResult<TabItem> {
        let caller = self.caller(user).await?;

        let _guard = self.tab_locks.acquire(&tab_id).await?;
        let tab = self.load_tab(tab_id)?;
        AccessPolicy::authorize(&caller, &tab, TabAction::SetServed)?;
        transition(&tab, TabAction::SetServed)?;

        let record = self.storage.set_item_served(tab_id, item_id, served)?;
        let item = Self::touched(&record, item_id)?;

        tracing::info!(tab_id, item_id, served, by = user.id, "Item served status changed");
        self.notifier.item_served(&item);
        self.notifier.tab_updated(&record.tab, &record.items);
        Ok(item)
    }

    /// 结账关闭账单
    pub async fn close_tab(
        &self,
        user: &CurrentUser,
        tab_id: TabId,
        payment_method_id: PaymentMethodId,
    ) -> AppResult<Tab> {
        let caller = self.caller(user).await?;

        let _guard = self.tab_locks.acquire(&tab_id).await?;
        let tab = self.load_tab(tab_id)?;
        AccessPolicy::authorize(&caller, &tab, TabAction::Close)?;
        transition(&tab, TabAction::Close)?;

        if !self
            .payments
            .belongs_to_user(payment_method_id, user.id)
            .await?
        {
            return Err(AppError::new(ErrorCode::PaymentMethodInvalid)
                .with_detail("payment_method_id", payment_method_id));
        }

        let record = self.storage.close_tab(tab_id, payment_method_id, Utc::now())?;
        tracing::info!(
            tab_id,
            user_id = user.id,
            payment_method_id,
            total = %record.tab.total,
            "Tab closed"
        );
        self.notifier.tab_updated(&record.tab, &record.items);
        Ok(record.tab)
    }

    // ========== Reads ==========

    /// Single tab, projected for the caller
    pub async fn get_tab(&self, user: &CurrentUser, tab_id: TabId) -> AppResult<TabView> {
        let caller = self.caller(user).await?;
        let record = self
            .storage
            .get_record(tab_id)?
            .ok_or_else(|| AppError::tab_not_found(tab_id))?;

        let scope = AccessPolicy::authorize_view(&caller, &record.tab)?;
        let display = self.display_data(&record.tab, &record.items).await?;

        Ok(match scope {
            ViewScope::Customer => {
                TabView::Customer(projection::customer_view(&record.tab, &record.items, &display))
            }
            ViewScope::Manager => {
                TabView::Manager(projection::manager_view(&record.tab, &record.items, &display))
            }
        })
    }

    /// Caller's own tabs, newest first
    pub async fn list_my_tabs(&self, user: &CurrentUser) -> AppResult<Vec<CustomerTabView>> {
        let mut tabs = self.storage.list_user_tabs(user.id)?;
        tabs.sort_by(|a, b| b.open_time.cmp(&a.open_time).then(b.id.cmp(&a.id)));

        let mut views = Vec::with_capacity(tabs.len());
        for tab in tabs {
            let items = self.storage.get_items(tab.id)?;
            let display = self.display_data(&tab, &items).await?;
            views.push(projection::customer_view(&tab, &items, &display));
        }
        Ok(views)
    }

    /// Open tabs of one managed restaurant, oldest first
    pub async fn list_restaurant_open_tabs(
        &self,
        user: &CurrentUser,
        restaurant_id: RestaurantId,
    ) -> AppResult<RestaurantTabs> {
        let caller = self.caller(user).await?;
        AccessPolicy::authorize_restaurant(&caller, restaurant_id)?;
        self.restaurant_tabs(restaurant_id).await
    }

    /// Open tabs of every restaurant the caller manages
    pub async fn list_manager_tabs(&self, user: &CurrentUser) -> AppResult<Vec<RestaurantTabs>> {
        let caller = self.caller(user).await?;
        AccessPolicy::require_manager(&caller)?;

        let mut groups = Vec::with_capacity(caller.managed.len());
        for restaurant_id in &caller.managed {
            groups.push(self.restaurant_tabs(*restaurant_id).await?);
        }
        Ok(groups)
    }

    pub async fn manager_status(&self, user: &CurrentUser) -> AppResult<ManagerStatus> {
        let caller = self.caller(user).await?;
        Ok(ManagerStatus {
            is_manager: caller.is_manager(),
            restaurant_ids: caller.managed.into_iter().collect(),
        })
    }

    /// Read scope for a subscription, without loading lines
    pub async fn authorize_subscription(&self, caller: &Caller, tab_id: TabId) -> AppResult<ViewScope> {
        let tab = self.load_tab(tab_id)?;
        AccessPolicy::authorize_view(caller, &tab)
    }

    /// A user's tabs at one restaurant, open and closed
    pub fn user_tabs_at(&self, user_id: UserId, restaurant_id: RestaurantId) -> AppResult<Vec<Tab>> {
        Ok(self
            .storage
            .list_user_tabs(user_id)?
            .into_iter()
            .filter(|tab| tab.restaurant_id == restaurant_id)
            .collect())
    }

    // ========== Helpers ==========

    fn load_tab(&self, tab_id: TabId) -> AppResult<Tab> {
        self.storage
            .get_tab(tab_id)?
            .ok_or_else(|| AppError::tab_not_found(tab_id))
    }

    fn touched(record: &TabRecord, item_id: TabItemId) -> AppResult<TabItem> {
        record.item(item_id).cloned().ok_or_else(|| {
            AppError::new(ErrorCode::TabItemNotFound)
                .with_detail("tab_id", record.tab.id)
                .with_detail("item_id", item_id)
        })
    }

    async fn restaurant_tabs(&self, restaurant_id: RestaurantId) -> AppResult<RestaurantTabs> {
        let name = self
            .catalog
            .restaurant(restaurant_id)
            .await?
            .map(|r| r.name);

        let mut tabs = self.storage.list_open_tabs(restaurant_id)?;
        tabs.sort_by(|a, b| a.open_time.cmp(&b.open_time).then(a.id.cmp(&b.id)));

        let mut views = Vec::with_capacity(tabs.len());
        for tab in tabs {
            let items = self.storage.get_items(tab.id)?;
            let display = self.display_data(&tab, &items).await?;
            views.push(projection::manager_view(&tab, &items, &display));
        }

        Ok(RestaurantTabs {
            restaurant_id,
            name,
            tabs: views,
        })
    }

    async fn display_data(&self, tab: &Tab, items: &[TabItem]) -> AppResult<DisplayData> {
        let restaurant = self.catalog.restaurant(tab.restaurant_id).await?;

        let mut offers = HashMap::new();
        for item in items {
            if offers.contains_key(&item.menu_item_id) {
                continue;
            }
            if let Some(offer) = self
                .catalog
                .menu_item(item.menu_item_id, tab.restaurant_id)
                .await?
            {
                offers.insert(item.menu_item_id, offer);
            }
        }

        Ok(DisplayData { restaurant, offers })
    }
}
