//! Access policy for tab operations
//!
//! A caller who neither owns nor manages a tab gets `NotFound`, so tab ids
//! do not leak across tenants. A caller who can see the tab but lacks the
//! role for the action gets `Forbidden`.

use std::collections::BTreeSet;

use shared::error::{AppError, ErrorCode};
use shared::models::{RestaurantId, Tab, UserId};

use super::state_machine::{Actor, TabAction};

/// Caller identity plus the restaurants they manage
#[derive(Debug, Clone)]
pub struct Caller {
    pub user_id: UserId,
    pub managed: BTreeSet<RestaurantId>,
}

impl Caller {
    pub fn new(user_id: UserId, managed: BTreeSet<RestaurantId>) -> Self {
        Self { user_id, managed }
    }

    pub fn owns(&self, tab: &Tab) -> bool {
        tab.user_id == self.user_id
    }

    pub fn manages(&self, restaurant_id: RestaurantId) -> bool {
        self.managed.contains(&restaurant_id)
    }

    pub fn is_manager(&self) -> bool {
        !self.managed.is_empty()
    }
}

/// Which projection a caller may read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewScope {
    Customer,
    Manager,
}

pub struct AccessPolicy;

impl AccessPolicy {
    /// Reads: owner gets the customer view, a manager of the restaurant the
    /// manager view.
    pub fn authorize_view(caller: &Caller, tab: &Tab) -> Result<ViewScope, AppError> {
        if caller.owns(tab) {
            Ok(ViewScope::Customer)
        } else if caller.manages(tab.restaurant_id) {
            Ok(ViewScope::Manager)
        } else {
            Err(AppError::tab_not_found(tab.id))
        }
    }

    /// Mutations
    pub fn authorize(caller: &Caller, tab: &Tab, action: TabAction) -> Result<(), AppError> {
        let owner = caller.owns(tab);
        let manager = caller.manages(tab.restaurant_id);

        if !owner && !manager {
            return Err(AppError::tab_not_found(tab.id));
        }

        match action.actor() {
            Actor::Owner if owner => Ok(()),
            Actor::Manager if manager => Ok(()),
            Actor::Owner => Err(AppError::forbidden("Only the tab owner can do this")
                .with_detail("tab_id", tab.id)
                .with_detail("action", action.name())),
            Actor::Manager => Err(AppError::with_message(
                ErrorCode::ManagerRequired,
                "Only managers of this restaurant can update served status",
            )
            .with_detail("tab_id", tab.id)
            .with_detail("action", action.name())),
        }
    }

    /// Manager-scoped reads of one restaurant
    pub fn authorize_restaurant(caller: &Caller, restaurant_id: RestaurantId) -> Result<(), AppError> {
        if caller.manages(restaurant_id) {
            Ok(())
        } else {
            Err(AppError::with_message(
                ErrorCode::ManagerRequired,
                "You are not a manager of this restaurant",
            )
            .with_detail("restaurant_id", restaurant_id))
        }
    }

    /// Manager-wide subscriptions and listings
    pub fn require_manager(caller: &Caller) -> Result<(), AppError> {
        if caller.is_manager() {
            Ok(())
        } else {
            Err(AppError::new(ErrorCode::ManagerRequired))
        }
    }
}
