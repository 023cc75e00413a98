//! Tab lifecycle
//!
//! ```text
//! OPEN --add_item--> OPEN
//! OPEN --set_served--> OPEN
//! OPEN --close--> CLOSED
//! CLOSED --set_served--> CLOSED   (late kitchen fulfilment)
//! ```
//!
//! Nothing leaves CLOSED. Who may trigger each action is decided by
//! [`super::policy::AccessPolicy`].

use shared::error::AppError;
use shared::models::{Tab, TabStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabAction {
    AddItem,
    SetServed,
    Close,
}

/// Who is allowed to trigger an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    /// The user the tab belongs to
    Owner,
    /// A manager of the tab's restaurant
    Manager,
}

impl TabAction {
    pub fn actor(&self) -> Actor {
        match self {
            TabAction::AddItem | TabAction::Close => Actor::Owner,
            TabAction::SetServed => Actor::Manager,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TabAction::AddItem => "add_item",
            TabAction::SetServed => "set_served",
            TabAction::Close => "close",
        }
    }
}

/// Next state of `tab` after `action`, or `TabClosed` if the action is not
/// allowed from the current state.
pub fn transition(tab: &Tab, action: TabAction) -> Result<TabStatus, AppError> {
    match (tab.status(), action) {
        (TabStatus::Open, TabAction::AddItem | TabAction::SetServed) => Ok(TabStatus::Open),
        (TabStatus::Open, TabAction::Close) => Ok(TabStatus::Closed),
        (TabStatus::Closed, TabAction::SetServed) => Ok(TabStatus::Closed),
        (TabStatus::Closed, TabAction::AddItem | TabAction::Close) => {
            Err(AppError::tab_closed(tab.id).with_detail("action", action.name()))
        }
    }
}
