//! Subscription topics
//!
//! Topic names double as socket.io room names.

use std::fmt;

use shared::models::{RestaurantId, TabId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Topic {
    /// `tab:{id}`: owner and managers of the restaurant
    Tab(TabId),
    /// `restaurant-manager:{id}`: managers of one restaurant
    RestaurantManager(RestaurantId),
    /// `managers:all`: every connected manager
    AllManagers,
    /// `restaurant-chat:{id}`: chat room of one restaurant
    RestaurantChat(RestaurantId),
}

impl Topic {
    pub fn is_chat(&self) -> bool {
        matches!(self, Topic::RestaurantChat(_))
    }

    /// Topics a tab change is delivered to
    pub fn for_tab(tab_id: TabId, restaurant_id: RestaurantId) -> [Topic; 3] {
        [
            Topic::Tab(tab_id),
            Topic::RestaurantManager(restaurant_id),
            Topic::AllManagers,
        ]
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topic::Tab(id) => write!(f, "tab:{}", id),
            Topic::RestaurantManager(id) => write!(f, "restaurant-manager:{}", id),
            Topic::AllManagers => f.write_str("managers:all"),
            Topic::RestaurantChat(id) => write!(f, "restaurant-chat:{}", id),
        }
    }
}
