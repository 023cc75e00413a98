//! Restaurant chat eligibility and message composition

use chrono::{DateTime, Duration, Utc};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::message::ChatMessage;
use shared::models::{RestaurantId, Tab};
use shared::util::now_millis;

use crate::auth::CurrentUser;
use crate::tabs::Caller;
use crate::utils::validation::{MAX_MESSAGE_LEN, validate_required_text};

#[derive(Debug, Clone, Copy)]
pub struct ChatPolicy {
    /// How long after closing a tab the customer may still join
    window: Duration,
}

impl ChatPolicy {
    pub fn new(eligibility_days: i64) -> Self {
        Self {
            window: Duration::days(eligibility_days.max(0)),
        }
    }

    /// Managers of the restaurant, customers with an open tab there, or with
    /// a tab there closed inside the window.
    pub fn is_eligible(
        &self,
        caller: &Caller,
        restaurant_id: RestaurantId,
        tabs: &[Tab],
        now: DateTime<Utc>,
    ) -> bool {
        if caller.manages(restaurant_id) {
            return true;
        }

        let cutoff = now - self.window;
        tabs.iter()
            .filter(|tab| tab.restaurant_id == restaurant_id && tab.user_id == caller.user_id)
            .any(|tab| tab.is_open || tab.close_time.is_some_and(|closed| closed >= cutoff))
    }

    pub fn require_eligible(
        &self,
        caller: &Caller,
        restaurant_id: RestaurantId,
        tabs: &[Tab],
    ) -> AppResult<()> {
        if self.is_eligible(caller, restaurant_id, tabs, Utc::now()) {
            Ok(())
        } else {
            Err(AppError::new(ErrorCode::ChatNotAllowed).with_detail("restaurant_id", restaurant_id))
        }
    }

    pub fn compose(
        &self,
        user: &CurrentUser,
        restaurant_id: RestaurantId,
        raw: &str,
    ) -> AppResult<ChatMessage> {
        let message = validate_required_text(raw, "message", MAX_MESSAGE_LEN)
            .map_err(|e| AppError::with_message(ErrorCode::MessageInvalid, e.message))?;

        Ok(ChatMessage {
            user_id: user.id,
            user_name: user.username.clone(),
            message,
            restaurant_id,
            timestamp: now_millis(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::collections::BTreeSet;

    fn tab(restaurant_id: RestaurantId, closed_days_ago: Option<i64>) -> Tab {
        let now = Utc::now();
        Tab {
            id: 1,
            user_id: 1,
            restaurant_id,
            payment_method_id: closed_days_ago.map(|_| 3),
            open_time: now - Duration::days(30),
            close_time: closed_days_ago.map(|d| now - Duration::days(d)),
            is_open: closed_days_ago.is_none(),
            total: Decimal::ZERO,
            created_at: now - Duration::days(30),
        }
    }

    fn customer() -> Caller {
        Caller::new(1, BTreeSet::new())
    }

    #[test]
    fn test_open_tab_is_eligible() {
        let policy = ChatPolicy::new(7);
        assert!(policy.is_eligible(&customer(), 5, &[tab(5, None)], Utc::now()));
        assert!(!policy.is_eligible(&customer(), 6, &[tab(5, None)], Utc::now()));
    }

    #[test]
    fn test_recently_closed_tab_is_eligible() {
        let policy = ChatPolicy::new(7);
        assert!(policy.is_eligible(&customer(), 5, &[tab(5, Some(2))], Utc::now()));
        assert!(!policy.is_eligible(&customer(), 5, &[tab(5, Some(8))], Utc::now()));
    }

    #[test]
    fn test_manager_is_eligible_without_tabs() {
        let policy = ChatPolicy::new(7);
        let manager = Caller::new(9, BTreeSet::from([5]));
        assert!(policy.is_eligible(&manager, 5, &[], Utc::now()));

        let err = policy.require_eligible(&customer(), 5, &[]).unwrap_err();
        assert_eq!(err.code, ErrorCode::ChatNotAllowed);
    }

    #[test]
    fn test_compose_trims_and_limits() {
        let policy = ChatPolicy::new(7);
        let user = CurrentUser {
            id: 1,
            username: "ana".into(),
            role: "customer".into(),
        };

        let message = policy.compose(&user, 5, "  hola  ").unwrap();
        assert_eq!(message.message, "hola");
        assert_eq!(message.user_name, "ana");
        assert_eq!(message.restaurant_id, 5);

        let err = policy.compose(&user, 5, "   ").unwrap_err();
        assert_eq!(err.code, ErrorCode::MessageInvalid);

        let long = "x".repeat(MAX_MESSAGE_LEN + 1);
        assert!(policy.compose(&user, 5, &long).is_err());
        assert!(policy.compose(&user, 5, &"x".repeat(MAX_MESSAGE_LEN)).is_ok());
    }
}
