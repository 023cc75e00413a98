//! SubscriptionHub: 连接与订阅管理
//!
//! Tracks which topics each live connection is subscribed to and applies the
//! access policy on every join. The transport (socket.io rooms) mirrors the
//! topic set returned by each call.

use std::collections::BTreeSet;
use std::sync::Arc;

use dashmap::DashMap;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::message::ChatMessage;
use shared::models::{RestaurantId, TabId};

use super::chat::ChatPolicy;
use super::notifier::Notifier;
use super::topic::Topic;
use crate::auth::CurrentUser;
use crate::security_log;
use crate::tabs::{AccessPolicy, Caller, TabService};

pub type ConnectionId = String;

#[derive(Debug, Clone)]
struct Session {
    user: CurrentUser,
    caller: Caller,
    topics: BTreeSet<Topic>,
}

/// Result of joining a chat room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatJoin {
    pub joined: Topic,
    /// Chat rooms left as a side effect
    pub left: Vec<Topic>,
}

pub struct SubscriptionHub {
    sessions: DashMap<ConnectionId, Session>,
    tabs: Arc<TabService>,
    notifier: Arc<Notifier>,
    chat: ChatPolicy,
}

impl std::fmt::Debug for SubscriptionHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHub")
            .field("connections", &self.sessions.len())
            .field("chat", &self.chat)
            .finish_non_exhaustive()
    }
}

impl SubscriptionHub {
    pub fn new(tabs: Arc<TabService>, notifier: Arc<Notifier>, chat: ChatPolicy) -> Self {
        Self {
            sessions: DashMap::new(),
            tabs,
            notifier,
            chat,
        }
    }

    /// Register a connection. Managers are auto-joined to their manager
    /// topics; the returned topics are the rooms to join.
    pub async fn connect(&self, conn: &str, user: CurrentUser) -> AppResult<Vec<Topic>> {
        let caller = self.tabs.caller(&user).await?;
        let topics = manager_topics(&caller);

        tracing::info!(
            connection = conn,
            user_id = user.id,
            manager = caller.is_manager(),
            "Realtime client connected"
        );
        self.sessions.insert(
            conn.to_string(),
            Session {
                user,
                caller,
                topics: topics.iter().copied().collect(),
            },
        );
        Ok(topics)
    }

    pub fn disconnect(&self, conn: &str) -> Vec<Topic> {
        match self.sessions.remove(conn) {
            Some((_, session)) => {
                tracing::info!(
                    connection = conn,
                    user_id = session.user.id,
                    topics = session.topics.len(),
                    "Realtime client disconnected"
                );
                session.topics.into_iter().collect()
            }
            None => Vec::new(),
        }
    }

    /// Subscribe to one tab. Same rule as reading it.
    pub async fn join_tab(&self, conn: &str, tab_id: TabId) -> AppResult<Topic> {
        let caller = self.session(conn)?.caller;
        if let Err(e) = self.tabs.authorize_subscription(&caller, tab_id).await {
            security_log!(
                WARN,
                "subscription_denied",
                user_id = caller.user_id,
                tab_id,
                code = %e.code
            );
            return Err(e);
        }

        let topic = Topic::Tab(tab_id);
        self.add_topics(conn, [topic])?;
        Ok(topic)
    }

    /// Idempotent
    pub fn leave_tab(&self, conn: &str, tab_id: TabId) -> AppResult<Topic> {
        let topic = Topic::Tab(tab_id);
        self.remove_topics(conn, [topic])?;
        Ok(topic)
    }

    pub fn join_manager_updates(&self, conn: &str) -> AppResult<Vec<Topic>> {
        let caller = self.session(conn)?.caller;
        AccessPolicy::require_manager(&caller)?;

        let topics = manager_topics(&caller);
        self.add_topics(conn, topics.iter().copied())?;
        Ok(topics)
    }

    /// Join a restaurant chat, leaving any other chat room
    pub async fn join_chat(&self, conn: &str, restaurant_id: RestaurantId) -> AppResult<ChatJoin> {
        let caller = self.session(conn)?.caller;
        let tabs = self.tabs.user_tabs_at(caller.user_id, restaurant_id)?;
        self.chat.require_eligible(&caller, restaurant_id, &tabs)?;

        let joined = Topic::RestaurantChat(restaurant_id);
        let mut session = self
            .sessions
            .get_mut(conn)
            .ok_or_else(AppError::not_authenticated)?;

        let left: Vec<Topic> = session
            .topics
            .iter()
            .filter(|t| t.is_chat() && **t != joined)
            .copied()
            .collect();
        for topic in &left {
            session.topics.remove(topic);
        }
        session.topics.insert(joined);

        Ok(ChatJoin { joined, left })
    }

    pub fn leave_chat(&self, conn: &str, restaurant_id: RestaurantId) -> AppResult<Topic> {
        let topic = Topic::RestaurantChat(restaurant_id);
        self.remove_topics(conn, [topic])?;
        Ok(topic)
    }

    /// Validate and broadcast a chat message to the room
    pub fn send_chat(
        &self,
        conn: &str,
        restaurant_id: RestaurantId,
        raw: &str,
    ) -> AppResult<ChatMessage> {
        let session = self.session(conn)?;
        if !session.topics.contains(&Topic::RestaurantChat(restaurant_id)) {
            return Err(AppError::new(ErrorCode::NotInChatRoom)
                .with_detail("restaurant_id", restaurant_id));
        }

        let message = self.chat.compose(&session.user, restaurant_id, raw)?;
        self.notifier.chat_message(message.clone());
        Ok(message)
    }

    pub fn topics(&self, conn: &str) -> Vec<Topic> {
        self.sessions
            .get(conn)
            .map(|s| s.topics.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn connection_count(&self) -> usize {
        self.sessions.len()
    }

    fn session(&self, conn: &str) -> AppResult<Session> {
        self.sessions
            .get(conn)
            .map(|s| s.clone())
            .ok_or_else(AppError::not_authenticated)
    }

    fn add_topics(&self, conn: &str, topics: impl IntoIterator<Item = Topic>) -> AppResult<()> {
        let mut session = self
            .sessions
            .get_mut(conn)
            .ok_or_else(AppError::not_authenticated)?;
        session.topics.extend(topics);
        Ok(())
    }

    fn remove_topics(&self, conn: &str, topics: impl IntoIterator<Item = Topic>) -> AppResult<()> {
        let mut session = self
            .sessions
            .get_mut(conn)
            .ok_or_else(AppError::not_authenticated)?;
        for topic in topics {
            session.topics.remove(&topic);
        }
        Ok(())
    }
}

fn manager_topics(caller: &Caller) -> Vec<Topic> {
    if !caller.is_manager() {
        return Vec::new();
    }
    let mut topics = vec![Topic::AllManagers];
    topics.extend(caller.managed.iter().map(|id| Topic::RestaurantManager(*id)));
    topics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FixtureCatalog;
    use crate::tabs::TabStorage;
    use shared::error::ErrorKind;
    use shared::models::{PaymentMethod, Restaurant};
    use std::time::Duration;

    struct Fixture {
        hub: SubscriptionHub,
        tabs: Arc<TabService>,
        notifier: Arc<Notifier>,
    }

    fn user(id: i64) -> CurrentUser {
        CurrentUser {
            id,
            username: format!("user-{}", id),
            role: "customer".into(),
        }
    }

    fn fixture() -> Fixture {
        let catalog = Arc::new(FixtureCatalog::new());
        for id in [1, 2] {
            catalog.upsert_restaurant(Restaurant {
                id,
                name: format!("R{}", id),
                manager_ids: vec![9],
            });
        }
        catalog.upsert_payment_method(PaymentMethod {
            id: 50,
            user_id: 1,
            label: None,
        });

        let notifier = Arc::new(Notifier::new(32));
        let tabs = Arc::new(TabService::new(
            TabStorage::open_in_memory().unwrap(),
            catalog.clone(),
            catalog,
            notifier.clone(),
            Duration::from_millis(200),
        ));
        let hub = SubscriptionHub::new(tabs.clone(), notifier.clone(), ChatPolicy::new(7));
        Fixture {
            hub,
            tabs,
            notifier,
        }
    }

    #[tokio::test]
    async fn test_manager_auto_joins_manager_topics() {
        let f = fixture();
        let topics = f.hub.connect("m", user(9)).await.unwrap();
        assert_eq!(
            topics,
            vec![
                Topic::AllManagers,
                Topic::RestaurantManager(1),
                Topic::RestaurantManager(2)
            ]
        );

        assert!(f.hub.connect("c", user(1)).await.unwrap().is_empty());
        assert_eq!(f.hub.connection_count(), 2);
    }

    #[tokio::test]
    async fn test_join_tab_follows_read_policy() {
        let f = fixture();
        let tab = f.tabs.open_tab(&user(1), 1).await.unwrap();

        f.hub.connect("owner", user(1)).await.unwrap();
        f.hub.connect("stranger", user(2)).await.unwrap();
        f.hub.connect("manager", user(9)).await.unwrap();

        assert_eq!(f.hub.join_tab("owner", tab.id).await.unwrap(), Topic::Tab(tab.id));
        assert!(f.hub.join_tab("manager", tab.id).await.is_ok());

        let err = f.hub.join_tab("stranger", tab.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(f.hub.topics("stranger").is_empty());

        // joining twice is harmless
        f.hub.join_tab("owner", tab.id).await.unwrap();
        assert_eq!(f.hub.topics("owner"), vec![Topic::Tab(tab.id)]);

        f.hub.leave_tab("owner", tab.id).unwrap();
        f.hub.leave_tab("owner", tab.id).unwrap();
        assert!(f.hub.topics("owner").is_empty());
    }

    #[tokio::test]
    async fn test_unknown_connection_is_unauthenticated() {
        let f = fixture();
        let err = f.hub.join_tab("ghost", 1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthenticated);
    }

    #[tokio::test]
    async fn test_join_manager_updates_requires_manager() {
        let f = fixture();
        f.hub.connect("c", user(1)).await.unwrap();
        let err = f.hub.join_manager_updates("c").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        f.hub.connect("m", user(9)).await.unwrap();
        assert_eq!(f.hub.join_manager_updates("m").unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_chat_join_switches_rooms() {
        let f = fixture();
        f.tabs.open_tab(&user(1), 1).await.unwrap();
        f.tabs.open_tab(&user(1), 2).await.unwrap();
        f.hub.connect("c", user(1)).await.unwrap();

        let first = f.hub.join_chat("c", 1).await.unwrap();
        assert!(first.left.is_empty());

        let second = f.hub.join_chat("c", 2).await.unwrap();
        assert_eq!(second.joined, Topic::RestaurantChat(2));
        assert_eq!(second.left, vec![Topic::RestaurantChat(1)]);
        assert_eq!(f.hub.topics("c"), vec![Topic::RestaurantChat(2)]);
    }

    #[tokio::test]
    async fn test_chat_requires_eligibility_and_membership() {
        let f = fixture();
        f.hub.connect("c", user(2)).await.unwrap();

        let err = f.hub.join_chat("c", 1).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ChatNotAllowed);

        let err = f.hub.send_chat("c", 1, "hello").unwrap_err();
        assert_eq!(err.code, ErrorCode::NotInChatRoom);
    }

    #[tokio::test]
    async fn test_send_chat_publishes() {
        let f = fixture();
        let tab = f.tabs.open_tab(&user(1), 1).await.unwrap();
        f.tabs.close_tab(&user(1), tab.id, 50).await.unwrap();

        // closed tab within the window still grants access
        f.hub.connect("c", user(1)).await.unwrap();
        f.hub.join_chat("c", 1).await.unwrap();

        let mut rx = f.notifier.subscribe();
        let message = f.hub.send_chat("c", 1, "  thanks!  ").unwrap();
        assert_eq!(message.message, "thanks!");

        let envelope = rx.recv().await.unwrap();
        assert_eq!(envelope.topic, Topic::RestaurantChat(1));
        assert_eq!(envelope.event.name(), "new_message");
    }

    #[tokio::test]
    async fn test_disconnect_drops_subscriptions() {
        let f = fixture();
        f.hub.connect("m", user(9)).await.unwrap();
        assert_eq!(f.hub.disconnect("m").len(), 3);
        assert!(f.hub.topics("m").is_empty());
        assert!(f.hub.disconnect("m").is_empty());
    }
}
