//! socket.io 桥接
//!
//! Clients authenticate with `auth: { token }` in the handshake. Each
//! [`Topic`] is a socket.io room; the forwarder task moves notifier
//! envelopes into those rooms.
//!
//! | Client event | Reply |
//! |--------------|-------|
//! | `join_tab_updates(tabId)` | `joined` / `join_error` |
//! | `leave_tab_updates(tabId)` | `left` |
//! | `join_manager_updates()` | `joined` / `join_error` |
//! | `join_restaurant_chat(restaurantId)` | `joined` / `join_error` |
//! | `leave_restaurant_chat(restaurantId)` | `left` |
//! | `send_message({restaurant_id, message})` | `message_error` on failure |

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::error::{AppError, ErrorCode};
use socketioxide::SocketIo;
use socketioxide::extract::{Data, SocketRef, TryData};
use socketioxide::layer::SocketIoLayer;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use super::hub::SubscriptionHub;
use super::notifier::Envelope;
use super::topic::Topic;
use crate::auth::{CurrentUser, JwtError, JwtService};
use crate::security_log;

pub const JOINED: &str = "joined";
pub const LEFT: &str = "left";
pub const JOIN_ERROR: &str = "join_error";
pub const MESSAGE_ERROR: &str = "message_error";
pub const AUTH_ERROR: &str = "auth_error";

#[derive(Debug, Deserialize)]
struct AuthPayload {
    token: String,
}

#[derive(Debug, Deserialize)]
struct SendMessage {
    restaurant_id: Value,
    message: String,
}

#[derive(Debug, Serialize)]
struct RoomAck {
    room: String,
}

/// Error reply sent to the client
#[derive(Debug, Serialize)]
pub struct ErrorReply {
    pub code: u16,
    pub kind: String,
    pub message: String,
}

impl From<&AppError> for ErrorReply {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.code.code(),
            kind: err.kind().to_string(),
            message: err.message.clone(),
        }
    }
}

/// Accepts `5`, `"5"`, `{ "<field>": 5 }`, `{ "id": 5 }` and `[5]`
pub fn id_from_payload(value: &Value, field: &str) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Object(map) => map
            .get(field)
            .or_else(|| map.get("id"))
            .and_then(|v| id_from_payload(v, field)),
        Value::Array(items) => items.first().and_then(|v| id_from_payload(v, field)),
        _ => None,
    }
}

fn invalid_id(field: &str) -> AppError {
    AppError::with_message(ErrorCode::InvalidRequest, format!("{field} is required"))
        .with_detail("field", field)
}

fn reply<T: Serialize + ?Sized>(socket: &SocketRef, event: &'static str, payload: &T) {
    if let Err(e) = socket.emit(event, payload) {
        tracing::debug!(socket = %socket.id, event, error = %e, "Failed to reply to socket");
    }
}

fn reply_error(socket: &SocketRef, event: &'static str, err: &AppError) {
    reply(socket, event, &ErrorReply::from(err));
}

fn join_rooms(socket: &SocketRef, topics: &[Topic]) {
    for topic in topics {
        socket.join(topic.to_string());
        reply(socket, JOINED, &RoomAck { room: topic.to_string() });
    }
}

/// Handshake `auth` payload to the caller's identity
fn authenticate_handshake(
    jwt: &JwtService,
    auth: Option<AuthPayload>,
) -> Result<CurrentUser, JwtError> {
    let auth = auth.ok_or_else(|| JwtError::InvalidToken("missing auth token".into()))?;
    jwt.authenticate(&auth.token)
}

#[derive(Clone)]
pub struct RealtimeBridge {
    hub: Arc<SubscriptionHub>,
    jwt: Arc<JwtService>,
}

impl RealtimeBridge {
    pub fn new(hub: Arc<SubscriptionHub>, jwt: Arc<JwtService>) -> Self {
        Self { hub, jwt }
    }

    /// Build the socket.io layer with the default namespace wired to the hub
    pub fn layer(self) -> (SocketIoLayer, SocketIo) {
        let (layer, io) = SocketIo::new_layer();
        io.ns("/", move |socket: SocketRef, TryData(auth): TryData<AuthPayload>| {
            let bridge = self.clone();
            async move { bridge.on_connect(socket, auth.ok()).await }
        });
        (layer, io)
    }

    async fn on_connect(self, socket: SocketRef, auth: Option<AuthPayload>) {
        let conn = socket.id.to_string();

        let user = match authenticate_handshake(&self.jwt, auth) {
            Ok(user) => user,
            Err(e) => {
                security_log!(WARN, "socket_auth_failed", connection = %conn, error = %e);
                reply_error(&socket, AUTH_ERROR, &AppError::from(e));
                let _ = socket.disconnect();
                return;
            }
        };

        match self.hub.connect(&conn, user).await {
            Ok(topics) => join_rooms(&socket, &topics),
            Err(e) => {
                tracing::warn!(connection = %conn, error = %e, "Failed to register socket");
                reply_error(&socket, AUTH_ERROR, &e);
                let _ = socket.disconnect();
                return;
            }
        }

        self.register_handlers(&socket);
    }

    fn register_handlers(&self, socket: &SocketRef) {
        let bridge = self.clone();
        socket.on(
            "join_tab_updates",
            move |socket: SocketRef, Data(payload): Data<Value>| {
                let bridge = bridge.clone();
                async move { bridge.join_tab(socket, payload).await }
            },
        );

        let bridge = self.clone();
        socket.on(
            "leave_tab_updates",
            move |socket: SocketRef, Data(payload): Data<Value>| {
                let bridge = bridge.clone();
                async move { bridge.leave_tab(socket, payload) }
            },
        );

        let bridge = self.clone();
        socket.on("join_manager_updates", move |socket: SocketRef| {
            let bridge = bridge.clone();
            async move { bridge.join_manager_updates(socket) }
        });

        let bridge = self.clone();
        socket.on(
            "join_restaurant_chat",
            move |socket: SocketRef, Data(payload): Data<Value>| {
                let bridge = bridge.clone();
                async move { bridge.join_chat(socket, payload).await }
            },
        );

        let bridge = self.clone();
        socket.on(
            "leave_restaurant_chat",
            move |socket: SocketRef, Data(payload): Data<Value>| {
                let bridge = bridge.clone();
                async move { bridge.leave_chat(socket, payload) }
            },
        );

        let bridge = self.clone();
        socket.on(
            "send_message",
            move |socket: SocketRef, TryData(payload): TryData<SendMessage>| {
                let bridge = bridge.clone();
                async move { bridge.send_message(socket, payload.ok()) }
            },
        );

        let hub = self.hub.clone();
        socket.on_disconnect(move |socket: SocketRef| {
            let hub = hub.clone();
            async move {
                hub.disconnect(&socket.id.to_string());
            }
        });
    }

    async fn join_tab(&self, socket: SocketRef, payload: Value) {
        let Some(tab_id) = id_from_payload(&payload, "tab_id") else {
            return reply_error(&socket, JOIN_ERROR, &invalid_id("tab_id"));
        };

        match self.hub.join_tab(&socket.id.to_string(), tab_id).await {
            Ok(topic) => join_rooms(&socket, &[topic]),
            Err(e) => reply_error(&socket, JOIN_ERROR, &e),
        }
    }

    fn leave_tab(&self, socket: SocketRef, payload: Value) {
        let Some(tab_id) = id_from_payload(&payload, "tab_id") else {
            return reply_error(&socket, JOIN_ERROR, &invalid_id("tab_id"));
        };

        match self.hub.leave_tab(&socket.id.to_string(), tab_id) {
            Ok(topic) => {
                socket.leave(topic.to_string());
                reply(&socket, LEFT, &RoomAck { room: topic.to_string() });
            }
            Err(e) => reply_error(&socket, JOIN_ERROR, &e),
        }
    }

    fn join_manager_updates(&self, socket: SocketRef) {
        match self.hub.join_manager_updates(&socket.id.to_string()) {
            Ok(topics) => join_rooms(&socket, &topics),
            Err(e) => reply_error(&socket, JOIN_ERROR, &e),
        }
    }

    async fn join_chat(&self, socket: SocketRef, payload: Value) {
        let Some(restaurant_id) = id_from_payload(&payload, "restaurant_id") else {
            return reply_error(&socket, JOIN_ERROR, &invalid_id("restaurant_id"));
        };

        match self.hub.join_chat(&socket.id.to_string(), restaurant_id).await {
            Ok(join) => {
                for topic in &join.left {
                    socket.leave(topic.to_string());
                }
                join_rooms(&socket, &[join.joined]);
            }
            Err(e) => reply_error(&socket, JOIN_ERROR, &e),
        }
    }

    fn leave_chat(&self, socket: SocketRef, payload: Value) {
        let Some(restaurant_id) = id_from_payload(&payload, "restaurant_id") else {
            return reply_error(&socket, JOIN_ERROR, &invalid_id("restaurant_id"));
        };

        match self.hub.leave_chat(&socket.id.to_string(), restaurant_id) {
            Ok(topic) => {
                socket.leave(topic.to_string());
                reply(&socket, LEFT, &RoomAck { room: topic.to_string() });
            }
            Err(e) => reply_error(&socket, JOIN_ERROR, &e),
        }
    }

    fn send_message(&self, socket: SocketRef, payload: Option<SendMessage>) {
        let Some(payload) = payload else {
            return reply_error(&socket, MESSAGE_ERROR, &invalid_id("restaurant_id"));
        };
        let Some(restaurant_id) = id_from_payload(&payload.restaurant_id, "restaurant_id") else {
            return reply_error(&socket, MESSAGE_ERROR, &invalid_id("restaurant_id"));
        };

        if let Err(e) = self
            .hub
            .send_chat(&socket.id.to_string(), restaurant_id, &payload.message)
        {
            reply_error(&socket, MESSAGE_ERROR, &e);
        }
    }
}

/// Forward notifier envelopes to the socket.io room named after each topic
pub async fn forward_events(
    io: SocketIo,
    mut rx: broadcast::Receiver<Envelope>,
    shutdown: CancellationToken,
) {
    tracing::info!("Realtime forwarder started");
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!("Realtime forwarder received shutdown signal");
                break;
            }
            received = rx.recv() => match received {
                Ok(envelope) => {
                    let room = envelope.topic.to_string();
                    let event = envelope.event.name();
                    let payload = envelope.event.payload();
                    if let Err(e) = io.to(room.clone()).emit(event, &payload).await {
                        tracing::warn!(room = %room, event, error = %e, "Failed to emit realtime event");
                    }
                }
                Err(RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Realtime forwarder lagged, events dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
}
