//! 健康检查路由
//!
//! | 路径 | 方法 | 说明 | 认证 |
//! |------|------|------|------|
//! | /api/health | GET | 存储与实时通道状态 | 无 |

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::core::ServerState;
use crate::tabs::StorageStats;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/health", get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// ok | degraded
    status: &'static str,
    version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    storage: Option<StorageStats>,
    realtime: RealtimeStatus,
}

#[derive(Debug, Serialize)]
pub struct RealtimeStatus {
    connections: usize,
    subscribers: usize,
}

async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    let storage = match state.tabs.stats() {
        Ok(stats) => Some(stats),
        Err(e) => {
            tracing::error!(error = %e, "Health check: storage unavailable");
            None
        }
    };

    Json(HealthResponse {
        status: if storage.is_some() { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        storage,
        realtime: RealtimeStatus {
            connections: state.hub.connection_count(),
            subscribers: state.notifier.subscriber_count(),
        },
    })
}
