//! HTTP / socket.io 服务器启动和管理

use std::net::SocketAddr;

use crate::api;
use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::core::{Config, ServerState};
use crate::realtime::{RealtimeBridge, forward_events};
use crate::utils::logger::periodic_cleanup;

pub struct Server {
    config: Config,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        let state = ServerState::initialize(&self.config)?;

        let bridge = RealtimeBridge::new(state.hub.clone(), state.jwt_service.clone());
        let (socket_layer, io) = bridge.layer();

        let mut tasks = BackgroundTasks::new();
        tasks.spawn(
            "realtime_forwarder",
            TaskKind::Listener,
            forward_events(io, state.notifier.subscribe(), tasks.shutdown_token()),
        );
        tasks.spawn(
            "log_cleanup",
            TaskKind::Periodic,
            periodic_cleanup(self.config.log_dir(), tasks.shutdown_token()),
        );
        tasks.log_summary();

        let app = api::build_app(&state)
            .layer(socket_layer)
            .with_state(state.clone());

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(%addr, environment = %self.config.environment, "Tab server listening");

        let shutdown = async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down...");
        };

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tasks.shutdown().await;
        Ok(())
    }
}
