//! Tab Server - 餐厅账单与实时同步服务
//!
//! # 架构概述
//!
//! - **账单** (`tabs`): 存储、状态机、定价、访问策略
//! - **实时推送** (`realtime`): 广播通知、订阅中心、餐厅聊天、socket.io 桥接
//! - **认证** (`auth`): JWT 认证
//! - **菜单目录** (`catalog`): 餐厅、菜品、支付方式查询
//! - **HTTP API** (`api`): RESTful 接口
//!
//! # 模块结构
//!
//! ```text
//! tab-server/src/
//! ├── core/          # 配置、状态、服务器、后台任务
//! ├── auth/          # JWT 认证
//! ├── catalog/       # 外部目录查询
//! ├── tabs/          # 账单领域
//! ├── realtime/      # 实时推送
//! ├── api/           # HTTP 路由和处理器
//! └── utils/         # 日志、校验
//! ```

pub mod api;
pub mod auth;
pub mod catalog;
pub mod core;
pub mod realtime;
pub mod tabs;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use realtime::{Notifier, SubscriptionHub, Topic};
pub use tabs::{TabService, TabStorage};
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{cleanup_old_logs, init_logger, init_logger_with_file};

/// 准备工作目录并初始化日志
pub fn setup_environment(config: &Config) -> anyhow::Result<()> {
    std::fs::create_dir_all(&config.work_dir)?;
    init_logger_with_file(&config.log_level, config.log_json, Some(&config.log_dir()))?;
    Ok(())
}
