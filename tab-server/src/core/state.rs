use std::sync::Arc;

use shared::error::{AppError, AppResult, ErrorCode};

use crate::auth::JwtService;
use crate::catalog::{Catalog, FixtureCatalog, PaymentMethods};
use crate::core::Config;
use crate::realtime::{ChatPolicy, Notifier, SubscriptionHub};
use crate::tabs::{TabService, TabStorage};

/// 服务器状态 - 持有所有服务的共享引用
///
/// Cloning is cheap; every field is an `Arc` or small config.
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项 (不可变) |
/// | jwt_service | JWT 认证服务 |
/// | tabs | 账单服务 (存储、定价、状态机、权限) |
/// | notifier | 实时事件发布 |
/// | hub | 实时订阅管理 |
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub jwt_service: Arc<JwtService>,
    pub tabs: Arc<TabService>,
    pub notifier: Arc<Notifier>,
    pub hub: Arc<SubscriptionHub>,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 1. 数据库 (work_dir/database/tabs.redb)
    /// 2. 目录数据 (CATALOG_SEED_PATH, 未设置时为空)
    /// 3. 各服务 (Notifier, TabService, SubscriptionHub, JWT)
    pub fn initialize(config: &Config) -> AppResult<Self> {
        let storage = TabStorage::open(config.database_path())?;

        let catalog = match &config.catalog_seed_path {
            Some(path) => FixtureCatalog::from_seed_file(std::path::Path::new(path)).map_err(|e| {
                AppError::with_message(ErrorCode::ConfigError, e.to_string())
                    .with_detail("path", path.as_str())
            })?,
            None => {
                tracing::warn!("CATALOG_SEED_PATH not set, starting with an empty catalog");
                FixtureCatalog::new()
            }
        };
        let catalog = Arc::new(catalog);

        Ok(Self::with_parts(
            config.clone(),
            storage,
            catalog.clone(),
            catalog,
        ))
    }

    /// Wire services from already-built parts
    pub fn with_parts(
        config: Config,
        storage: TabStorage,
        catalog: Arc<dyn Catalog>,
        payments: Arc<dyn PaymentMethods>,
    ) -> Self {
        let notifier = Arc::new(Notifier::new(config.event_channel_capacity));
        let tabs = Arc::new(TabService::new(
            storage,
            catalog,
            payments,
            notifier.clone(),
            config.tab_lock_timeout(),
        ));
        let hub = Arc::new(SubscriptionHub::new(
            tabs.clone(),
            notifier.clone(),
            ChatPolicy::new(config.chat_eligibility_days),
        ));
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));

        Self {
            config,
            jwt_service,
            tabs,
            notifier,
            hub,
        }
    }
}
