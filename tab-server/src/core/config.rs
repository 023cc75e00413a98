use std::path::PathBuf;
use std::time::Duration;

use crate::auth::{JwtConfig, JwtError};

/// 服务器配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 (数据库、日志) |
/// | HTTP_PORT | 3000 | HTTP / socket.io 端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_LEVEL | info | 日志级别 (RUST_LOG 优先) |
/// | LOG_JSON | production 时为 true | JSON 日志 |
/// | CATALOG_SEED_PATH | - | 菜单/餐厅/支付方式种子文件 |
/// | TAB_LOCK_TIMEOUT_MS | 5000 | 单个账单写锁等待时间 |
/// | EVENT_CHANNEL_CAPACITY | 1024 | 实时事件通道容量 |
/// | REQUEST_TIMEOUT_MS | 30000 | HTTP 请求超时 |
/// | CHAT_ELIGIBILITY_DAYS | 7 | 关闭账单后仍可加入聊天的天数 |
///
/// JWT settings come from `JWT_SECRET`, `JWT_EXPIRATION_MINUTES`,
/// `JWT_ISSUER` and `JWT_AUDIENCE`.
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录
    pub work_dir: String,
    pub http_port: u16,
    /// development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_json: bool,
    pub catalog_seed_path: Option<String>,
    pub tab_lock_timeout_ms: u64,
    pub event_channel_capacity: usize,
    pub request_timeout_ms: u64,
    pub chat_eligibility_days: i64,
    /// JWT 认证配置
    pub jwt: JwtConfig,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 未设置的变量使用默认值。JWT 密钥缺失时只有 debug 构建会生成临时密钥。
    pub fn from_env() -> Result<Self, JwtError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let log_json = std::env::var("LOG_JSON")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(environment == "production");

        Ok(Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment,
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json,
            catalog_seed_path: std::env::var("CATALOG_SEED_PATH")
                .ok()
                .filter(|p| !p.is_empty()),
            tab_lock_timeout_ms: std::env::var("TAB_LOCK_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5000),
            event_channel_capacity: std::env::var("EVENT_CHANNEL_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|c| *c > 0)
                .unwrap_or(1024),
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30000),
            chat_eligibility_days: std::env::var("CHAT_ELIGIBILITY_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(7),
            jwt: JwtConfig::from_env()?,
        })
    }

    /// 使用自定义值覆盖部分配置，不读取环境变量
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16, jwt: JwtConfig) -> Self {
        Self {
            work_dir: work_dir.into(),
            http_port,
            environment: "development".into(),
            log_level: "info".into(),
            log_json: false,
            catalog_seed_path: None,
            tab_lock_timeout_ms: 5000,
            event_channel_capacity: 1024,
            request_timeout_ms: 30000,
            chat_eligibility_days: 7,
            jwt,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database").join("tabs.redb")
    }

    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    pub fn tab_lock_timeout(&self) -> Duration {
        Duration::from_millis(self.tab_lock_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_layout() {
        let config = Config::with_overrides("/tmp/tabs", 8080, JwtConfig::with_secret("k".repeat(32)));
        assert_eq!(config.http_port, 8080);
        assert!(!config.is_production());
        assert_eq!(
            config.database_path(),
            PathBuf::from("/tmp/tabs/database/tabs.redb")
        );
        assert_eq!(config.log_dir(), PathBuf::from("/tmp/tabs/logs"));
        assert_eq!(config.tab_lock_timeout(), Duration::from_secs(5));
    }
}
