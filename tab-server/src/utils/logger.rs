//! Logging Infrastructure
//!
//! Structured logging for development and production:
//! - Console output (pretty or JSON)
//! - Daily rotating application logs under `logs/app` (deleted after 14 days)
//! - Daily rotating security logs under `logs/security` (kept)

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

/// Target used by [`crate::security_log!`]
pub const SECURITY_TARGET: &str = "security";

const APP_LOG_PREFIX: &str = "app";
const SECURITY_LOG_PREFIX: &str = "security";
const APP_LOG_RETENTION_DAYS: i64 = 14;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize the logging system
///
/// `RUST_LOG` takes precedence over `level` when set.
///
/// ```no_run
/// # fn main() -> anyhow::Result<()> {
/// // Development (console only)
/// tab_server::init_logger_with_file("debug", false, None)?;
/// # Ok(())
/// # }
/// ```
pub fn init_logger_with_file(
    level: &str,
    json_format: bool,
    log_dir: Option<&Path>,
) -> anyhow::Result<()> {
    let mut layers: Vec<BoxedLayer> = vec![console_layer(json_format)];

    if let Some(dir) = log_dir {
        let app_dir = dir.join("app");
        let security_dir = dir.join("security");
        fs::create_dir_all(&app_dir)?;
        fs::create_dir_all(&security_dir)?;

        layers.push(file_layer(
            daily_appender(&app_dir, APP_LOG_PREFIX)?,
            json_format,
            |target| target != SECURITY_TARGET,
        ));
        layers.push(file_layer(
            daily_appender(&security_dir, SECURITY_LOG_PREFIX)?,
            json_format,
            |target| target == SECURITY_TARGET,
        ));
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()?;

    Ok(())
}

/// Initialize the logging system (console only)
pub fn init_logger(level: &str, json_format: bool) -> anyhow::Result<()> {
    init_logger_with_file(level, json_format, None)
}

fn console_layer(json_format: bool) -> BoxedLayer {
    if json_format {
        fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    }
}

fn file_layer(
    appender: RollingFileAppender,
    json_format: bool,
    keep_target: fn(&str) -> bool,
) -> BoxedLayer {
    let writer = std::sync::Mutex::new(appender);
    let filter = filter_fn(move |meta| keep_target(meta.target()));

    if json_format {
        fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(writer)
            .with_filter(filter)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .with_writer(writer)
            .with_filter(filter)
            .boxed()
    }
}

/// `{prefix}.YYYY-MM-DD.log`, rotated daily
fn daily_appender(dir: &Path, prefix: &str) -> anyhow::Result<RollingFileAppender> {
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .build(dir)?;
    Ok(appender)
}

/// Delete application log files older than the retention window.
///
/// Returns the number of files removed. Security logs are never touched.
pub fn cleanup_old_logs(log_dir: &Path) -> anyhow::Result<usize> {
    let app_dir = log_dir.join("app");
    if !app_dir.exists() {
        return Ok(0);
    }

    let cutoff = chrono::Utc::now().date_naive() - chrono::Duration::days(APP_LOG_RETENTION_DAYS);
    let mut removed = 0;

    for entry in fs::read_dir(app_dir)? {
        let path = entry?.path();
        let Some(date) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(app_log_date)
        else {
            continue;
        };

        if date < cutoff {
            fs::remove_file(&path)?;
            removed += 1;
            tracing::info!(file = %path.display(), "Deleted old log file");
        }
    }

    Ok(removed)
}

fn app_log_date(file_name: &str) -> Option<NaiveDate> {
    let date = file_name
        .strip_prefix(APP_LOG_PREFIX)?
        .strip_prefix('.')?
        .strip_suffix(".log")?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

/// 每小时清理一次过期日志，直到收到 shutdown 信号
pub async fn periodic_cleanup(log_dir: PathBuf, shutdown: CancellationToken) {
    let mut interval = tokio::time::interval(Duration::from_secs(3600));

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = cleanup_old_logs(&log_dir) {
                    tracing::error!(error = %e, "Failed to cleanup old logs");
                }
            }
        }
    }
}

/// Security log helper - records authentication failures and policy denials
///
/// ```ignore
/// security_log!(WARN, "auth_failed", reason = "expired", uri = %uri);
/// security_log!(INFO, "socket_connected", user_id = user.id);
/// ```
#[macro_export]
macro_rules! security_log {
    (WARN, $event:expr, $($arg:tt)+) => {
        tracing::warn!(target: "security", event = $event, $($arg)+)
    };
    (INFO, $event:expr, $($arg:tt)+) => {
        tracing::info!(target: "security", event = $event, $($arg)+)
    };
}
