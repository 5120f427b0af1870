use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::Config;

const LOG_RETENTION_DAYS: usize = 14;

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            enable_file_logs: false,
            log_dir: "./logs".to_string(),
        }
    }
}

impl From<&Config> for LogConfig {
    fn from(config: &Config) -> Self {
        Self {
            log_level: config.log_level.clone(),
            enable_file_logs: config.enable_file_logs,
            log_dir: config.log_dir.clone(),
        }
    }
}

/// Installs the global subscriber: stdout always, daily JSON files when enabled.
///
/// Diagnostic output only; the proctoring event log lives in [`crate::event_log`].
/// A subscriber installed earlier (tests, embedding) is left in place.
pub fn init_tracing(config: &LogConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let file_layer = file_appender(config).map(|appender| {
        fmt::layer()
            .with_writer(appender)
            .with_ansi(false)
            .json()
    });

    let installed = Registry::default()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .try_init();

    if let Err(e) = installed {
        if !e.to_string().contains("already been set") {
            panic!("Failed to initialize tracing: {e}");
        }
    }
}

/// Daily-rotated `proctor-shield.*.log` files under `log_dir`, two weeks kept.
fn file_appender(config: &LogConfig) -> Option<RollingFileAppender> {
    if !config.enable_file_logs {
        return None;
    }
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("proctor-shield")
        .filename_suffix("log")
        .max_log_files(LOG_RETENTION_DAYS)
        .build(&config.log_dir)
        .unwrap_or_else(|e| panic!("Failed to open log directory {}: {e}", config.log_dir));
    Some(appender)
}
