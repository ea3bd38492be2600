//! Tracing initialization: stdout (plain or JSON) plus a daily-rolling log file.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

pub const LOG_FILE_NAME: &str = "atlas-files.log";

/// Installs the global subscriber. The returned guards must be kept alive
/// until shutdown so the non-blocking writers flush.
pub fn init(cfg: &LoggingConfig) -> anyhow::Result<(WorkerGuard, WorkerGuard)> {
    std::fs::create_dir_all(&cfg.directory).ok();
    let (stdout_nb, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
    let file_appender = tracing_appender::rolling::daily(&cfg.directory, LOG_FILE_NAME);
    let (file_nb, file_guard) = tracing_appender::non_blocking(file_appender);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,tower_http=info".into());
    let stdout_json = cfg
        .json
        .then(|| tracing_subscriber::fmt::layer().json().with_writer(stdout_nb.clone()));
    let stdout_plain = (!cfg.json).then(|| tracing_subscriber::fmt::layer().with_writer(stdout_nb));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_json)
        .with(stdout_plain)
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file_nb))
        .try_init()?;

    Ok((stdout_guard, file_guard))
}
