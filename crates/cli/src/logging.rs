//! Logging setup
//!
//! Logs go to stderr and, unless disabled, to `logs/native.log` rotated
//! daily. Changes under `logs/` are never reported by the watcher.
//! `RUST_LOG` takes precedence over the configured level:
//! ```bash
//! RUST_LOG=watcher=trace extendify watch ~/.config/extendify
//! ```

use crate::system_config::LoggingConfig;
use anyhow::{Context, Result};
use extendify_core::Paths;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "native.log";

/// Install the global subscriber
///
/// Keep the returned guard alive for the whole process so buffered file
/// output is flushed on exit.
pub fn init(paths: &Paths, config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let env = std::env::var("RUST_LOG").ok();
    let mut filter = if env.is_some() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(&config.level)
            .with_context(|| format!("Invalid log level: {}", config.level))?
    };
    // notify traces every raw OS event, writes to our own log file included
    if !env.as_deref().is_some_and(|env| env.contains("notify")) {
        filter = filter.add_directive("notify=info".parse()?);
    }

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    let (file_layer, guard) = if config.file {
        let log_dir = paths.log_dir(true)?;
        let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_thread_names(true);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install logger")?;

    Ok(guard)
}
