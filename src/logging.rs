//! Logging configuration for tonkbot

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Registry;

use crate::config::LoggingConfig;
use crate::Result;

/// Build the level filter: `RUST_LOG` wins, then `--debug`, then the config
fn env_filter(config: &LoggingConfig, debug: bool) -> EnvFilter {
    if std::env::var("RUST_LOG").is_ok() {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return filter;
        }
    }
    let level = if debug { "debug" } else { config.level.as_str() };
    EnvFilter::new(format!("warn,tonkbot={level}"))
}

/// Initialize logging to stderr and, when `log_file` is given, to that file
///
/// The file is appended to across runs. The returned guard flushes the file
/// writer when dropped and must be held until the process exits.
pub fn init_logging(
    config: &LoggingConfig,
    log_file: Option<&Path>,
    debug: bool,
) -> Result<Option<WorkerGuard>> {
    let console_layer = fmt::layer()
        .with_target(true)
        .with_file(debug)
        .with_line_number(debug)
        .with_writer(std::io::stderr);

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };
            if !dir.exists() {
                std::fs::create_dir_all(dir)?;
            }
            let file_name = path
                .file_name()
                .map_or_else(|| "tonkbot.log".into(), ToOwned::to_owned);

            let file_appender = tracing_appender::rolling::never(dir, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .with_target(true)
                .with_writer(non_blocking)
                .with_ansi(false); // No colors in file
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    Registry::default()
        .with(env_filter(config, debug))
        .with(console_layer)
        .with(file_layer)
        .init();

    match log_file {
        Some(path) => tracing::debug!("Logging to stderr and {}", path.display()),
        None => tracing::debug!("Logging to stderr"),
    }

    Ok(guard)
}
