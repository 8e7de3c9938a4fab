use std::path::Path;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*, registry::Registry};

/// Default filter directive when `RUST_LOG` is not set
fn default_directive(debug: bool) -> &'static str {
    if debug { "debug" } else { "info" }
}

/// Initialize logging to stderr and to a JSON log file at `log_path`.
///
/// `RUST_LOG` takes precedence over the `debug` setting. The returned guard
/// flushes the file writer on drop and must be held for the life of the
/// process.
pub fn init(log_path: &Path, debug: bool) -> anyhow::Result<WorkerGuard> {
    let file_name = log_path
        .file_name()
        .with_context(|| format!("Invalid log file path: {}", log_path.display()))?;
    let log_dir = log_path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(log_dir)?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(debug)))?;

    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(log_dir, file_name));

    Registry::default()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(
            fmt::layer()
                .json()
                .with_writer(file_writer)
                .with_target(true)
                .with_thread_ids(true),
        )
        .try_init()?;

    Ok(guard)
}
