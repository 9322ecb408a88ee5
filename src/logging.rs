//! File logging. The terminal belongs to the TUI, so everything goes to a
//! daily rolling file under the profile's data directory.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

pub const LOG_FILE_PREFIX: &str = "tasker.log";

/// Environment variable consulted before `RUST_LOG`
pub const LOG_ENV_VAR: &str = "TASKER_LOG";

const DEFAULT_LEVEL: &str = "info";

/// Install the global subscriber writing into `log_dir`.
///
/// The returned guard flushes buffered lines when dropped, so `main` must keep
/// it alive until exit. Returns `None` when the directory cannot be created.
pub fn init_logging(log_dir: &Path, level: Option<&str>) -> Option<WorkerGuard> {
    if std::fs::create_dir_all(log_dir).is_err() {
        return None;
    }

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let subscriber = tracing_subscriber::registry()
        .with(build_env_filter(level))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        );

    // A subscriber may already be installed (tests); the guard is still needed
    let _ = tracing::subscriber::set_global_default(subscriber);

    Some(guard)
}

/// Precedence: explicit level, then `TASKER_LOG`, then `RUST_LOG`, then `info`
fn build_env_filter(level: Option<&str>) -> EnvFilter {
    let env = [LOG_ENV_VAR, "RUST_LOG"]
        .iter()
        .filter_map(|name| std::env::var(name).ok());

    level
        .map(str::to_string)
        .into_iter()
        .chain(env)
        .find_map(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LEVEL))
}
