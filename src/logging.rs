use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Route tracing output to a daily log file; the terminal belongs to the UI.
///
/// `RUST_LOG` wins over the configured filter. Keep the returned guard
/// alive until shutdown so buffered lines are flushed.
pub fn init(log_dir: Option<&Path>, default_filter: &str) -> Option<WorkerGuard> {
    let dir = log_dir?;
    if std::fs::create_dir_all(dir).is_err() {
        return None;
    }

    let appender = tracing_appender::rolling::daily(dir, "remind-tui.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .ok()?;

    Some(guard)
}
