//! File logging for the CLI.
//!
//! Terminal output is reserved for notifications, so logs only go to a daily
//! rolling file under the data directory.

use std::env;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_FILE_PREFIX: &str = "issuedir.log";
const FILTER_ENV: &str = "ISSUEDIR_LOG";
const DEBUG_ENV: &str = "ISSUEDIR_DEBUG_LOG";

/// Installs the global subscriber. The returned guard must live until exit
/// or buffered lines are lost. Returns `None` when the log directory is unusable.
pub fn init(log_dir: &Path) -> Option<WorkerGuard> {
    if let Err(err) = fs_err::create_dir_all(log_dir) {
        eprintln!("issuedir: logging disabled: {}", err);
        return None;
    }

    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let installed = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .try_init();

    installed.ok().map(|_| guard)
}

fn env_filter() -> EnvFilter {
    let debug_enabled = env::var(DEBUG_ENV)
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);
    if debug_enabled {
        return EnvFilter::new("debug");
    }

    EnvFilter::try_from_env(FILTER_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
