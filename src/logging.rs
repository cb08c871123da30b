//! Tracing configuration and log routing.
//!
//! Logs go to stdout through a compact formatter and to a file. `EDU_API_LOG_FILE` names the
//! file explicitly; otherwise each binary appends to `logs/<stem>.log`. File output uses a
//! non-blocking writer whose guard lives for the whole process.

use std::path::PathBuf;
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Environment variable overriding the log file location.
pub const LOG_FILE_VAR: &str = "EDU_API_LOG_FILE";
const LOG_DIR: &str = "logs";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Where file logs are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Explicit path taken from [`LOG_FILE_VAR`].
    Explicit(PathBuf),
    /// `logs/<stem>.log` under the working directory.
    Default(String),
}

impl LogTarget {
    /// Resolve the target from the override value and the binary's file stem.
    pub fn resolve(override_path: Option<String>, stem: &str) -> Self {
        match override_path.filter(|path| !path.trim().is_empty()) {
            Some(path) => Self::Explicit(PathBuf::from(path)),
            None => Self::Default(format!("{stem}.log")),
        }
    }
}

/// Configure tracing for stdout and file logging.
///
/// Respects `RUST_LOG` (defaults to `info`). `stem` names the default log file.
pub fn init_tracing(stem: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(false).compact();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer);

    let target = LogTarget::resolve(std::env::var(LOG_FILE_VAR).ok(), stem);
    match open_writer(&target) {
        Some(writer) => {
            let file_layer = fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_ansi(false)
                .compact();
            registry.with(file_layer).init();
        }
        None => registry.init(),
    }
}

/// Open a non-blocking writer for `target`, or `None` when the file cannot be opened.
fn open_writer(target: &LogTarget) -> Option<NonBlocking> {
    let (writer, guard) = match target {
        LogTarget::Explicit(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|err| eprintln!("Failed to open log file {}: {err}", path.display()))
                .ok()?;
            tracing_appender::non_blocking(file)
        }
        LogTarget::Default(file_name) => {
            if let Err(err) = std::fs::create_dir_all(LOG_DIR) {
                eprintln!("Failed to create logs directory: {err}");
                return None;
            }
            tracing_appender::non_blocking(tracing_appender::rolling::never(LOG_DIR, file_name))
        }
    };
    let _ = LOG_GUARD.set(guard);
    Some(writer)
}
