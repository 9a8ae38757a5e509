//! Logging setup using tracing.
//!
//! Command output goes to stdout, so logs go either to a file in the
//! logs directory or, for verbose runs, to stderr.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{fmt as tfmt, prelude::*, EnvFilter};

/// Minimum level of events that get recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Parse a level name, ignoring case. `warning` is accepted for `warn`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where log lines are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Stderr, with source locations.
    Stderr,
    /// Appended to a file; parent directories are created.
    File(PathBuf),
    /// Filtered but never written.
    Silent,
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LogLevel,
    pub target: LogTarget,
}

impl LogConfig {
    /// Debug-level logging to stderr.
    pub fn verbose() -> Self {
        Self {
            level: LogLevel::Debug,
            target: LogTarget::Stderr,
        }
    }

    /// Logging to `path` at `level`.
    pub fn file(level: LogLevel, path: impl Into<PathBuf>) -> Self {
        Self {
            level,
            target: LogTarget::File(path.into()),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            target: LogTarget::Silent,
        }
    }
}

fn open_log_file(path: &Path) -> Option<std::fs::File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok()?;
    }
    OpenOptions::new().create(true).append(true).open(path).ok()
}

/// Install the global subscriber. Call once at startup.
///
/// `RUST_LOG` takes precedence over the configured level. A log file that
/// cannot be opened turns logging silent. Returns the file being written,
/// if any.
pub fn init(config: LogConfig) -> Option<PathBuf> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));
    let subscriber = tracing_subscriber::registry().with(filter);

    match config.target {
        LogTarget::Stderr => {
            let layer = tfmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_file(true)
                .with_line_number(true);
            subscriber.with(layer).init();
            None
        }
        LogTarget::File(path) => match open_log_file(&path) {
            Some(file) => {
                let layer = tfmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file));
                subscriber.with(layer).init();
                Some(path)
            }
            None => {
                subscriber.init();
                None
            }
        },
        LogTarget::Silent => {
            subscriber.init();
            None
        }
    }
}

/// `packsync.log` in the logs directory.
pub fn default_log_path() -> Option<PathBuf> {
    crate::path::logs_dir().map(|p| p.join("packsync.log"))
}
