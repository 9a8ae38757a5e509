//! Logging initialization.
//!
//! Verbose runs log to stderr; otherwise logs go to a file in the
//! standard log directory so command output stays clean.

use packsync_util::log::{default_log_path, init, LogConfig};
use packsync_util::LogLevel;
use std::path::PathBuf;

/// Initialize logging once for the process.
///
/// Returns the log file path if logging to file.
pub fn init_logging(verbose: bool, level: Option<LogLevel>) -> Option<PathBuf> {
    let config = if verbose {
        LogConfig::verbose()
    } else {
        match default_log_path() {
            Some(path) => LogConfig::file(level.unwrap_or_default(), path),
            None => LogConfig::default(),
        }
    };
    init(config)
}
