//! Duration logging for filesystem-heavy operations.
//!
//! ```rust,ignore
//! let mut timing = TimingGuard::scan(root.display().to_string());
//! let manifest = walk(root)?;
//! timing.record(manifest.len(), manifest.total_size());
//! // logged when `timing` drops
//! ```

use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const SLOW: Duration = Duration::from_secs(1);
const VERY_SLOW: Duration = Duration::from_secs(30);

/// The kind of work being timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Scan,
    Copy,
    Merge,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Scan => "scan",
            Operation::Copy => "copy",
            Operation::Merge => "merge",
        })
    }
}

/// Logs how long an operation took, and how much it touched, when dropped.
///
/// Under a second logs at debug, up to thirty seconds at info, beyond that
/// at warn.
pub struct TimingGuard {
    operation: Operation,
    target: String,
    start: Instant,
    files: Option<usize>,
    bytes: Option<u64>,
}

impl TimingGuard {
    pub fn new(operation: Operation, target: impl Into<String>) -> Self {
        Self {
            operation,
            target: target.into(),
            start: Instant::now(),
            files: None,
            bytes: None,
        }
    }

    pub fn scan(target: impl Into<String>) -> Self {
        Self::new(Operation::Scan, target)
    }

    pub fn copy(target: impl Into<String>) -> Self {
        Self::new(Operation::Copy, target)
    }

    pub fn merge(target: impl Into<String>) -> Self {
        Self::new(Operation::Merge, target)
    }

    /// Attach the number of files and bytes processed to the final log line.
    pub fn record(&mut self, files: usize, bytes: u64) {
        self.files = Some(files);
        self.bytes = Some(bytes);
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// `850ms`, `2.50s` or `1m 5.0s`.
pub fn format_duration(duration: Duration) -> String {
    let ms = duration.as_millis();
    if ms < 1000 {
        format!("{ms}ms")
    } else if ms < 60_000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{}m {:.1}s", ms / 60_000, (ms % 60_000) as f64 / 1000.0)
    }
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        let duration = format_duration(elapsed);

        if elapsed >= VERY_SLOW {
            warn!(
                operation = %self.operation,
                path = %self.target,
                files = ?self.files,
                bytes = ?self.bytes,
                %duration,
                "Slow operation"
            );
        } else if elapsed >= SLOW {
            info!(
                operation = %self.operation,
                path = %self.target,
                files = ?self.files,
                bytes = ?self.bytes,
                %duration,
                "Operation finished"
            );
        } else {
            debug!(
                operation = %self.operation,
                path = %self.target,
                files = ?self.files,
                bytes = ?self.bytes,
                %duration,
                "Operation finished"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(850)), "850ms");
        assert_eq!(format_duration(Duration::from_millis(2500)), "2.50s");
        assert_eq!(format_duration(Duration::from_millis(65_000)), "1m 5.0s");
    }

    #[test]
    fn test_guard_measures_elapsed() {
        let mut guard = TimingGuard::scan("Song.logicx");
        std::thread::sleep(Duration::from_millis(5));
        guard.record(3, 1024);
        assert!(guard.elapsed() >= Duration::from_millis(5));
        assert_eq!(guard.files, Some(3));
    }

    #[test]
    fn test_operation_display() {
        assert_eq!(Operation::Merge.to_string(), "merge");
        assert_eq!(TimingGuard::copy("a -> b").operation, Operation::Copy);
    }
}
