//! Shared printing helpers for command output.

use chrono::{DateTime, Local, Utc};
use packsync_core::ActivityEvent;
use packsync_snapshot::ManifestDiff;
use serde::Serialize;

/// Print a value as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Format a timestamp in local time.
pub fn format_time(time: &DateTime<Utc>) -> String {
    time.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Shorten a string to `max` characters, marking the cut with `...`.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// Human-readable byte count.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

/// Print the events a workflow recorded, one status line each.
pub fn print_events(events: &[ActivityEvent]) {
    for event in events {
        match &event.detail {
            Some(detail) => println!("{} ({})", event.title, detail),
            None => println!("{}", event.title),
        }
    }
}

/// Print a manifest diff as `A`/`M`/`D` lines.
pub fn print_diff(diff: &ManifestDiff) {
    if diff.is_empty() {
        println!("No changes.");
        return;
    }
    for path in &diff.added {
        println!("A  {path}");
    }
    for path in &diff.modified {
        println!("M  {path}");
    }
    for path in &diff.removed {
        println!("D  {path}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a much longer title", 10), "a much ...");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }
}
