//! Path utilities.
//!
//! This module provides utilities for working with file paths.

use std::path::{Component, Path, PathBuf};

/// Get the packsync configuration directory.
///
/// This follows XDG conventions on Linux/macOS:
/// - `$XDG_CONFIG_HOME/packsync` if set
/// - `~/.config/packsync` otherwise
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("packsync"))
}

/// Get the packsync data directory.
///
/// Working copies, version snapshots, checkouts and `snapshot.json` live
/// here unless the configuration points elsewhere.
pub fn data_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|p| p.join("packsync"))
}

/// Get the packsync logs directory.
pub fn logs_dir() -> Option<PathBuf> {
    data_dir().map(|p| p.join("logs"))
}

/// Render a relative path with `/` separators regardless of platform.
///
/// Returns `None` if the path is not within the base directory.
pub fn slash_relative(path: &Path, base: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?;
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    Some(parts.join("/"))
}

/// Check whether a file name is hidden (starts with `.`).
pub fn is_hidden_name(name: &std::ffi::OsStr) -> bool {
    name.as_encoded_bytes().first() == Some(&b'.')
}

/// Turn a free-form display name into a single safe path component.
///
/// Separators and control characters become `_`; an empty or dot-only
/// result becomes `untitled`.
pub fn sanitize_component(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "untitled".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    #[test]
    fn test_config_dir() {
        if let Some(dir) = config_dir() {
            assert!(dir.ends_with("packsync"));
        }
    }

    #[test]
    fn test_slash_relative() {
        let base = Path::new("/data/pkg.logicx");
        let path = Path::new("/data/pkg.logicx/Media/Audio/take 1.wav");
        assert_eq!(
            slash_relative(path, base),
            Some("Media/Audio/take 1.wav".to_string())
        );
        assert_eq!(slash_relative(Path::new("/elsewhere/x"), base), None);
    }

    #[test]
    fn test_is_hidden_name() {
        assert!(is_hidden_name(OsStr::new(".DS_Store")));
        assert!(!is_hidden_name(OsStr::new("Project.data")));
        assert!(!is_hidden_name(OsStr::new("")));
    }

    #[cfg(unix)]
    #[test]
    fn test_is_hidden_name_non_utf8() {
        use std::os::unix::ffi::OsStrExt;

        assert!(is_hidden_name(OsStr::from_bytes(b".\xff\xfe")));
        assert!(!is_hidden_name(OsStr::from_bytes(b"take\xff.wav")));
    }

    #[test]
    fn test_sanitize_component() {
        assert_eq!(sanitize_component("My Song"), "My Song");
        assert_eq!(sanitize_component("a/b\\c"), "a_b_c");
        assert_eq!(sanitize_component("  "), "untitled");
        assert_eq!(sanitize_component(".."), "untitled");
    }
}
