//! Configuration management for packsync.
//!
//! Configuration is loaded from multiple sources and merged:
//! 1. Global config: `~/.config/packsync/config.json`
//! 2. Environment variable: `PACKSYNC_CONFIG_CONTENT`
//! 3. Environment overrides: `PACKSYNC_*` variables
//!
//! Files may contain `//` and `/* */` comments.

use crate::error::{ConfigError, CoreResult};
use crate::model::Actor;
use packsync_snapshot::PackageKind;
use packsync_util::LogLevel;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the working/versions/checkouts trees and `snapshot.json`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Extension of the directory packages this workspace manages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_extension: Option<String>,

    /// Log level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,

    /// Identity recorded on versions and activity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserConfig>,
}

/// The local user's identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl UserConfig {
    /// Merge another user config into this one (other takes precedence).
    pub fn merge(mut self, other: Self) -> Self {
        if other.id.is_some() {
            self.id = other.id;
        }
        if other.name.is_some() {
            self.name = other.name;
        }
        self
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Loading order (later sources override earlier):
    /// 1. Global config from `~/.config/packsync/`
    /// 2. `PACKSYNC_CONFIG_CONTENT` environment variable
    /// 3. `PACKSYNC_*` field overrides
    pub async fn load() -> CoreResult<(Self, Vec<PathBuf>)> {
        Self::load_from(Self::global_config_dir().as_deref(), |name| {
            std::env::var(name).ok()
        })
        .await
    }

    /// Load configuration from an explicit config directory and variable lookup.
    pub async fn load_from(
        config_dir: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> CoreResult<(Self, Vec<PathBuf>)> {
        let mut config = Config::default();
        let mut sources = Vec::new();

        // 1. Load global config
        if let Some(dir) = config_dir {
            for name in &["config.json", "packsync.json", "packsync.jsonc"] {
                let path = dir.join(name);
                if path.exists() {
                    let loaded = Self::load_file(&path).await?;
                    config = config.merge(loaded);
                    sources.push(path);
                    break;
                }
            }
        }

        // 2. Load from environment variable
        if let Some(content) = env("PACKSYNC_CONFIG_CONTENT") {
            let loaded = Self::parse_jsonc(&content, "<env>")?;
            config = config.merge(loaded);
        }

        // 3. Single-field overrides
        config = config.merge(Self::from_env(&env)?);

        Ok((config, sources))
    }

    /// Build a partial config from `PACKSYNC_*` variables.
    fn from_env(env: &impl Fn(&str) -> Option<String>) -> CoreResult<Self> {
        let log_level = match env("PACKSYNC_LOG_LEVEL") {
            Some(raw) => Some(LogLevel::parse(&raw).ok_or_else(|| ConfigError::Validation {
                message: format!("PACKSYNC_LOG_LEVEL has unknown level '{raw}'"),
            })?),
            None => None,
        };

        let user = UserConfig {
            id: env("PACKSYNC_USER_ID"),
            name: env("PACKSYNC_USER_NAME"),
        };

        Ok(Config {
            data_dir: env("PACKSYNC_DATA_DIR").map(PathBuf::from),
            package_extension: env("PACKSYNC_PACKAGE_EXTENSION"),
            log_level,
            user: (user != UserConfig::default()).then_some(user),
        })
    }

    /// Get the global config directory.
    ///
    /// On Unix systems, prefers `~/.config/packsync` (XDG standard) over
    /// the platform-specific directory.
    pub fn global_config_dir() -> Option<PathBuf> {
        #[cfg(unix)]
        {
            if let Some(home) = dirs::home_dir() {
                let xdg_config = home.join(".config").join("packsync");
                if xdg_config.exists() {
                    return Some(xdg_config);
                }
            }
        }

        packsync_util::path::config_dir()
    }

    /// Load configuration from a file.
    pub async fn load_file(path: &Path) -> CoreResult<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::parse_jsonc(&content, &path.display().to_string())
    }

    /// Save configuration as `config.json` in `config_dir`, or in the
    /// global config directory when none is given.
    pub async fn save(&self, config_dir: Option<&Path>) -> CoreResult<PathBuf> {
        let dir = match config_dir {
            Some(dir) => dir.to_path_buf(),
            None => Self::global_config_dir().ok_or_else(|| {
                ConfigError::InvalidPath("Could not determine config directory".to_string())
            })?,
        };
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join("config.json");

        let content = serde_json::to_string_pretty(self).map_err(|e| ConfigError::InvalidJson {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        tokio::fs::write(&path, content).await?;
        tracing::info!("Saved configuration to {}", path.display());
        Ok(path)
    }

    /// Parse JSONC (JSON with comments).
    fn parse_jsonc(content: &str, source: &str) -> CoreResult<Self> {
        let stripped = Self::strip_comments(content);

        serde_json::from_str(&stripped).map_err(|e| {
            ConfigError::InvalidJson {
                path: source.to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Strip JSON comments.
    fn strip_comments(input: &str) -> String {
        let mut result = String::with_capacity(input.len());
        let mut chars = input.chars().peekable();
        let mut in_string = false;
        let mut escape_next = false;

        while let Some(c) = chars.next() {
            if escape_next {
                result.push(c);
                escape_next = false;
                continue;
            }

            if c == '\\' && in_string {
                result.push(c);
                escape_next = true;
                continue;
            }

            if c == '"' {
                in_string = !in_string;
                result.push(c);
                continue;
            }

            if in_string {
                result.push(c);
                continue;
            }

            if c == '/' {
                match chars.peek() {
                    Some('/') => {
                        chars.next();
                        for c in chars.by_ref() {
                            if c == '\n' {
                                result.push('\n');
                                break;
                            }
                        }
                        continue;
                    }
                    Some('*') => {
                        chars.next();
                        let mut prev = ' ';
                        for c in chars.by_ref() {
                            if prev == '*' && c == '/' {
                                break;
                            }
                            // Keep line numbers stable for parse errors
                            if c == '\n' {
                                result.push('\n');
                            }
                            prev = c;
                        }
                        continue;
                    }
                    _ => {}
                }
            }

            result.push(c);
        }

        result
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(mut self, other: Self) -> Self {
        if other.data_dir.is_some() {
            self.data_dir = other.data_dir;
        }
        if other.package_extension.is_some() {
            self.package_extension = other.package_extension;
        }
        if other.log_level.is_some() {
            self.log_level = other.log_level;
        }

        self.user = match (self.user, other.user) {
            (Some(base), Some(other)) => Some(base.merge(other)),
            (base, None) => base,
            (None, other) => other,
        };

        self
    }

    /// The data directory, falling back to the platform default.
    pub fn resolved_data_dir(&self) -> CoreResult<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => packsync_util::path::data_dir().ok_or_else(|| {
                ConfigError::InvalidPath("Could not determine data directory".to_string()).into()
            }),
        }
    }

    /// The package kind this workspace accepts.
    pub fn package_kind(&self) -> PackageKind {
        match &self.package_extension {
            Some(ext) if !ext.trim().trim_start_matches('.').is_empty() => PackageKind::new(ext),
            _ => PackageKind::default(),
        }
    }

    /// The actor for workflows run from this machine.
    ///
    /// Missing fields fall back to the login name, then to `local`.
    pub fn actor(&self) -> Actor {
        let user = self.user.clone().unwrap_or_default();
        let login = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .ok()
            .filter(|s| !s.is_empty());

        let id = user
            .id
            .or_else(|| login.clone())
            .unwrap_or_else(|| "local".to_string());
        let name = user.name.or(login).unwrap_or_else(|| id.clone());
        Actor::new(id, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_strip_comments() {
        let input = r#"{
            // Line comment
            "key": "value", // trailing comment
            /* block comment */
            "key2": "val/*not a comment*/ue"
        }"#;

        let result = Config::strip_comments(input);
        assert!(!result.contains("Line comment"));
        assert!(!result.contains("trailing comment"));
        assert!(!result.contains("block comment"));
        assert!(result.contains("val/*not a comment*/ue"));
    }

    #[test]
    fn test_parse_jsonc() {
        let input = r#"{
            // This is a comment
            "package_extension": "band",
            "log_level": "debug",
            "user": { "id": "u1" }
        }"#;

        let config = Config::parse_jsonc(input, "test").unwrap();
        assert_eq!(config.package_extension, Some("band".to_string()));
        assert_eq!(config.log_level, Some(LogLevel::Debug));
        assert_eq!(config.user.unwrap().id, Some("u1".to_string()));
    }

    #[test]
    fn test_parse_jsonc_reports_source() {
        let err = Config::parse_jsonc("{ not json", "broken.json").unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn test_merge_config() {
        let base = Config {
            package_extension: Some("logicx".to_string()),
            data_dir: Some(PathBuf::from("/data")),
            user: Some(UserConfig {
                id: Some("alice".to_string()),
                name: Some("Alice".to_string()),
            }),
            ..Default::default()
        };

        let other = Config {
            package_extension: Some("band".to_string()),
            log_level: Some(LogLevel::Warn),
            user: Some(UserConfig {
                name: Some("Alice B.".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let merged = base.merge(other);
        assert_eq!(merged.package_extension, Some("band".to_string()));
        assert_eq!(merged.data_dir, Some(PathBuf::from("/data")));
        assert_eq!(merged.log_level, Some(LogLevel::Warn));
        let user = merged.user.unwrap();
        assert_eq!(user.id, Some("alice".to_string()));
        assert_eq!(user.name, Some("Alice B.".to_string()));
    }

    #[tokio::test]
    async fn test_config_save_and_load() {
        let dir = tempfile::tempdir().unwrap();

        let config = Config {
            data_dir: Some(dir.path().join("data")),
            package_extension: Some("band".to_string()),
            user: Some(UserConfig {
                id: Some("u-1".to_string()),
                name: Some("Robin".to_string()),
            }),
            ..Default::default()
        };

        let path = config.save(Some(dir.path())).await.unwrap();
        assert_eq!(path, dir.path().join("config.json"));

        let loaded = Config::load_file(&path).await.unwrap();
        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn test_load_layers_sources() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.json"),
            r#"{ "package_extension": "band", "log_level": "info", "data_dir": "/from/file" }"#,
        )
        .unwrap();

        let env = env_from(&[
            ("PACKSYNC_CONFIG_CONTENT", r#"{ "log_level": "debug" }"#),
            ("PACKSYNC_DATA_DIR", "/from/env"),
            ("PACKSYNC_USER_NAME", "Sam"),
        ]);

        let (config, sources) = Config::load_from(Some(dir.path()), env).await.unwrap();
        assert_eq!(sources, vec![dir.path().join("config.json")]);
        assert_eq!(config.package_extension, Some("band".to_string()));
        assert_eq!(config.log_level, Some(LogLevel::Debug));
        assert_eq!(config.data_dir, Some(PathBuf::from("/from/env")));
        assert_eq!(config.user.unwrap().name, Some("Sam".to_string()));
    }

    #[tokio::test]
    async fn test_load_without_sources_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let (config, sources) = Config::load_from(Some(dir.path()), |_| None).await.unwrap();
        assert!(sources.is_empty());
        assert_eq!(config, Config::default());
        assert_eq!(config.package_kind().extension(), "logicx");
    }

    #[tokio::test]
    async fn test_load_rejects_unknown_log_level() {
        let env = env_from(&[("PACKSYNC_LOG_LEVEL", "loud")]);
        assert!(Config::load_from(None, env).await.is_err());
    }

    #[test]
    fn test_actor_prefers_configured_identity() {
        let config = Config {
            user: Some(UserConfig {
                id: Some("u-7".to_string()),
                name: Some("Kim".to_string()),
            }),
            ..Default::default()
        };
        let actor = config.actor();
        assert_eq!(actor.id, "u-7");
        assert_eq!(actor.name, "Kim");
    }
}
