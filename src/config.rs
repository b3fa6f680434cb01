use std::fs;
use std::path::{Path, PathBuf};

use derive_setters::Setters;
use serde::Deserialize;
use tracing::{debug, info};

use crate::domain::AppError;

pub const DEFAULT_FILTER_KEYS: [&str; 6] = [
    "input",
    "title",
    "status_code",
    "content_length",
    "port",
    "url",
];

#[derive(Debug, Clone, PartialEq, Deserialize, Setters)]
#[serde(default)]
#[setters(into)]
pub struct AppConfig {
    /// Milliseconds to wait for a terminal event per loop iteration.
    pub event_poll_time: u64,
    /// How long the copied notice stays up.
    pub notice_timeout_ms: u64,
    /// Columns that get a filter input, in display order.
    pub filter_keys: Vec<String>,
    /// Column rendered as links, copied and counted.
    pub link_column: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            event_poll_time: 100,
            notice_timeout_ms: 3000,
            filter_keys: DEFAULT_FILTER_KEYS.iter().map(|k| k.to_string()).collect(),
            link_column: "url".to_string(),
        }
    }
}

impl AppConfig {
    /// Load the configuration.
    ///
    /// An explicit path must exist and parse. Without one the user config at
    /// `~/.config/probeview/config.toml` is used if present, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        match path {
            Some(path) => Self::from_file(path),
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => {
                    debug!("No config file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let content = fs::read_to_string(path)?;
        let config = Self::parse(&content)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, AppError> {
        Ok(toml::from_str::<AppConfig>(content)?)
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    home::home_dir().map(|mut path| {
        path.push(".config");
        path.push("probeview");
        path.push("config.toml");
        path
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.event_poll_time, 100);
        assert_eq!(cfg.notice_timeout_ms, 3000);
        assert_eq!(cfg.filter_keys.len(), 6);
        assert_eq!(cfg.filter_keys[5], "url");
        assert_eq!(cfg.link_column, "url");
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg = AppConfig::parse("notice_timeout_ms = 500\nfilter_keys = [\"host\", \"url\"]\n")
            .unwrap();
        assert_eq!(cfg.notice_timeout_ms, 500);
        assert_eq!(cfg.filter_keys, vec!["host", "url"]);
        assert_eq!(cfg.event_poll_time, 100);
        assert_eq!(cfg.link_column, "url");
    }

    #[test]
    fn invalid_config_is_an_error() {
        let result = AppConfig::parse("notice_timeout_ms = \"soon\"");
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }

    #[test]
    fn load_from_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "link_column = \"target\"").unwrap();
        let cfg = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(cfg.link_column, "target");
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = AppConfig::load(Some(&dir.path().join("nope.toml")));
        assert!(matches!(result, Err(AppError::IoError(_))));
    }

    #[test]
    fn setters() {
        let cfg = AppConfig::default()
            .link_column("target")
            .notice_timeout_ms(10u64);
        assert_eq!(cfg.link_column, "target");
        assert_eq!(cfg.notice_timeout_ms, 10);
    }
}
