//! Configuration for the mentor client.
//!
//! Stored as JSON at `.mentor/config.json`. Every field has a default, so a
//! missing file or a partial file is fine. Environment variables override
//! the file; command-line flags override both (applied by the CLI).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory holding config and logs, relative to the working directory.
pub const MENTOR_DIR: &str = ".mentor";

/// Config file name inside [`MENTOR_DIR`].
pub const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding [`Config::endpoint`].
pub const ENV_ENDPOINT: &str = "MENTOR_ENDPOINT";

/// Environment variable overriding [`Config::platform`].
pub const ENV_PLATFORM: &str = "MENTOR_PLATFORM";

/// Main configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the chat service.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Platform id sent with each chat request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,

    /// Per-request timeout. Unset means requests may hang forever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    /// Where the interactive page writes its diagnostic log.
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,

    /// Page title.
    #[serde(default = "default_title")]
    pub title: String,

    /// Page subtitle.
    #[serde(default = "default_subtitle")]
    pub subtitle: String,
}

fn default_endpoint() -> String {
    "http://localhost:8000".into()
}

fn default_log_file() -> PathBuf {
    Path::new(MENTOR_DIR).join("mentor.log")
}

fn default_title() -> String {
    "CyberMentor".into()
}

fn default_subtitle() -> String {
    "Your friendly cybersecurity tutor".into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            platform: None,
            request_timeout_secs: None,
            log_file: default_log_file(),
            title: default_title(),
            subtitle: default_subtitle(),
        }
    }
}

impl Config {
    /// Default config file location.
    pub fn default_path() -> PathBuf {
        Path::new(MENTOR_DIR).join(CONFIG_FILE)
    }

    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Parse)
    }

    /// Load configuration, falling back to defaults when the file is absent.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }
        std::fs::write(path, content).map_err(ConfigError::Io)
    }

    /// Apply overrides from the process environment.
    #[must_use]
    pub fn with_env(self) -> Self {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides using `lookup` in place of the process environment.
    #[must_use]
    pub fn with_env_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup(ENV_ENDPOINT).filter(|v| !v.trim().is_empty()) {
            self.endpoint = endpoint;
        }
        if let Some(platform) = lookup(ENV_PLATFORM) {
            self.platform = if platform.trim().is_empty() {
                None
            } else {
                Some(platform)
            };
        }
        self
    }

    /// Request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

/// Errors that can occur when working with configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error reading or writing config.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing config JSON.
    #[error("Parse error: {0}")]
    Parse(#[source] serde_json::Error),

    /// Error serializing config to JSON.
    #[error("Serialize error: {0}")]
    Serialize(#[source] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.endpoint, "http://localhost:8000");
        assert_eq!(config.platform, None);
        assert_eq!(config.request_timeout(), None);
        assert_eq!(config.title, "CyberMentor");
        assert_eq!(config.log_file, Path::new(".mentor").join("mentor.log"));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"platform":"picoCTF"}"#).unwrap();
        assert_eq!(config.platform.as_deref(), Some("picoCTF"));
        assert_eq!(config.endpoint, "http://localhost:8000");
        assert_eq!(config.subtitle, Config::default().subtitle);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let config = Config {
            endpoint: "https://mentor.example.com/api".into(),
            platform: Some("tryhackme".into()),
            request_timeout_secs: Some(30),
            ..Config::default()
        };
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.request_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_or_default(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_ENDPOINT, "http://10.0.0.5:9000"),
            (ENV_PLATFORM, "hackthebox"),
        ]
        .into_iter()
        .collect();

        let config =
            Config::default().with_env_from(|k| env.get(k).map(|v| (*v).to_string()));
        assert_eq!(config.endpoint, "http://10.0.0.5:9000");
        assert_eq!(config.platform.as_deref(), Some("hackthebox"));
    }

    #[test]
    fn test_empty_env_values() {
        let base = Config {
            platform: Some("picoCTF".into()),
            ..Config::default()
        };
        let config = base.with_env_from(|_| Some(String::new()));
        // Empty endpoint is ignored; empty platform clears it.
        assert_eq!(config.endpoint, "http://localhost:8000");
        assert_eq!(config.platform, None);
    }
}
