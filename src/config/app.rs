//! Application configuration
//!
//! Every key is optional; missing keys fall back to serde defaults so that
//! older config files keep loading as new settings are added.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::constants::{config, env as env_vars, log, notices};

/// Where remote settings documents are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// JSON documents under `data_dir`
    #[default]
    File,
    /// Process-local documents, lost on exit
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub notices: NoticeSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Overrides the platform data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeSettings {
    /// How long success/failure banners stay visible
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: u64,
}

fn default_log_level() -> String {
    log::DEFAULT_LEVEL.to_string()
}

fn default_ttl_ms() -> u64 {
    notices::DEFAULT_TTL_MS
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            store: StoreSettings::default(),
            notices: NoticeSettings::default(),
        }
    }
}

impl Default for NoticeSettings {
    fn default() -> Self {
        Self {
            ttl_ms: default_ttl_ms(),
        }
    }
}

impl AppConfig {
    pub fn path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(config::APP_DIR);
        path.push(config::FILENAME);
        path
    }

    /// Load from the default location, writing a default file on first run
    pub fn load() -> Result<Self> {
        let path = Self::path();
        if !path.exists() {
            info!(path = %path.display(), "Config file not found, creating default config");
            let mut config = AppConfig::default();
            if let Err(e) = config.save_to(&path) {
                warn!(error = ?e, "Failed to write default config, continuing with defaults");
            }
            config.apply_env_overrides();
            config.validate_and_clamp();
            return Ok(config);
        }
        Self::load_from(&path)
    }

    /// Load from an explicit path; the file must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let mut config = Self::parse(&contents)
            .with_context(|| format!("Failed to parse TOML from {}", path.display()))?;
        config.apply_env_overrides();
        config.validate_and_clamp();
        info!(path = %path.display(), backend = ?config.store.backend, "Loaded config");
        Ok(config)
    }

    fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory {}", parent.display())
            })?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        info!(path = %path.display(), "Saved config");
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(level) = env::var(env_vars::LOG_LEVEL) {
            self.log_level = level;
        }
        if let Ok(dir) = env::var(env_vars::DATA_DIR) {
            if !dir.trim().is_empty() {
                self.store.data_dir = Some(PathBuf::from(dir));
            }
        }
    }

    /// Clamp values to safe ranges, warning about every correction
    fn validate_and_clamp(&mut self) {
        let level = self.log_level.trim().to_lowercase();
        if log::LEVELS.contains(&level.as_str()) {
            self.log_level = level;
        } else {
            warn!(
                log_level = %self.log_level,
                using = log::DEFAULT_LEVEL,
                "Unknown log_level, using default"
            );
            self.log_level = default_log_level();
        }

        if self.notices.ttl_ms < notices::MIN_TTL_MS {
            warn!(
                ttl_ms = self.notices.ttl_ms,
                min = notices::MIN_TTL_MS,
                "notices.ttl_ms below minimum, clamping"
            );
            self.notices.ttl_ms = notices::MIN_TTL_MS;
        } else if self.notices.ttl_ms > notices::MAX_TTL_MS {
            warn!(
                ttl_ms = self.notices.ttl_ms,
                max = notices::MAX_TTL_MS,
                "notices.ttl_ms exceeds maximum, clamping"
            );
            self.notices.ttl_ms = notices::MAX_TTL_MS;
        }
    }

    /// Directory holding the file store's documents
    pub fn documents_dir(&self) -> PathBuf {
        let base = self.store.data_dir.clone().unwrap_or_else(|| {
            let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
            path.push(config::APP_DIR);
            path
        });
        base.join(config::DOCUMENTS_DIR)
    }

    pub fn notice_ttl(&self) -> Duration {
        Duration::from_millis(self.notices.ttl_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = AppConfig::parse("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.store.backend, StoreBackend::File);
        assert_eq!(config.notices.ttl_ms, 3000);
    }

    #[test]
    fn test_parse_full_config() {
        let config = AppConfig::parse(
            r#"
log_level = "debug"

[store]
backend = "memory"
data_dir = "/srv/settings"

[notices]
ttl_ms = 5000
"#,
        )
        .unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.store.data_dir, Some(PathBuf::from("/srv/settings")));
        assert_eq!(config.notice_ttl(), Duration::from_millis(5000));
        assert_eq!(config.documents_dir(), PathBuf::from("/srv/settings/documents"));
    }

    #[test]
    fn test_unknown_backend_is_an_error() {
        assert!(AppConfig::parse("[store]\nbackend = \"firestore\"").is_err());
    }

    #[test]
    fn test_validate_and_clamp() {
        let mut config = AppConfig {
            log_level: "LOUD".to_string(),
            notices: NoticeSettings { ttl_ms: 10 },
            ..AppConfig::default()
        };
        config.validate_and_clamp();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.notices.ttl_ms, notices::MIN_TTL_MS);

        config.log_level = " WARN ".to_string();
        config.notices.ttl_ms = 1_000_000;
        config.validate_and_clamp();
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.notices.ttl_ms, notices::MAX_TTL_MS);
    }

    #[test]
    fn test_save_then_load_from() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = AppConfig {
            store: StoreSettings {
                backend: StoreBackend::Memory,
                data_dir: None,
            },
            ..AppConfig::default()
        };
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.store.backend, StoreBackend::Memory);
        assert_eq!(loaded.notices.ttl_ms, 3000);
    }

    #[test]
    fn test_load_from_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load_from(&dir.path().join("absent.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to read config"));
    }
}
