use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Json(#[from] serde_json::Error),
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("~/.local/share"))
        .join("streakly")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    /// Quiet period before a journal draft is written.
    pub autosave_delay_ms: u64,
    /// Wait before another sign-in code may be requested.
    pub resend_cooldown_secs: u64,
    pub debug_logging: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            autosave_delay_ms: 1000,
            resend_cooldown_secs: 60,
            debug_logging: false,
        }
    }
}

impl AppConfig {
    /// Reads the config at `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// `config.json` in the platform config directory.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("streakly")
            .join("config.json")
    }

    pub fn autosave_delay(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.autosave_delay_ms.min(i64::MAX as u64) as i64)
    }

    pub fn resend_cooldown(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.resend_cooldown_secs.min(i64::MAX as u64 / 1000) as i64)
    }

    /// Level the host should give this crate's log target.
    pub fn log_level(&self) -> log::LevelFilter {
        if self.debug_logging {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.autosave_delay(), chrono::Duration::seconds(1));
        assert_eq!(config.log_level(), log::LevelFilter::Info);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"autosave_delay_ms": 250, "debug_logging": true}"#).unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.autosave_delay_ms, 250);
        assert_eq!(config.resend_cooldown_secs, 60);
        assert_eq!(config.log_level(), log::LevelFilter::Debug);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = AppConfig {
            data_dir: dir.path().to_path_buf(),
            resend_cooldown_secs: 30,
            ..AppConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(AppConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(AppConfig::load(&path), Err(ConfigError::Json(_))));
    }
}
