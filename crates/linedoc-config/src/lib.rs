use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const CONFIG_DIR: &str = "~/.config/linedoc";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value in config file at {config_path}: {reason}")]
    ConfigValueError { config_path: PathBuf, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Save on every change instead of marking the document dirty
    pub auto_save: bool,
    /// Number of undo snapshots kept per document
    pub history_capacity: usize,
    pub backup: BackupConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auto_save: false,
            history_capacity: 256,
            backup: BackupConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    pub enabled: bool,
    /// Minimum age of the newest backup before another is made; 0 backs up every save
    pub interval_minutes: u64,
    /// Backups kept per document; 0 keeps all of them
    pub max_count: usize,
    pub directory: PathBuf,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_minutes: 1,
            max_count: 100,
            directory: Config::default_backup_directory(),
        }
    }
}

impl BackupConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes * 60)
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        if config.history_capacity < 2 {
            return Err(ConfigError::ConfigValueError {
                config_path: config_path.to_path_buf(),
                reason: format!(
                    "history_capacity must be at least 2, got {}",
                    config.history_capacity
                ),
            });
        }

        // Expand shell variables and tilde in the backup directory
        config.backup.directory =
            Self::expand_path(&config.backup.directory).unwrap_or(config.backup.directory);

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde(CONFIG_DIR);
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    fn default_backup_directory() -> PathBuf {
        let config_dir = shellexpand::tilde(CONFIG_DIR);
        PathBuf::from(config_dir.as_ref()).join("Backups")
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}
