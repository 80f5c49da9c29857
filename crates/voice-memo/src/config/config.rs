//! Configuration management for voice-memo.
//!
//! Handles loading and saving TOML configuration files with cross-platform
//! paths and atomic write operations.

use crate::{
    AppError, AppResult,
    config::{LoggingConfig, RecorderConfig, StorageConfig},
};

use std::{
    fs,
    io::Write,
    panic::Location,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use voice_memo_core::{ControllerConfig, DEFAULT_POLL_INTERVAL, StartRequest};

/// Main configuration struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Recording parameters.
    #[serde(default)]
    pub recorder: RecorderConfig,
    /// Recording storage location.
    pub storage: StorageConfig,
    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from disk, creating default if not found.
    #[track_caller]
    #[instrument]
    pub fn load() -> AppResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let contents = fs::read_to_string(&config_path).map_err(|e| AppError::ConfigError {
                reason: format!("Failed to read config: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

            let config = Self::parse(&contents)?;
            info!(config_path = ?config_path, "Configuration loaded");

            Ok(config)
        } else {
            info!("No config found, creating default");
            Self::create_default()
        }
    }

    /// Parse configuration from TOML text.
    #[track_caller]
    pub fn parse(contents: &str) -> AppResult<Self> {
        toml::from_str(contents).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to parse config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// Render as TOML.
    #[track_caller]
    pub fn to_toml(&self) -> AppResult<String> {
        toml::to_string_pretty(self).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// Save configuration to disk using atomic write pattern.
    ///
    /// Writes to a temporary file first, then renames to prevent corruption
    /// if the process crashes during the write.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn save(&self) -> AppResult<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)?;
        info!(config_path = ?config_path, "Configuration saved (atomic write)");
        Ok(())
    }

    #[track_caller]
    pub(crate) fn save_to(&self, config_path: &Path) -> AppResult<()> {
        let contents = self.to_toml()?;
        let temp_path = config_path.with_extension("toml.tmp");

        let mut temp_file = fs::File::create(&temp_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to create temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        temp_file
            .write_all(contents.as_bytes())
            .map_err(|e| AppError::ConfigError {
                reason: format!("Failed to write temp config file: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        temp_file.sync_all().map_err(|e| AppError::ConfigError {
            reason: format!("Failed to sync temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        fs::rename(&temp_path, config_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to rename temp config to final: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        Ok(())
    }

    /// Controller settings derived from this configuration.
    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            recordings_root: self.storage.recordings_root.clone(),
            capture_timeout: self.recorder.capture_timeout(),
            duration_source: self.recorder.duration_source,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// A start request using the configured folder and encoding.
    pub fn start_request(&self, name: Option<String>) -> StartRequest {
        let request = StartRequest::new(self.recorder.folder_id.clone(), self.recorder.format)
            .sample_rate(self.recorder.sample_rate)
            .bit_rate(self.recorder.bit_rate);

        match name {
            Some(name) => request.name(name),
            None => request,
        }
    }

    #[track_caller]
    pub(crate) fn config_path() -> AppResult<PathBuf> {
        let proj_dirs = Self::project_dirs()?;
        let config_dir = proj_dirs.config_dir();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
            debug!(config_dir = ?config_dir, "Created config directory");
        }

        Ok(config_dir.join("config.toml"))
    }

    /// Platform data directory, created if missing.
    #[track_caller]
    pub(crate) fn data_dir() -> AppResult<PathBuf> {
        let proj_dirs = Self::project_dirs()?;
        let data_dir = proj_dirs.data_dir();

        if !data_dir.exists() {
            fs::create_dir_all(data_dir)?;
            debug!(data_dir = ?data_dir, "Created data directory");
        }

        Ok(data_dir.to_path_buf())
    }

    #[track_caller]
    fn project_dirs() -> AppResult<ProjectDirs> {
        ProjectDirs::from("com", "voice-memo", "Voice-Memo").ok_or_else(|| {
            AppError::ConfigError {
                reason: "Failed to get project directories".to_string(),
                location: ErrorLocation::from(Location::caller()),
            }
        })
    }

    #[track_caller]
    fn create_default() -> AppResult<Self> {
        let config = Config {
            recorder: RecorderConfig::default(),
            storage: StorageConfig {
                recordings_root: Self::data_dir()?,
            },
            logging: LoggingConfig::default(),
        };

        config.save()?;

        info!(
            recordings_root = ?config.storage.recordings_root,
            "Default config created"
        );

        Ok(config)
    }
}
