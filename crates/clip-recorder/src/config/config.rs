//! Configuration management for clip-recorder.
//!
//! Handles loading and saving TOML configuration files with cross-platform
//! paths, validation, and atomic write operations.

use crate::{
    AppError, AppResult,
    config::{CaptureConfig, LoggingConfig, ServerConfig, StorageConfig, UploadConfig},
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

const CLIP_DIR_NAME: &str = "clips";

/// Main configuration struct.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Capture device settings.
    #[serde(default)]
    pub capture: CaptureConfig,
    /// Where the clip is stored.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Simulated upload settings.
    #[serde(default)]
    pub upload: UploadConfig,
    /// Embedded web server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the platform config directory, creating a
    /// default file if none exists.
    #[track_caller]
    #[instrument]
    pub fn load() -> AppResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            info!("No config found, creating default");
            let config = Config::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    /// Load configuration from an explicit path.
    ///
    /// Missing sections and fields take their defaults.
    #[track_caller]
    #[instrument]
    pub fn load_from(config_path: &Path) -> AppResult<Self> {
        let contents = fs::read_to_string(config_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to read config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let config: Config = toml::from_str(&contents).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to parse config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(config_path = ?config_path, "Configuration loaded");

        Ok(config)
    }

    /// Check values that serde cannot.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn validate(&self) -> AppResult<()> {
        let problem = if !self.capture.video && !self.capture.audio {
            Some("capture must request at least one of video or audio")
        } else if self.capture.finalize_timeout_ms == 0 {
            Some("capture.finalize_timeout_ms must be greater than zero")
        } else if self.upload.tick_ms == 0 {
            Some("upload.tick_ms must be greater than zero")
        } else if self.upload.step_min == 0 {
            Some("upload.step_min must be greater than zero")
        } else if self.upload.step_min > self.upload.step_max {
            Some("upload.step_min must not exceed upload.step_max")
        } else if self.upload.failure_threshold_min > self.upload.failure_threshold_max {
            Some("upload.failure_threshold_min must not exceed upload.failure_threshold_max")
        } else if self.server.port == 0 {
            Some("server.port must be non-zero")
        } else {
            None
        };

        match problem {
            Some(reason) => Err(AppError::ConfigError {
                reason: reason.to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
            None => Ok(()),
        }
    }

    /// Save configuration to `config_path` using atomic write pattern.
    ///
    /// Writes to a temporary file first, then renames to prevent corruption
    /// if the process crashes during the write.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn save_to(&self, config_path: &Path) -> AppResult<()> {
        let contents = toml::to_string_pretty(self).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

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

        info!(config_path = ?config_path, "Configuration saved (atomic write)");

        Ok(())
    }

    /// Get the web server URL for opening in browser.
    pub fn server_url(&self) -> String {
        format!("http://localhost:{}", self.server.port)
    }

    /// Directory the clip store lives in.
    #[track_caller]
    pub fn clip_dir(&self) -> AppResult<PathBuf> {
        if let Some(dir) = &self.storage.directory {
            return Ok(dir.clone());
        }

        Ok(Self::project_dirs()?.data_dir().join(CLIP_DIR_NAME))
    }

    #[track_caller]
    fn config_path() -> AppResult<PathBuf> {
        let proj_dirs = Self::project_dirs()?;
        let config_dir = proj_dirs.config_dir();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
            debug!(config_dir = ?config_dir, "Created config directory");
        }

        Ok(config_dir.join("config.toml"))
    }

    #[track_caller]
    fn project_dirs() -> AppResult<ProjectDirs> {
        ProjectDirs::from("com", "clip-recorder", "Clip-Recorder").ok_or_else(|| {
            AppError::ConfigError {
                reason: "Failed to get project directories".to_string(),
                location: ErrorLocation::from(Location::caller()),
            }
        })
    }
}
