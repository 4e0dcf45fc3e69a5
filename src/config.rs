//! User configuration and preferences

use crate::domain::{CollectionId, Thresholds, PRIMARY_THRESHOLD, SECONDARY_THRESHOLD};
use crate::error::{Result, SwipeError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// What `reset` does to the decision history
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetPolicy {
    /// Keep entries as display-only records
    #[default]
    KeepHistory,
    ClearHistory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    /// Whether the welcome text has been shown
    pub welcome_shown: bool,
    /// Destination albums offered by the picker, in band order
    pub destination_albums: Vec<CollectionId>,
    /// Name of the bucket that trashed photos are collected in
    pub trash_album_name: String,
    pub primary_threshold: f64,
    pub secondary_threshold: f64,
    pub reset_policy: ResetPolicy,
    /// Processed-set state file; the data directory is used when unset
    pub state_path: Option<PathBuf>,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            welcome_shown: false,
            destination_albums: Vec::new(),
            trash_album_name: "Trash".to_string(),
            primary_threshold: PRIMARY_THRESHOLD,
            secondary_threshold: SECONDARY_THRESHOLD,
            reset_policy: ResetPolicy::default(),
            state_path: None,
        }
    }
}

impl UserConfig {
    /// Get the config file path (~/.config/photoswipe/config.json)
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("photoswipe").join("config.json"))
    }

    /// Load config from the default location, or defaults if it doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path().ok_or_else(|| {
            SwipeError::ConfigError("Could not determine config directory".to_string())
        })?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            SwipeError::ConfigError(format!("Failed to read config file: {}", e))
        })?;

        let config: Self = serde_json::from_str(&contents).map_err(|e| {
            SwipeError::ConfigError(format!("Failed to parse config file: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().ok_or_else(|| {
            SwipeError::ConfigError("Could not determine config directory".to_string())
        })?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SwipeError::ConfigError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            SwipeError::ConfigError(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, contents).map_err(|e| {
            SwipeError::ConfigError(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let valid = |v: f64| v.is_finite() && v >= 0.0;
        if !valid(self.primary_threshold) || !valid(self.secondary_threshold) {
            return Err(SwipeError::ConfigError(
                "Thresholds must be finite and non-negative".to_string(),
            ));
        }
        if self.trash_album_name.trim().is_empty() {
            return Err(SwipeError::ConfigError(
                "Trash album name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            primary: self.primary_threshold,
            secondary: self.secondary_threshold,
        }
    }
}
