//! Host settings
//!
//! Stored as TOML at `<config dir>/surface_host.toml`. Missing or broken
//! files fall back to defaults so the host always starts.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SETTINGS_FILE: &str = "surface_host.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Input normalization knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSettings {
    /// Overrides the platform double-click interval.
    pub double_click_interval_ms: Option<u64>,
    /// Two presses closer than this (sum of axis deltas) may form a double click.
    pub double_click_distance: i32,
    pub leave_poll_interval_ms: u64,
    /// Ask the engine whether presses land on window-dragging regions.
    pub draggable_regions: bool,
    pub pixels_per_line: f32,
}

impl InputSettings {
    pub fn leave_poll_interval(&self) -> Duration {
        Duration::from_millis(self.leave_poll_interval_ms)
    }

    pub fn double_click_interval(&self) -> Option<Duration> {
        self.double_click_interval_ms.map(Duration::from_millis)
    }
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            double_click_interval_ms: None,
            double_click_distance: 15,
            leave_poll_interval_ms: 200,
            draggable_regions: true,
            pixels_per_line: 100.0 / 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "Surface Host".to_string(),
            width: 1024,
            height: 768,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub verbose: bool,
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            verbose: false,
            filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostSettings {
    pub input: InputSettings,
    pub window: WindowSettings,
    pub logging: LoggingSettings,
}

impl HostSettings {
    /// `<config dir>/surface_host.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "SurfaceHost", "Surface_Host")
            .map(|dirs| dirs.config_dir().join(SETTINGS_FILE))
    }

    /// Load settings, falling back to defaults on any error.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!("No settings at {:?}, using defaults", path);
            return Self::default();
        }
        match Self::try_load(path) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Ignoring settings at {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    pub fn try_load(path: &Path) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Write settings as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        tracing::debug!("Saved settings to {:?}", path);
        Ok(())
    }
}
