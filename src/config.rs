// SPDX-License-Identifier: GPL-3.0-only

use crate::backends::camera::CameraSelector;
use crate::constants::{self, virtual_camera as vc};
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Directory name under the platform config/cache directories
const CONFIG_DIR_NAME: &str = "simplesnap";
const CONFIG_FILE_NAME: &str = "config.json";

/// Virtual camera settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VirtualCameraConfig {
    /// Still image returned for every capture (test pattern when unset)
    pub photo_source: Option<PathBuf>,
    /// Clip copied into each recording (recordings fail when unset)
    pub video_source: Option<PathBuf>,
    /// Sensor rotation reported for the back lens, clockwise degrees
    pub back_rotation_degrees: i32,
    /// Sensor rotation reported for the front lens, clockwise degrees
    pub front_rotation_degrees: i32,
    /// Generated test pattern width
    pub pattern_width: u32,
    /// Generated test pattern height
    pub pattern_height: u32,
}

impl Default for VirtualCameraConfig {
    fn default() -> Self {
        Self {
            photo_source: None,
            video_source: None,
            back_rotation_degrees: vc::BACK_ROTATION_DEGREES,
            front_rotation_degrees: vc::FRONT_ROTATION_DEGREES,
            pattern_width: vc::PATTERN_WIDTH,
            pattern_height: vc::PATTERN_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Display name; media lands in `DCIM/<app_name>`
    pub app_name: String,
    /// Root of the shared media library (home directory when unset)
    pub media_root: Option<PathBuf>,
    /// Where recordings are written before being copied to the library
    pub scratch_dir: Option<PathBuf>,
    /// How long the last captured photo is shown, in milliseconds
    pub photo_display_ms: u64,
    /// Record an audio track with videos
    pub record_audio: bool,
    /// Lens selected at startup
    pub default_camera: CameraSelector,
    /// Virtual camera settings
    pub virtual_camera: VirtualCameraConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: constants::APP_NAME.to_string(),
            media_root: None,
            scratch_dir: None,
            photo_display_ms: constants::PHOTO_DISPLAY_DURATION.as_millis() as u64,
            record_audio: true,
            default_camera: CameraSelector::default(),
            virtual_camera: VirtualCameraConfig::default(),
        }
    }
}

impl Config {
    /// Default location of the config file
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load the config from its default location
    ///
    /// A missing file yields defaults silently; an unreadable or invalid file
    /// yields defaults with a warning.
    pub fn load() -> Self {
        match Self::default_path() {
            Ok(path) => Self::load_from(&path).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "Using default config");
                Self::default()
            }),
            Err(e) => {
                warn!(error = %e, "Using default config");
                Self::default()
            }
        }
    }

    /// Load the config from a specific file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Write the config to its default location
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::default_path()?)
    }

    /// Write the config as pretty JSON, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        debug!(path = %path.display(), "Config saved");
        Ok(())
    }

    /// Root of the shared media library
    pub fn media_root(&self) -> PathBuf {
        self.media_root.clone().unwrap_or_else(|| {
            dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
        })
    }

    /// Directory holding in-progress recordings
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(CONFIG_DIR_NAME)
                .join("recordings")
        })
    }

    /// Display window for the last captured photo
    pub fn photo_display_duration(&self) -> Duration {
        Duration::from_millis(self.photo_display_ms)
    }
}
