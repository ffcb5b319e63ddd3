// SPDX-License-Identifier: GPL-3.0-only

//! Application configuration

use crate::backends::camera::CameraBackendType;
use crate::backends::camera::types::{Framerate, Resolution};
use crate::constants::defaults;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Camera backend to use (V4l2 or Virtual)
    pub backend: CameraBackendType,
    /// V4L2 capture node path
    pub device_path: String,
    /// Directory captured images are written to
    pub images_dir: PathBuf,
    /// Directory *.preset files are loaded from
    pub presets_dir: PathBuf,
    /// Capture resolution override; None uses the registry default
    pub resolution: Option<Resolution>,
    /// Frame rate override. Setting this pins the frame rate: long
    /// exposures will no longer lower it automatically
    pub framerate: Option<Framerate>,
    /// File extension for captured images
    pub capture_format: String,
    /// Seconds to wait before each capture
    pub capture_delay_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        let base = dirs::picture_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            backend: CameraBackendType::default(),
            device_path: "/dev/video0".to_string(),
            images_dir: base.join("picam"),
            presets_dir: base.join("picam").join("presets"),
            resolution: None,
            framerate: None,
            capture_format: defaults::CAPTURE_FORMAT.to_string(),
            capture_delay_secs: 0,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file, falling back to defaults
    /// when the file is absent or unreadable
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => config,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Invalid config file, using defaults");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_hardware_backend() {
        let config = Config::default();
        assert_eq!(config.backend, CameraBackendType::V4l2);
        assert_eq!(config.device_path, "/dev/video0");
        assert!(config.framerate.is_none(), "framerate must not be pinned by default");
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut config = Config::default();
        config.backend = CameraBackendType::Virtual;
        config.framerate = Some(Framerate::from_int(15));
        config.save(&path).unwrap();
        assert_eq!(Config::load(&path), config);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = Config::load(Path::new("/nonexistent/picam.json"));
        assert_eq!(config, Config::default());
    }
}
