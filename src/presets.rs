// SPDX-License-Identifier: GPL-3.0-only

//! Named bundles of camera settings
//!
//! A preset is an opaque data bundle applied in one call through
//! [`crate::session::CameraSession::apply_preset`]. Presets live as
//! `*.preset` JSON files in a directory; the file stem is the preset
//! name.

use crate::errors::{CameraError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// File extension of preset files
pub const PRESET_EXTENSION: &str = "preset";

/// One saved settings bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub awb_gains: f64,
    pub awb_mode: String,
    pub iso: i64,
    pub brightness: i64,
    pub contrast: i64,
    pub exposure: String,
    /// Shutter speed spec string, e.g. "1/125" or "0.5"
    pub shutter_speed: String,
    pub led: bool,
}

impl Preset {
    /// Read a preset from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| CameraError::Storage(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&contents)
            .map_err(|e| CameraError::Storage(format!("{}: {}", path.display(), e)))
    }

    /// Write the preset as JSON
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| CameraError::Storage(e.to_string()))?;
        std::fs::write(path, json)
            .map_err(|e| CameraError::Storage(format!("{}: {}", path.display(), e)))
    }
}

/// Load every `*.preset` file from a directory
///
/// Unreadable or malformed files are logged and skipped. Results are
/// sorted by name so the UI order is stable.
pub fn load_presets(dir: &Path) -> Vec<(String, Preset)> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "Could not read presets directory");
            return Vec::new();
        }
    };

    let mut presets = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(PRESET_EXTENSION) {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        match Preset::from_file(&path) {
            Ok(preset) => presets.push((name.to_string(), preset)),
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable preset"),
        }
    }

    presets.sort_by(|a, b| a.0.cmp(&b.0));
    info!(dir = %dir.display(), count = presets.len(), "Loaded presets");
    presets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Preset {
        Preset {
            awb_gains: 1.4,
            awb_mode: "off".into(),
            iso: 400,
            brightness: 55,
            contrast: 10,
            exposure: "auto".into(),
            shutter_speed: "1/250".into(),
            led: false,
        }
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("indoor.preset");
        sample().to_file(&path).unwrap();
        assert_eq!(Preset::from_file(&path).unwrap(), sample());
    }

    #[test]
    fn test_load_presets_skips_garbage() {
        let dir = tempfile::tempdir().unwrap();
        sample().to_file(&dir.path().join("b.preset")).unwrap();
        sample().to_file(&dir.path().join("a.preset")).unwrap();
        std::fs::write(dir.path().join("broken.preset"), "{ nope").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a preset").unwrap();

        let presets = load_presets(dir.path());
        let names: Vec<&str> = presets.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn test_load_presets_missing_dir() {
        assert!(load_presets(Path::new("/nonexistent/presets")).is_empty());
    }
}
