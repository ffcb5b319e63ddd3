// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

/// Timing constants
pub mod timing {
    use std::time::Duration;

    /// Device warm-up wait after opening the camera
    pub const WARM_UP: Duration = Duration::from_millis(100);

    /// Cadence at which the UI consumer drains the preview slot
    pub const PREVIEW_POLL_INTERVAL: Duration = Duration::from_millis(33);

    /// Simulated auto-exposure time reported by the virtual camera
    /// when the shutter speed is 0 (automatic)
    pub const SIMULATED_AUTO_EXPOSURE_MICROS: u64 = 33_333;
}

/// Capture file format constants
pub mod file_formats {
    /// File extensions the storage accepts for captured images
    pub const VALID_EXTENSIONS: &[&str] = &["jpeg", "png", "gif", "bmp"];

    /// Check if a file extension is accepted for captures
    pub fn is_valid_extension(ext: &str) -> bool {
        VALID_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }
}

/// Image storage constants
pub mod storage {
    /// Filename prefix for captured images
    pub const IMAGE_PREFIX: &str = "IMG";

    /// Zero-padded digits in the sequential image id
    pub const NUM_DIGITS: usize = 4;
}

/// Default capture geometry
pub mod defaults {
    /// Default capture resolution when the caller supplies none
    pub const RESOLUTION: (u32, u32) = (1920, 1080);

    /// Default frame rate in frames per second
    pub const FRAMERATE: u32 = 30;

    /// Default extension for captured images
    pub const CAPTURE_FORMAT: &str = "png";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_check_is_case_insensitive() {
        assert!(file_formats::is_valid_extension("png"));
        assert!(file_formats::is_valid_extension("PNG"));
        assert!(!file_formats::is_valid_extension("tiff"));
    }
}
