// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! `CameraDriver` is the capability interface the session calls into:
//! every forwarded operation is listed explicitly, and the concrete
//! driver is selected by configuration at startup, never by fallback.
//!
//! Two implementations exist: a hardware-backed V4L2 driver for the Pi
//! camera node and a simulated driver for tests and camera-less
//! development.

pub mod types;
pub mod v4l2;
pub mod virtual_camera;

pub use types::{Frame, FramePayload, Framerate, Resolution};

use crate::errors::Result;
use crate::settings::{SettingKey, SettingValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Camera backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CameraBackendType {
    /// V4L2 kernel driver (real Pi camera node)
    #[default]
    V4l2,
    /// Simulated camera, no hardware required
    Virtual,
}

impl fmt::Display for CameraBackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraBackendType::V4l2 => write!(f, "v4l2"),
            CameraBackendType::Virtual => write!(f, "virtual"),
        }
    }
}

impl FromStr for CameraBackendType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "v4l2" => Ok(CameraBackendType::V4l2),
            "virtual" => Ok(CameraBackendType::Virtual),
            other => Err(format!("unknown backend: {}", other)),
        }
    }
}

/// Camera capability interface
///
/// All device access goes through this trait. Implementations may assume
/// calls are serialised by the owning session; none of the methods are
/// re-entrant.
pub trait CameraDriver: Send {
    /// Acquire the device and configure the initial geometry
    fn open(&mut self, resolution: Resolution, framerate: Framerate) -> Result<()>;

    /// Release the device; safe to call when not open
    fn close(&mut self);

    /// Write one control value to the device
    fn apply(&mut self, key: SettingKey, value: &SettingValue) -> Result<()>;

    /// Query one control value from the device
    fn read(&mut self, key: SettingKey) -> Result<SettingValue>;

    /// Change the capture frame rate
    fn set_framerate(&mut self, rate: Framerate) -> Result<()>;

    /// Effective exposure time currently used by the sensor, in µs
    fn exposure_micros(&mut self) -> Result<u64>;

    /// Blocking single-shot capture at the configured resolution
    fn capture_still(&mut self) -> Result<Frame>;

    /// Start continuous frame delivery
    ///
    /// Only one stream may exist at a time; the caller enforces the
    /// preview/capture exclusion.
    fn open_stream(&mut self) -> Result<Box<dyn FrameStream>>;

    /// Human-readable driver description for logs and the CLI
    fn describe(&self) -> String;
}

/// Continuous frame source produced by [`CameraDriver::open_stream`]
pub trait FrameStream: Send {
    /// Block until the device delivers the next frame
    fn next_frame(&mut self) -> Result<Frame>;
}

/// Instantiate the driver for a backend type
pub fn driver_for_backend(backend: CameraBackendType, device_path: &str) -> Box<dyn CameraDriver> {
    match backend {
        CameraBackendType::V4l2 => Box::new(v4l2::V4l2Camera::new(device_path)),
        CameraBackendType::Virtual => Box::new(virtual_camera::VirtualCamera::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_type_parsing() {
        assert_eq!(
            "virtual".parse::<CameraBackendType>().unwrap(),
            CameraBackendType::Virtual
        );
        assert_eq!(
            "V4L2".parse::<CameraBackendType>().unwrap(),
            CameraBackendType::V4l2
        );
        assert!("gphoto".parse::<CameraBackendType>().is_err());
    }
}
