// SPDX-License-Identifier: GPL-3.0-only

//! Error types for camera control

use crate::settings::{SettingKey, SettingValue};
use std::fmt;

/// Result type alias using CameraError
pub type Result<T> = std::result::Result<T, CameraError>;

/// Errors produced by the camera core
#[derive(Debug, Clone)]
pub enum CameraError {
    /// The hardware/driver could not be acquired or reached
    DeviceUnavailable(String),
    /// A continuous-range setting was given a value outside its bounds
    SettingOutOfRange {
        key: SettingKey,
        value: SettingValue,
        min: f64,
        max: f64,
    },
    /// A discrete-choice setting was given a value outside its choice set
    InvalidChoice {
        key: SettingKey,
        value: SettingValue,
        choices: Vec<String>,
    },
    /// A setting was given a value of the wrong shape (e.g. text for a range)
    TypeMismatch {
        key: SettingKey,
        expected: &'static str,
    },
    /// A shutter-speed spec string could not be parsed
    InvalidShutterSpeed(String),
    /// The device returned an error during a single-shot capture
    CaptureFailed(String),
    /// A capture was requested while one is already in flight
    ShutterBusy,
    /// The preview producer loop ended because of a device error
    PreviewTerminated(String),
    /// Operation requires an open session
    SessionClosed,
    /// Operation conflicts with an active preview stream
    StreamActive,
    /// Storage/filesystem errors
    Storage(String),
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::DeviceUnavailable(msg) => write!(f, "Device unavailable: {}", msg),
            CameraError::SettingOutOfRange {
                key,
                value,
                min,
                max,
            } => write!(
                f,
                "Setting {} out of range: {} not in [{}, {}]",
                key, value, min, max
            ),
            CameraError::InvalidChoice {
                key,
                value,
                choices,
            } => write!(
                f,
                "Invalid choice for {}: {} not one of [{}]",
                key,
                value,
                choices.join(", ")
            ),
            CameraError::TypeMismatch { key, expected } => {
                write!(f, "Setting {} expects a {} value", key, expected)
            }
            CameraError::InvalidShutterSpeed(spec) => {
                write!(f, "Invalid shutter speed spec: {:?}", spec)
            }
            CameraError::CaptureFailed(msg) => write!(f, "Capture failed: {}", msg),
            CameraError::ShutterBusy => write!(f, "Capture already in progress"),
            CameraError::PreviewTerminated(msg) => write!(f, "Preview terminated: {}", msg),
            CameraError::SessionClosed => write!(f, "Camera session is closed"),
            CameraError::StreamActive => write!(f, "Preview stream is active"),
            CameraError::Storage(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for CameraError {}

impl From<std::io::Error> for CameraError {
    fn from(err: std::io::Error) -> Self {
        CameraError::Storage(err.to_string())
    }
}
