// SPDX-License-Identifier: GPL-3.0-only

//! Setting registry for camera parameters
//!
//! Declarative catalog of every adjustable camera parameter: its kind
//! (range, choice, boolean, opaque), bounds or choice set, and default.
//! The catalog is an explicit typed dispatch table; individual setting
//! *values* live in the per-session cache, not here.

use crate::backends::camera::types::{Framerate, Resolution};
use crate::constants::defaults;
use crate::errors::{CameraError, Result};
use std::fmt;

/// Identifier of one controllable camera parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    Resolution,
    Framerate,
    Iso,
    AwbGains,
    AwbMode,
    Brightness,
    Contrast,
    Sharpness,
    Saturation,
    ExposureMode,
    MeterMode,
    DrcStrength,
    ShutterSpeed,
    Led,
}

impl SettingKey {
    /// All registry keys, for iteration
    pub const ALL: [SettingKey; 14] = [
        SettingKey::Resolution,
        SettingKey::Framerate,
        SettingKey::Iso,
        SettingKey::AwbGains,
        SettingKey::AwbMode,
        SettingKey::Brightness,
        SettingKey::Contrast,
        SettingKey::Sharpness,
        SettingKey::Saturation,
        SettingKey::ExposureMode,
        SettingKey::MeterMode,
        SettingKey::DrcStrength,
        SettingKey::ShutterSpeed,
        SettingKey::Led,
    ];

    /// Stable name used in logs and the CLI
    pub fn name(&self) -> &'static str {
        match self {
            SettingKey::Resolution => "resolution",
            SettingKey::Framerate => "framerate",
            SettingKey::Iso => "iso",
            SettingKey::AwbGains => "awb_gains",
            SettingKey::AwbMode => "awb_mode",
            SettingKey::Brightness => "brightness",
            SettingKey::Contrast => "contrast",
            SettingKey::Sharpness => "sharpness",
            SettingKey::Saturation => "saturation",
            SettingKey::ExposureMode => "exposure_mode",
            SettingKey::MeterMode => "meter_mode",
            SettingKey::DrcStrength => "drc_strength",
            SettingKey::ShutterSpeed => "shutter_speed",
            SettingKey::Led => "led",
        }
    }

    /// Validation rule for this key
    pub fn constraint(&self) -> SettingConstraint {
        match self {
            SettingKey::Resolution | SettingKey::Framerate => SettingConstraint::Opaque,
            SettingKey::Iso => SettingConstraint::IntChoice {
                choices: ISO_CHOICES,
                default: 100,
            },
            SettingKey::AwbGains => SettingConstraint::FloatRange {
                min: 0.0,
                max: 8.0,
                default: 0.0,
            },
            SettingKey::AwbMode => SettingConstraint::TextChoice {
                choices: AWB_MODES,
                default: "auto",
            },
            SettingKey::Brightness => SettingConstraint::IntRange {
                min: 0,
                max: 99,
                default: 50,
            },
            SettingKey::Contrast
            | SettingKey::Sharpness
            | SettingKey::Saturation => SettingConstraint::IntRange {
                min: -100,
                max: 100,
                default: 0,
            },
            SettingKey::ExposureMode => SettingConstraint::TextChoice {
                choices: EXPOSURE_MODES,
                default: "auto",
            },
            SettingKey::MeterMode => SettingConstraint::TextChoice {
                choices: METER_MODES,
                default: "average",
            },
            SettingKey::DrcStrength => SettingConstraint::TextChoice {
                choices: DRC_STRENGTHS,
                default: "off",
            },
            SettingKey::ShutterSpeed => SettingConstraint::IntRange {
                min: 0,
                max: 6_000_000,
                default: 0,
            },
            SettingKey::Led => SettingConstraint::Toggle { default: true },
        }
    }

    /// Registry default value for this key
    pub fn default_value(&self) -> SettingValue {
        match self.constraint() {
            SettingConstraint::IntRange { default, .. }
            | SettingConstraint::IntChoice { default, .. } => SettingValue::Int(default),
            SettingConstraint::FloatRange { default, .. } => SettingValue::Float(default),
            SettingConstraint::TextChoice { default, .. } => {
                SettingValue::Text(default.to_string())
            }
            SettingConstraint::Toggle { default } => SettingValue::Bool(default),
            SettingConstraint::Opaque => match self {
                SettingKey::Resolution => SettingValue::Size(Resolution {
                    width: defaults::RESOLUTION.0,
                    height: defaults::RESOLUTION.1,
                }),
                SettingKey::Framerate => {
                    SettingValue::Rate(Framerate::from_int(defaults::FRAMERATE))
                }
                _ => unreachable!("only resolution and framerate are opaque"),
            },
        }
    }

    /// Validate a candidate value against this key's rule
    ///
    /// Pure function of the registry and the input; out-of-range values
    /// are rejected, not clamped, and never reach the device.
    pub fn validate(&self, value: &SettingValue) -> Result<()> {
        match self.constraint() {
            SettingConstraint::IntRange { min, max, .. } => match value {
                SettingValue::Int(v) => {
                    if *v < min || *v > max {
                        Err(CameraError::SettingOutOfRange {
                            key: *self,
                            value: value.clone(),
                            min: min as f64,
                            max: max as f64,
                        })
                    } else {
                        Ok(())
                    }
                }
                _ => Err(CameraError::TypeMismatch {
                    key: *self,
                    expected: "integer",
                }),
            },
            SettingConstraint::FloatRange { min, max, .. } => match value {
                SettingValue::Float(v) => {
                    if *v < min || *v > max {
                        Err(CameraError::SettingOutOfRange {
                            key: *self,
                            value: value.clone(),
                            min,
                            max,
                        })
                    } else {
                        Ok(())
                    }
                }
                _ => Err(CameraError::TypeMismatch {
                    key: *self,
                    expected: "float",
                }),
            },
            SettingConstraint::IntChoice { choices, .. } => match value {
                SettingValue::Int(v) => {
                    if choices.contains(v) {
                        Ok(())
                    } else {
                        Err(CameraError::InvalidChoice {
                            key: *self,
                            value: value.clone(),
                            choices: choices.iter().map(|c| c.to_string()).collect(),
                        })
                    }
                }
                _ => Err(CameraError::TypeMismatch {
                    key: *self,
                    expected: "integer",
                }),
            },
            SettingConstraint::TextChoice { choices, .. } => match value {
                SettingValue::Text(v) => {
                    if choices.contains(&v.as_str()) {
                        Ok(())
                    } else {
                        Err(CameraError::InvalidChoice {
                            key: *self,
                            value: value.clone(),
                            choices: choices.iter().map(|c| (*c).to_string()).collect(),
                        })
                    }
                }
                _ => Err(CameraError::TypeMismatch {
                    key: *self,
                    expected: "text",
                }),
            },
            SettingConstraint::Toggle { .. } => match value {
                SettingValue::Bool(_) => Ok(()),
                _ => Err(CameraError::TypeMismatch {
                    key: *self,
                    expected: "boolean",
                }),
            },
            SettingConstraint::Opaque => match (self, value) {
                (SettingKey::Resolution, SettingValue::Size(_)) => Ok(()),
                (SettingKey::Resolution, _) => Err(CameraError::TypeMismatch {
                    key: *self,
                    expected: "resolution",
                }),
                (SettingKey::Framerate, SettingValue::Rate(_)) => Ok(()),
                (SettingKey::Framerate, _) => Err(CameraError::TypeMismatch {
                    key: *self,
                    expected: "framerate",
                }),
                _ => Ok(()),
            },
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// ISO sensitivities supported by the sensor
pub const ISO_CHOICES: &[i64] = &[100, 200, 320, 400, 500, 640, 800];

/// Automatic white balance modes
pub const AWB_MODES: &[&str] = &[
    "off",
    "auto",
    "sunlight",
    "cloudy",
    "shade",
    "tungsten",
    "fluorescent",
    "incandescent",
    "flash",
    "horizon",
];

/// Exposure (scene) modes
pub const EXPOSURE_MODES: &[&str] = &[
    "off",
    "auto",
    "night",
    "nightpreview",
    "backlight",
    "spotlight",
    "sports",
    "snow",
    "beach",
    "verylong",
    "fixedfps",
    "antishake",
    "fireworks",
];

/// Exposure metering modes
pub const METER_MODES: &[&str] = &["average", "spot", "backlit", "matrix"];

/// Dynamic range compression strengths
pub const DRC_STRENGTHS: &[&str] = &["off", "low", "medium", "high"];

/// Shutter delays offered by the UI, in seconds
pub const DELAY_CHOICES: &[u64] = &[0, 2, 10];

/// Validation rule attached to a setting key
#[derive(Debug, Clone, Copy)]
pub enum SettingConstraint {
    /// Inclusive integer range
    IntRange { min: i64, max: i64, default: i64 },
    /// Inclusive float range
    FloatRange { min: f64, max: f64, default: f64 },
    /// Ordered set of valid integers
    IntChoice {
        choices: &'static [i64],
        default: i64,
    },
    /// Ordered set of valid strings
    TextChoice {
        choices: &'static [&'static str],
        default: &'static str,
    },
    /// Boolean
    Toggle { default: bool },
    /// Passed through unchecked beyond its shape (resolution, framerate)
    Opaque,
}

/// One setting value, as cached and as sent to the driver
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Size(Resolution),
    Rate(Framerate),
}

impl SettingValue {
    /// Integer content, if this is an Int
    pub fn as_int(&self) -> Option<i64> {
        match self {
            SettingValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Rational content, if this is a Rate
    pub fn as_rate(&self) -> Option<Framerate> {
        match self {
            SettingValue::Rate(r) => Some(*r),
            _ => None,
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Int(v) => write!(f, "{}", v),
            SettingValue::Float(v) => write!(f, "{}", v),
            SettingValue::Bool(v) => write!(f, "{}", v),
            SettingValue::Text(v) => f.write_str(v),
            SettingValue::Size(r) => write!(f, "{}", r),
            SettingValue::Rate(r) => write!(f, "{}", r),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_accepts_bounds() {
        let key = SettingKey::Brightness;
        assert!(key.validate(&SettingValue::Int(0)).is_ok());
        assert!(key.validate(&SettingValue::Int(99)).is_ok());
        assert!(key.validate(&SettingValue::Int(50)).is_ok());
    }

    #[test]
    fn test_range_rejects_outside_bounds() {
        let key = SettingKey::Brightness;
        let err = key.validate(&SettingValue::Int(100)).unwrap_err();
        match err {
            CameraError::SettingOutOfRange { key, min, max, .. } => {
                assert_eq!(key, SettingKey::Brightness);
                assert_eq!(min, 0.0);
                assert_eq!(max, 99.0);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(key.validate(&SettingValue::Int(-1)).is_err());
    }

    #[test]
    fn test_signed_ranges() {
        for key in [
            SettingKey::Contrast,
            SettingKey::Sharpness,
            SettingKey::Saturation,
        ] {
            assert!(key.validate(&SettingValue::Int(-100)).is_ok());
            assert!(key.validate(&SettingValue::Int(100)).is_ok());
            assert!(key.validate(&SettingValue::Int(101)).is_err());
            assert!(key.validate(&SettingValue::Int(-101)).is_err());
        }
    }

    #[test]
    fn test_int_choice() {
        let key = SettingKey::Iso;
        assert!(key.validate(&SettingValue::Int(320)).is_ok());
        let err = key.validate(&SettingValue::Int(150)).unwrap_err();
        match err {
            CameraError::InvalidChoice { choices, .. } => {
                assert!(choices.contains(&"100".to_string()));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_text_choice() {
        let key = SettingKey::AwbMode;
        assert!(key.validate(&SettingValue::Text("cloudy".into())).is_ok());
        assert!(key.validate(&SettingValue::Text("Cloudy".into())).is_err());
        assert!(key.validate(&SettingValue::Text("plaid".into())).is_err());
    }

    #[test]
    fn test_type_mismatch() {
        let err = SettingKey::Brightness
            .validate(&SettingValue::Text("bright".into()))
            .unwrap_err();
        assert!(matches!(err, CameraError::TypeMismatch { .. }));
    }

    #[test]
    fn test_float_range() {
        let key = SettingKey::AwbGains;
        assert!(key.validate(&SettingValue::Float(1.5)).is_ok());
        assert!(key.validate(&SettingValue::Float(8.0)).is_ok());
        assert!(key.validate(&SettingValue::Float(8.1)).is_err());
    }

    #[test]
    fn test_defaults_validate() {
        for key in SettingKey::ALL {
            let default = key.default_value();
            assert!(
                key.validate(&default).is_ok(),
                "default for {} does not validate",
                key
            );
        }
    }

    #[test]
    fn test_opaque_checks_shape_only() {
        let key = SettingKey::Resolution;
        assert!(
            key.validate(&SettingValue::Size(Resolution {
                width: 640,
                height: 480
            }))
            .is_ok()
        );
        assert!(key.validate(&SettingValue::Int(640)).is_err());
    }
}
