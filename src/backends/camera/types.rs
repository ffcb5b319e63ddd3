// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for camera backends

use crate::errors::{CameraError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Capture resolution in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Framerate as a fraction (numerator/denominator)
///
/// Stores the exact rate so long exposures map to precise fractional
/// framerates (a 125000 µs exposure needs exactly 8 fps, a 333333 µs
/// one needs 1000000/333333).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Framerate {
    pub num: u32,
    pub denom: u32,
}

impl Framerate {
    /// Create a new framerate from numerator and denominator, reduced
    pub fn new(num: u32, denom: u32) -> Self {
        let denom = if denom == 0 { 1 } else { denom };
        let g = gcd(num.max(1), denom);
        Self {
            num: num / g,
            denom: denom / g,
        }
    }

    /// Create a framerate from an integer (e.g., 30 becomes 30/1)
    pub fn from_int(fps: u32) -> Self {
        Self { num: fps, denom: 1 }
    }

    /// The fastest framerate a given exposure time allows:
    /// exactly 1_000_000/micros as a reduced fraction
    pub fn from_exposure_micros(micros: u64) -> Self {
        let micros = micros.max(1).min(u64::from(u32::MAX)) as u32;
        Self::new(1_000_000, micros)
    }

    /// Time budget of one frame in microseconds
    pub fn frame_micros(&self) -> u64 {
        if self.num == 0 {
            return u64::MAX;
        }
        1_000_000 * u64::from(self.denom) / u64::from(self.num)
    }

    /// Get the framerate as a floating point value
    pub fn as_f64(&self) -> f64 {
        f64::from(self.num) / f64::from(self.denom)
    }
}

impl fmt::Display for Framerate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denom == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.denom)
        }
    }
}

impl Default for Framerate {
    fn default() -> Self {
        Self { num: 30, denom: 1 }
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a.max(1)
}

/// Bytes per pixel of the canonical decoded form (RGB, no alpha)
pub const FRAME_CHANNELS: u32 = 3;

/// One captured image in canonical decoded form
///
/// Always tightly packed RGB8; produced by both the preview stream and
/// single-shot capture. The pixel data is reference counted so frames
/// can cross the producer/consumer boundary without copying.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGB8 pixel data, `width * height * FRAME_CHANNELS` bytes
    pub data: Arc<[u8]>,
    /// Monotonic frame sequence number within one stream
    pub sequence: u64,
    /// When the frame was captured (for latency diagnostics)
    pub captured_at: Instant,
}

impl Frame {
    /// Wrap raw RGB8 pixels as a frame
    pub fn from_rgb(width: u32, height: u32, data: Vec<u8>, sequence: u64) -> Self {
        debug_assert_eq!(data.len(), (width * height * FRAME_CHANNELS) as usize);
        Self {
            width,
            height,
            data: Arc::from(data.into_boxed_slice()),
            sequence,
            captured_at: Instant::now(),
        }
    }

    /// Load an image file as a frame (decoded to RGB8)
    pub fn from_file(path: &Path) -> Result<Self> {
        let img = image::open(path)
            .map_err(|e| CameraError::Storage(format!("{}: {}", path.display(), e)))?;
        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();
        Ok(Self::from_rgb(width, height, rgb.into_raw(), 0))
    }

    /// Encode the frame to a file; the format follows the extension
    pub fn save(&self, path: &Path) -> Result<()> {
        image::save_buffer(
            path,
            &self.data,
            self.width,
            self.height,
            image::ColorType::Rgb8,
        )
        .map_err(|e| CameraError::Storage(format!("{}: {}", path.display(), e)))
    }

    /// Boundary representation: raw pixel array plus shape/dtype metadata
    pub fn to_payload(&self) -> FramePayload {
        FramePayload {
            width: self.width,
            height: self.height,
            channels: FRAME_CHANNELS,
            dtype: "uint8".to_string(),
            data: self.data.to_vec(),
        }
    }
}

/// Raw pixel-array form of a frame as it crosses the remote boundary
///
/// This is the only wire shape the core authors: shape + dtype metadata
/// and the tightly packed pixel bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FramePayload {
    pub width: u32,
    pub height: u32,
    pub channels: u32,
    pub dtype: String,
    pub data: Vec<u8>,
}

impl FramePayload {
    /// Reconstruct a frame from the boundary representation
    pub fn into_frame(self) -> Result<Frame> {
        if self.channels != FRAME_CHANNELS || self.dtype != "uint8" {
            return Err(CameraError::Storage(format!(
                "unsupported payload: {} channels, dtype {}",
                self.channels, self.dtype
            )));
        }
        let expected = (self.width * self.height * self.channels) as usize;
        if self.data.len() != expected {
            return Err(CameraError::Storage(format!(
                "payload size mismatch: {} bytes for {}x{}x{}",
                self.data.len(),
                self.width,
                self.height,
                self.channels
            )));
        }
        Ok(Frame::from_rgb(self.width, self.height, self.data, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framerate_reduction() {
        let rate = Framerate::new(60000, 1000);
        assert_eq!(rate, Framerate::from_int(60));
    }

    #[test]
    fn test_framerate_from_exposure() {
        // 1/8 s exposure allows exactly 8 fps
        assert_eq!(
            Framerate::from_exposure_micros(125_000),
            Framerate::from_int(8)
        );
        // non-integer rates stay exact fractions
        let rate = Framerate::from_exposure_micros(333_333);
        assert_eq!(rate.num, 1_000_000);
        assert_eq!(rate.denom, 333_333);
    }

    #[test]
    fn test_frame_budget() {
        assert_eq!(Framerate::from_int(30).frame_micros(), 33_333);
        assert_eq!(Framerate::from_int(8).frame_micros(), 125_000);
    }

    #[test]
    fn test_payload_round_trip() {
        let frame = Frame::from_rgb(2, 2, vec![0u8; 12], 7);
        let payload = frame.to_payload();
        assert_eq!(payload.dtype, "uint8");
        let back = payload.into_frame().unwrap();
        assert_eq!(back.width, 2);
        assert_eq!(back.data.len(), 12);
    }

    #[test]
    fn test_payload_rejects_bad_shape() {
        let payload = FramePayload {
            width: 2,
            height: 2,
            channels: 3,
            dtype: "uint8".into(),
            data: vec![0u8; 5],
        };
        assert!(payload.into_frame().is_err());
    }
}
