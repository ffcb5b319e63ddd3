// SPDX-License-Identifier: GPL-3.0-only

//! Simulated camera backend
//!
//! Stores applied controls in memory and synthesizes frames so the full
//! session/preview/shutter stack runs without hardware. Each frame
//! carries a moving band derived from its sequence number, so motion is
//! visible in a live preview.

use super::types::{FRAME_CHANNELS, Frame, Framerate, Resolution};
use super::{CameraDriver, FrameStream};
use crate::constants::timing;
use crate::errors::{CameraError, Result};
use crate::settings::{SettingKey, SettingValue};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;
use tracing::debug;

/// In-memory camera driver
pub struct VirtualCamera {
    open: bool,
    resolution: Resolution,
    framerate: Framerate,
    controls: HashMap<SettingKey, SettingValue>,
    sequence: u64,
    /// Counts device-side control reads, so tests can assert cache hits
    reads: Arc<AtomicUsize>,
    /// When set, streams fail after this many frames (fault injection)
    fail_stream_after: Option<u64>,
}

impl VirtualCamera {
    pub fn new() -> Self {
        Self {
            open: false,
            resolution: Resolution {
                width: 640,
                height: 480,
            },
            framerate: Framerate::default(),
            controls: HashMap::new(),
            sequence: 0,
            reads: Arc::new(AtomicUsize::new(0)),
            fail_stream_after: None,
        }
    }

    /// Handle observing how many control reads reached the "device"
    pub fn read_probe(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.reads)
    }

    /// Make streams fail after delivering `frames` frames
    pub fn fail_stream_after(&mut self, frames: u64) {
        self.fail_stream_after = Some(frames);
    }

    fn require_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(CameraError::DeviceUnavailable("virtual camera not open".into()))
        }
    }

    fn shutter_micros(&self) -> u64 {
        self.controls
            .get(&SettingKey::ShutterSpeed)
            .and_then(SettingValue::as_int)
            .map(|v| v as u64)
            .unwrap_or(0)
    }
}

impl Default for VirtualCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraDriver for VirtualCamera {
    fn open(&mut self, resolution: Resolution, framerate: Framerate) -> Result<()> {
        self.open = true;
        self.resolution = resolution;
        self.framerate = framerate;
        debug!(%resolution, %framerate, "Virtual camera opened");
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
        self.controls.clear();
    }

    fn apply(&mut self, key: SettingKey, value: &SettingValue) -> Result<()> {
        self.require_open()?;
        if key == SettingKey::Framerate {
            if let SettingValue::Rate(rate) = value {
                self.framerate = *rate;
            }
        }
        if key == SettingKey::Resolution {
            if let SettingValue::Size(size) = value {
                self.resolution = *size;
            }
        }
        self.controls.insert(key, value.clone());
        Ok(())
    }

    fn read(&mut self, key: SettingKey) -> Result<SettingValue> {
        self.require_open()?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        match key {
            SettingKey::Resolution => Ok(SettingValue::Size(self.resolution)),
            SettingKey::Framerate => Ok(SettingValue::Rate(self.framerate)),
            _ => Ok(self
                .controls
                .get(&key)
                .cloned()
                .unwrap_or_else(|| key.default_value())),
        }
    }

    fn set_framerate(&mut self, rate: Framerate) -> Result<()> {
        self.require_open()?;
        self.framerate = rate;
        Ok(())
    }

    fn exposure_micros(&mut self) -> Result<u64> {
        self.require_open()?;
        let micros = self.shutter_micros();
        if micros == 0 {
            Ok(timing::SIMULATED_AUTO_EXPOSURE_MICROS)
        } else {
            Ok(micros)
        }
    }

    fn capture_still(&mut self) -> Result<Frame> {
        self.require_open()?;
        self.sequence += 1;
        Ok(synthesize(self.resolution, self.sequence))
    }

    fn open_stream(&mut self) -> Result<Box<dyn FrameStream>> {
        self.require_open()?;
        Ok(Box::new(VirtualStream {
            resolution: self.resolution,
            interval: Duration::from_micros(self.framerate.frame_micros()),
            sequence: 0,
            fail_after: self.fail_stream_after,
        }))
    }

    fn describe(&self) -> String {
        format!("virtual camera ({})", self.resolution)
    }
}

struct VirtualStream {
    resolution: Resolution,
    interval: Duration,
    sequence: u64,
    fail_after: Option<u64>,
}

impl FrameStream for VirtualStream {
    fn next_frame(&mut self) -> Result<Frame> {
        if let Some(limit) = self.fail_after
            && self.sequence >= limit
        {
            return Err(CameraError::DeviceUnavailable(
                "simulated stream fault".into(),
            ));
        }
        // pace delivery to the configured frame rate
        thread::sleep(self.interval.min(Duration::from_millis(50)));
        self.sequence += 1;
        Ok(synthesize(self.resolution, self.sequence))
    }
}

/// Build one synthetic RGB frame: vertical luminance gradient with a
/// bright band whose position follows the sequence number
fn synthesize(resolution: Resolution, sequence: u64) -> Frame {
    let width = resolution.width;
    let height = resolution.height;
    let mut data = vec![0u8; (width * height * FRAME_CHANNELS) as usize];
    let band = ((sequence * 8) % u64::from(width.max(1))) as u32;

    for y in 0..height {
        let shade = if height > 1 {
            (y * 255 / (height - 1)) as u8
        } else {
            0
        };
        for x in 0..width {
            let idx = ((y * width + x) * FRAME_CHANNELS) as usize;
            if x == band {
                data[idx] = 255;
                data[idx + 1] = 255;
                data[idx + 2] = 255;
            } else {
                data[idx] = shade;
                data[idx + 1] = shade / 2;
                data[idx + 2] = 255 - shade;
            }
        }
    }

    Frame::from_rgb(width, height, data, sequence)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_camera() -> VirtualCamera {
        let mut cam = VirtualCamera::new();
        cam.open(
            Resolution {
                width: 64,
                height: 48,
            },
            Framerate::from_int(30),
        )
        .unwrap();
        cam
    }

    #[test]
    fn test_operations_require_open() {
        let mut cam = VirtualCamera::new();
        assert!(cam.capture_still().is_err());
        assert!(cam.read(SettingKey::Iso).is_err());
    }

    #[test]
    fn test_apply_then_read_round_trip() {
        let mut cam = open_camera();
        cam.apply(SettingKey::Iso, &SettingValue::Int(400)).unwrap();
        assert_eq!(cam.read(SettingKey::Iso).unwrap(), SettingValue::Int(400));
    }

    #[test]
    fn test_exposure_follows_manual_shutter() {
        let mut cam = open_camera();
        assert_eq!(
            cam.exposure_micros().unwrap(),
            timing::SIMULATED_AUTO_EXPOSURE_MICROS
        );
        cam.apply(SettingKey::ShutterSpeed, &SettingValue::Int(125_000))
            .unwrap();
        assert_eq!(cam.exposure_micros().unwrap(), 125_000);
    }

    #[test]
    fn test_stream_frames_advance() {
        let mut cam = open_camera();
        let mut stream = cam.open_stream().unwrap();
        let first = stream.next_frame().unwrap();
        let second = stream.next_frame().unwrap();
        assert_eq!(first.sequence + 1, second.sequence);
        assert_eq!(first.width, 64);
        assert_ne!(first.data, second.data);
    }

    #[test]
    fn test_stream_fault_injection() {
        let mut cam = open_camera();
        cam.fail_stream_after(2);
        let mut stream = cam.open_stream().unwrap();
        assert!(stream.next_frame().is_ok());
        assert!(stream.next_frame().is_ok());
        assert!(stream.next_frame().is_err());
    }
}
