// SPDX-License-Identifier: GPL-3.0-only

//! Camera session
//!
//! `CameraSession` owns the open/closed lifecycle of the capture device
//! and the per-session settings cache. All operations take `&self`; the
//! session is shared via `Arc` between the UI context and background
//! workers, with the driver behind its own lock so device calls are
//! serialised.
//!
//! Never more than one of {preview stream, single-shot capture} is
//! active at a time; the shutter controller stops preview before it
//! captures, and the session refuses a capture while a stream is open.

use crate::backends::camera::types::{Frame, Framerate, Resolution};
use crate::backends::camera::{CameraDriver, FrameStream, driver_for_backend};
use crate::config::Config;
use crate::constants::timing;
use crate::errors::{CameraError, Result};
use crate::presets::Preset;
use crate::settings::{SettingKey, SettingValue};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Closed,
    Open { streaming: bool },
}

/// Live handle to the capture device
pub struct CameraSession {
    driver: Mutex<Box<dyn CameraDriver>>,
    /// Shared with [`PreviewFrames`] so a stream can clear the
    /// streaming flag when it is torn down
    state: Arc<Mutex<SessionState>>,
    /// Last-known setting values; filled lazily from the device on `get`
    cache: Mutex<HashMap<SettingKey, SettingValue>>,
    resolution_override: Option<Resolution>,
    /// A `Some` here pins the frame rate: long exposures will warn
    /// instead of lowering it
    framerate_override: Option<Framerate>,
    capture_delay: Mutex<Duration>,
}

impl CameraSession {
    /// Create a session over an explicit driver
    pub fn new(
        driver: Box<dyn CameraDriver>,
        resolution: Option<Resolution>,
        framerate: Option<Framerate>,
    ) -> Self {
        Self {
            driver: Mutex::new(driver),
            state: Arc::new(Mutex::new(SessionState::Closed)),
            cache: Mutex::new(HashMap::new()),
            resolution_override: resolution,
            framerate_override: framerate,
            capture_delay: Mutex::new(Duration::ZERO),
        }
    }

    /// Create a session from configuration, with the backend the config
    /// selects
    pub fn from_config(config: &Config) -> Self {
        let driver = driver_for_backend(config.backend, &config.device_path);
        let mut session = Self::new(driver, config.resolution, config.framerate);
        session.capture_delay = Mutex::new(Duration::from_secs(config.capture_delay_secs));
        session
    }

    /// Acquire the device. Re-entrant open is a no-op.
    ///
    /// Seeds the cache with the constructor overrides (else registry
    /// defaults) for resolution and frame rate, switches the shutter to
    /// automatic, and waits out the sensor warm-up before returning.
    pub fn open(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if matches!(*state, SessionState::Open { .. }) {
            return Ok(());
        }

        let resolution = self.resolution_override.unwrap_or(Resolution {
            width: crate::constants::defaults::RESOLUTION.0,
            height: crate::constants::defaults::RESOLUTION.1,
        });
        let framerate = self.framerate_override.unwrap_or_default();

        {
            let mut driver = self.driver.lock().unwrap();
            driver.open(resolution, framerate)?;
            // shutter speed 0 == automatic exposure
            if let Err(e) = driver.apply(SettingKey::ShutterSpeed, &SettingValue::Int(0)) {
                driver.close();
                return Err(e);
            }
        }

        let mut cache = self.cache.lock().unwrap();
        cache.clear();
        cache.insert(SettingKey::Resolution, SettingValue::Size(resolution));
        cache.insert(SettingKey::Framerate, SettingValue::Rate(framerate));
        cache.insert(SettingKey::ShutterSpeed, SettingValue::Int(0));
        drop(cache);

        std::thread::sleep(timing::WARM_UP);
        *state = SessionState::Open { streaming: false };
        info!(%resolution, %framerate, "Camera session opened");
        Ok(())
    }

    /// Release the device. Safe to call on an already-closed session.
    pub fn close(&self) {
        let mut state = self.state.lock().unwrap();
        if *state == SessionState::Closed {
            debug!("Session already closed");
            return;
        }
        self.driver.lock().unwrap().close();
        self.cache.lock().unwrap().clear();
        *state = SessionState::Closed;
        info!("Camera session closed");
    }

    /// Whether the session currently holds the device
    pub fn is_open(&self) -> bool {
        matches!(*self.state.lock().unwrap(), SessionState::Open { .. })
    }

    fn require_open(&self) -> Result<()> {
        match *self.state.lock().unwrap() {
            SessionState::Open { .. } => Ok(()),
            SessionState::Closed => Err(CameraError::SessionClosed),
        }
    }

    /// Read a setting: cached value if present, else queried from the
    /// device and cached. Never mutates hardware state.
    pub fn get(&self, key: SettingKey) -> Result<SettingValue> {
        self.require_open()?;
        if let Some(value) = self.cache.lock().unwrap().get(&key) {
            return Ok(value.clone());
        }

        let value = self.driver.lock().unwrap().read(key)?;
        self.cache
            .lock()
            .unwrap()
            .entry(key)
            .or_insert_with(|| value.clone());
        Ok(value)
    }

    /// Validate and apply a setting, then record it in the cache
    ///
    /// Validation errors propagate unchanged and never reach the device
    /// or the cache. The cache update is atomic per key: a concurrent
    /// reader sees either the old or the new value, never a torn one.
    pub fn set(&self, key: SettingKey, value: SettingValue) -> Result<()> {
        self.require_open()?;
        key.validate(&value)?;
        self.driver.lock().unwrap().apply(key, &value)?;
        debug!(key = %key, value = %value, "Set camera setting");
        self.cache.lock().unwrap().insert(key, value);
        Ok(())
    }

    /// Per-session delay applied before each capture
    pub fn set_capture_delay(&self, delay: Duration) {
        debug!(seconds = delay.as_secs_f64(), "Set capture delay");
        *self.capture_delay.lock().unwrap() = delay;
    }

    pub fn capture_delay(&self) -> Duration {
        *self.capture_delay.lock().unwrap()
    }

    /// Set the shutter speed from a spec string: `"1/N"` or decimal
    /// seconds. Returns the stored exposure time in microseconds.
    ///
    /// Side effect worth knowing about: if the exposure is longer than
    /// the current frame interval and the frame rate was not pinned at
    /// construction, the frame rate is lowered to `1_000_000/µs` before
    /// the shutter speed is applied. A pinned frame rate only logs a
    /// warning and the camera may clip the exposure.
    pub fn set_shutter_speed(&self, spec: &str) -> Result<u64> {
        self.require_open()?;
        let micros = parse_shutter_spec(spec)?;
        // reject an out-of-range exposure before touching the frame rate
        SettingKey::ShutterSpeed.validate(&SettingValue::Int(micros as i64))?;

        let framerate = self
            .get(SettingKey::Framerate)?
            .as_rate()
            .unwrap_or_default();
        if framerate.frame_micros() < micros {
            warn!(%framerate, micros, "Framerate is too fast for this shutter speed");
            if self.framerate_override.is_none() {
                let new_rate = Framerate::from_exposure_micros(micros);
                info!(%new_rate, "Changing the framerate to fit the exposure");
                self.driver.lock().unwrap().set_framerate(new_rate)?;
                self.cache
                    .lock()
                    .unwrap()
                    .insert(SettingKey::Framerate, SettingValue::Rate(new_rate));
            }
        }

        debug!(spec, micros, "Set shutter speed");
        self.set(SettingKey::ShutterSpeed, SettingValue::Int(micros as i64))?;
        Ok(micros)
    }

    /// Set the frame rate to the fastest the current exposure allows:
    /// exactly `1_000_000 / exposure_micros`, as a rational
    pub fn maximize_framerate(&self) -> Result<Framerate> {
        self.require_open()?;
        let mut driver = self.driver.lock().unwrap();
        let exposure = driver.exposure_micros()?;
        let rate = Framerate::from_exposure_micros(exposure);
        debug!(
            exposure,
            %rate,
            "Maximum framerate for the current exposure"
        );
        driver.set_framerate(rate)?;
        drop(driver);
        self.cache
            .lock()
            .unwrap()
            .insert(SettingKey::Framerate, SettingValue::Rate(rate));
        Ok(rate)
    }

    /// Apply a preset bundle in one call
    ///
    /// Settings are applied in a fixed order; the first validation or
    /// device error aborts the sequence in place, leaving the settings
    /// applied so far as they are (no rollback).
    pub fn apply_preset(&self, preset: &Preset) -> Result<()> {
        self.set(SettingKey::AwbGains, SettingValue::Float(preset.awb_gains))?;
        self.set(
            SettingKey::AwbMode,
            SettingValue::Text(preset.awb_mode.clone()),
        )?;
        self.set(SettingKey::Iso, SettingValue::Int(preset.iso))?;
        self.set(
            SettingKey::Brightness,
            SettingValue::Int(preset.brightness),
        )?;
        self.set(SettingKey::Contrast, SettingValue::Int(preset.contrast))?;
        self.set(
            SettingKey::ExposureMode,
            SettingValue::Text(preset.exposure.clone()),
        )?;
        self.set_shutter_speed(&preset.shutter_speed)?;
        self.set(SettingKey::Led, SettingValue::Bool(preset.led))?;
        Ok(())
    }

    /// Blocking single-shot capture to the given path
    ///
    /// Waits the per-session delay first. Refused while a preview
    /// stream is open — device access from preview and capture must
    /// never overlap.
    pub fn capture(&self, path: &Path) -> Result<Frame> {
        match *self.state.lock().unwrap() {
            SessionState::Closed => return Err(CameraError::SessionClosed),
            SessionState::Open { streaming: true } => return Err(CameraError::StreamActive),
            SessionState::Open { streaming: false } => {}
        }

        let delay = self.capture_delay();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        let start = Instant::now();
        let frame = self.driver.lock().unwrap().capture_still()?;
        frame
            .save(path)
            .map_err(|e| CameraError::CaptureFailed(e.to_string()))?;
        info!(path = %path.display(), "Image saved");
        debug!(seconds = start.elapsed().as_secs_f64(), "Capture took");
        Ok(frame)
    }

    /// Start the continuous preview stream
    ///
    /// The returned source is lazy, infinite and non-restartable; each
    /// `next()` blocks until the device delivers a frame. Only one
    /// stream may exist at a time.
    pub fn preview(&self) -> Result<PreviewFrames> {
        {
            let mut state = self.state.lock().unwrap();
            match *state {
                SessionState::Closed => return Err(CameraError::SessionClosed),
                SessionState::Open { streaming: true } => return Err(CameraError::StreamActive),
                SessionState::Open { streaming: false } => {
                    *state = SessionState::Open { streaming: true };
                }
            }
        }

        // bind before matching so the driver lock is released first
        let opened = self.driver.lock().unwrap().open_stream();
        match opened {
            Ok(stream) => {
                debug!("Preview stream opened");
                Ok(PreviewFrames {
                    stream: Some(stream),
                    state: Arc::clone(&self.state),
                })
            }
            Err(e) => {
                self.end_stream();
                Err(e)
            }
        }
    }

    /// Human-readable device description
    pub fn describe(&self) -> String {
        self.driver.lock().unwrap().describe()
    }

    fn end_stream(&self) {
        let mut state = self.state.lock().unwrap();
        if let SessionState::Open { streaming } = &mut *state {
            *streaming = false;
        }
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Continuous frame source tied to one session
///
/// The device frame buffer behind `next()` is reused between
/// iterations; frames hand out their own reference-counted pixel data,
/// so holding one past the next iteration is safe.
pub struct PreviewFrames {
    stream: Option<Box<dyn FrameStream>>,
    state: Arc<Mutex<SessionState>>,
}

impl PreviewFrames {
    /// Block until the device delivers the next frame
    pub fn next(&mut self) -> Result<Frame> {
        match self.stream.as_mut() {
            Some(stream) => stream.next_frame(),
            None => Err(CameraError::PreviewTerminated(
                "preview stream stopped".into(),
            )),
        }
    }

    /// Tear the stream down; no frames flow afterwards
    pub fn stop(&mut self) {
        if self.stream.take().is_some() {
            let mut state = self.state.lock().unwrap();
            if let SessionState::Open { streaming } = &mut *state {
                *streaming = false;
            }
            debug!("Preview stream stopped");
        }
    }
}

impl Drop for PreviewFrames {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Parse a shutter speed spec into microseconds
///
/// `"1/N"` becomes `round(1_000_000 / N)`; a decimal string is taken as
/// seconds and becomes `round(seconds * 1_000_000)`.
fn parse_shutter_spec(spec: &str) -> Result<u64> {
    let spec = spec.trim();
    if let Some((numer, denom)) = spec.split_once('/') {
        let numer: f64 = numer
            .trim()
            .parse()
            .map_err(|_| CameraError::InvalidShutterSpeed(spec.to_string()))?;
        let denom: f64 = denom
            .trim()
            .parse()
            .map_err(|_| CameraError::InvalidShutterSpeed(spec.to_string()))?;
        if denom <= 0.0 || numer <= 0.0 {
            return Err(CameraError::InvalidShutterSpeed(spec.to_string()));
        }
        Ok((numer * 1_000_000.0 / denom).round() as u64)
    } else {
        let seconds: f64 = spec
            .parse()
            .map_err(|_| CameraError::InvalidShutterSpeed(spec.to_string()))?;
        if seconds < 0.0 {
            return Err(CameraError::InvalidShutterSpeed(spec.to_string()));
        }
        Ok((seconds * 1_000_000.0).round() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::virtual_camera::VirtualCamera;

    fn virtual_session(framerate: Option<Framerate>) -> Arc<CameraSession> {
        let session = CameraSession::new(
            Box::new(VirtualCamera::new()),
            Some(Resolution {
                width: 64,
                height: 48,
            }),
            framerate,
        );
        session.open().unwrap();
        Arc::new(session)
    }

    #[test]
    fn test_parse_shutter_spec() {
        assert_eq!(parse_shutter_spec("1/1000").unwrap(), 1000);
        assert_eq!(parse_shutter_spec("1/8").unwrap(), 125_000);
        assert_eq!(parse_shutter_spec("0.5").unwrap(), 500_000);
        assert_eq!(parse_shutter_spec("2").unwrap(), 2_000_000);
        assert_eq!(parse_shutter_spec("1/3").unwrap(), 333_333);
        assert!(parse_shutter_spec("fast").is_err());
        assert!(parse_shutter_spec("1/0").is_err());
        assert!(parse_shutter_spec("-1").is_err());
    }

    #[test]
    fn test_open_is_idempotent() {
        let session = virtual_session(None);
        assert!(session.is_open());
        session.open().unwrap();
        assert!(session.is_open());
    }

    #[test]
    fn test_close_when_closed_is_noop() {
        let session = virtual_session(None);
        session.close();
        assert!(!session.is_open());
        session.close();
        assert!(!session.is_open());
    }

    #[test]
    fn test_operations_fail_when_closed() {
        let session = virtual_session(None);
        session.close();
        assert!(matches!(
            session.get(SettingKey::Iso),
            Err(CameraError::SessionClosed)
        ));
        assert!(matches!(
            session.set(SettingKey::Iso, SettingValue::Int(100)),
            Err(CameraError::SessionClosed)
        ));
    }

    #[test]
    fn test_set_then_get_is_served_from_cache() {
        let driver = VirtualCamera::new();
        let probe = driver.read_probe();
        let session = CameraSession::new(Box::new(driver), None, None);
        session.open().unwrap();

        session
            .set(SettingKey::Iso, SettingValue::Int(400))
            .unwrap();
        let reads_before = probe.load(std::sync::atomic::Ordering::SeqCst);
        assert_eq!(session.get(SettingKey::Iso).unwrap(), SettingValue::Int(400));
        assert_eq!(
            probe.load(std::sync::atomic::Ordering::SeqCst),
            reads_before,
            "cached get must not hit the device"
        );
    }

    #[test]
    fn test_get_miss_reads_device_once() {
        let driver = VirtualCamera::new();
        let probe = driver.read_probe();
        let session = CameraSession::new(Box::new(driver), None, None);
        session.open().unwrap();

        assert_eq!(
            session.get(SettingKey::Brightness).unwrap(),
            SettingKey::Brightness.default_value()
        );
        assert_eq!(probe.load(std::sync::atomic::Ordering::SeqCst), 1);
        // second read comes from the cache
        session.get(SettingKey::Brightness).unwrap();
        assert_eq!(probe.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn test_rejected_set_never_reaches_cache() {
        let session = virtual_session(None);
        let err = session
            .set(SettingKey::Brightness, SettingValue::Int(500))
            .unwrap_err();
        assert!(matches!(err, CameraError::SettingOutOfRange { .. }));
        // a fresh get falls through to the device default, not 500
        assert_eq!(
            session.get(SettingKey::Brightness).unwrap(),
            SettingKey::Brightness.default_value()
        );
    }

    #[test]
    fn test_short_shutter_keeps_framerate() {
        let session = virtual_session(None);
        let micros = session.set_shutter_speed("1/1000").unwrap();
        assert_eq!(micros, 1000);
        assert_eq!(
            session.get(SettingKey::Framerate).unwrap(),
            SettingValue::Rate(Framerate::from_int(30))
        );
        assert_eq!(
            session.get(SettingKey::ShutterSpeed).unwrap(),
            SettingValue::Int(1000)
        );
    }

    #[test]
    fn test_long_shutter_lowers_unpinned_framerate() {
        let session = virtual_session(None);
        let micros = session.set_shutter_speed("1/8").unwrap();
        assert_eq!(micros, 125_000);
        assert_eq!(
            session.get(SettingKey::Framerate).unwrap(),
            SettingValue::Rate(Framerate::from_int(8))
        );
    }

    #[test]
    fn test_long_shutter_keeps_pinned_framerate() {
        let session = virtual_session(Some(Framerate::from_int(30)));
        let micros = session.set_shutter_speed("1/8").unwrap();
        assert_eq!(micros, 125_000);
        // pinned: only a warning, the rate stays put
        assert_eq!(
            session.get(SettingKey::Framerate).unwrap(),
            SettingValue::Rate(Framerate::from_int(30))
        );
        assert_eq!(
            session.get(SettingKey::ShutterSpeed).unwrap(),
            SettingValue::Int(125_000)
        );
    }

    #[test]
    fn test_maximize_framerate_from_exposure() {
        let session = virtual_session(None);
        session.set_shutter_speed("1/8").unwrap();
        let rate = session.maximize_framerate().unwrap();
        assert_eq!(rate, Framerate::from_int(8));
        assert_eq!(
            session.get(SettingKey::Framerate).unwrap(),
            SettingValue::Rate(rate)
        );
    }

    #[test]
    fn test_apply_preset_aborts_in_place() {
        let session = virtual_session(None);
        let preset = Preset {
            awb_gains: 1.5,
            awb_mode: "cloudy".into(),
            iso: 999, // not a valid choice
            brightness: 80,
            contrast: 0,
            exposure: "auto".into(),
            shutter_speed: "1/250".into(),
            led: true,
        };
        let err = session.apply_preset(&preset).unwrap_err();
        assert!(matches!(err, CameraError::InvalidChoice { .. }));
        // settings before the failing key stayed applied
        assert_eq!(
            session.get(SettingKey::AwbMode).unwrap(),
            SettingValue::Text("cloudy".into())
        );
        // settings after it were never reached
        assert_eq!(
            session.get(SettingKey::Brightness).unwrap(),
            SettingKey::Brightness.default_value()
        );
    }

    #[test]
    fn test_apply_preset_full_sequence() {
        let session = virtual_session(None);
        let preset = Preset {
            awb_gains: 1.5,
            awb_mode: "off".into(),
            iso: 200,
            brightness: 60,
            contrast: -10,
            exposure: "night".into(),
            shutter_speed: "1/250".into(),
            led: false,
        };
        session.apply_preset(&preset).unwrap();
        assert_eq!(session.get(SettingKey::Iso).unwrap(), SettingValue::Int(200));
        assert_eq!(
            session.get(SettingKey::ShutterSpeed).unwrap(),
            SettingValue::Int(4000)
        );
        assert_eq!(
            session.get(SettingKey::Led).unwrap(),
            SettingValue::Bool(false)
        );
    }

    #[test]
    fn test_capture_writes_file() {
        let session = virtual_session(None);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("IMG0000.png");
        let frame = session.capture(&path).unwrap();
        assert!(path.exists());
        assert_eq!(frame.width, 64);
        let reloaded = Frame::from_file(&path).unwrap();
        assert_eq!(reloaded.width, frame.width);
        assert_eq!(reloaded.height, frame.height);
    }

    #[test]
    fn test_capture_refused_while_streaming() {
        let session = virtual_session(None);
        let mut frames = session.preview().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let err = session.capture(&dir.path().join("x.png")).unwrap_err();
        assert!(matches!(err, CameraError::StreamActive));
        frames.stop();
        assert!(session.capture(&dir.path().join("x.png")).is_ok());
    }

    #[test]
    fn test_single_stream_at_a_time() {
        let session = virtual_session(None);
        let mut first = session.preview().unwrap();
        assert!(matches!(
            session.preview(),
            Err(CameraError::StreamActive)
        ));
        first.stop();
        assert!(session.preview().is_ok());
    }

    #[test]
    fn test_preview_not_restartable_after_stop() {
        let session = virtual_session(None);
        let mut frames = session.preview().unwrap();
        frames.next().unwrap();
        frames.stop();
        assert!(matches!(
            frames.next(),
            Err(CameraError::PreviewTerminated(_))
        ));
    }
}
