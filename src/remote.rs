// SPDX-License-Identifier: GPL-3.0-only

//! Remote operation facade
//!
//! The typed surface an RPC transport binds when the camera is driven
//! from another machine. The transport and its marshalling are not part
//! of this crate; images cross this boundary as [`FramePayload`] (raw
//! pixel bytes plus shape/dtype metadata), and preview is pull-based:
//! the client calls `start_preview` once, then `next_frame` repeatedly.

use crate::backends::camera::types::FramePayload;
use crate::errors::{CameraError, Result};
use crate::presets::Preset;
use crate::session::{CameraSession, PreviewFrames};
use crate::settings::{SettingKey, SettingValue};
use crate::storage::Storage;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Camera + storage operations as exposed to a remote client
pub struct CameraService {
    session: Arc<CameraSession>,
    storage: Mutex<Storage>,
    cursor: Mutex<Option<PreviewFrames>>,
}

impl CameraService {
    pub fn new(session: Arc<CameraSession>, storage: Storage) -> Self {
        Self {
            session,
            storage: Mutex::new(storage),
            cursor: Mutex::new(None),
        }
    }

    pub fn open(&self) -> Result<()> {
        self.session.open()
    }

    pub fn close(&self) {
        self.stop_preview();
        self.session.close();
    }

    /// Initialise the storage directory and sequence counter
    pub fn start_storage(&self) -> Result<()> {
        self.storage.lock().unwrap().start()
    }

    pub fn get(&self, key: SettingKey) -> Result<SettingValue> {
        self.session.get(key)
    }

    pub fn set(&self, key: SettingKey, value: SettingValue) -> Result<()> {
        self.session.set(key, value)
    }

    pub fn set_shutter_speed(&self, spec: &str) -> Result<u64> {
        self.session.set_shutter_speed(spec)
    }

    pub fn maximize_framerate(&self) -> Result<f64> {
        self.session.maximize_framerate().map(|rate| rate.as_f64())
    }

    pub fn apply_preset(&self, preset: &Preset) -> Result<()> {
        self.session.apply_preset(preset)
    }

    /// Capture one image; returns the stored path and the pixel payload
    pub fn take_picture(&self, extension: &str) -> Result<(PathBuf, FramePayload)> {
        let path = self.storage.lock().unwrap().get_new_name(extension)?;
        let frame = self.session.capture(&path)?;
        Ok((path, frame.to_payload()))
    }

    /// Open the pull-based preview cursor; one at a time
    pub fn start_preview(&self) -> Result<()> {
        let mut cursor = self.cursor.lock().unwrap();
        if cursor.is_some() {
            return Err(CameraError::StreamActive);
        }
        *cursor = Some(self.session.preview()?);
        debug!("Remote preview cursor opened");
        Ok(())
    }

    /// Pull the next preview frame as a raw payload
    pub fn next_frame(&self) -> Result<FramePayload> {
        let mut cursor = self.cursor.lock().unwrap();
        let frames = cursor.as_mut().ok_or_else(|| {
            CameraError::PreviewTerminated("preview not started".into())
        })?;
        match frames.next() {
            Ok(frame) => Ok(frame.to_payload()),
            Err(e) => {
                // cursor is dead after a device error; drop it so the
                // client can start a fresh one
                *cursor = None;
                Err(e)
            }
        }
    }

    /// Tear down the preview cursor; safe when none is open
    pub fn stop_preview(&self) {
        if let Some(mut frames) = self.cursor.lock().unwrap().take() {
            frames.stop();
            debug!("Remote preview cursor closed");
        }
    }
}
