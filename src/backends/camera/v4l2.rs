// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 camera driver
//!
//! Drives the Pi camera's V4L2 node. Streaming goes through the `v4l`
//! crate's memory-mapped buffers; control writes go straight through
//! `VIDIOC_S_CTRL`/`VIDIOC_G_CTRL` ioctls with an explicit setting → CID
//! table, so every supported control is visible in one place.

use super::types::{FRAME_CHANNELS, Frame, Framerate, Resolution};
use super::{CameraDriver, FrameStream};
use crate::errors::{CameraError, Result};
use crate::settings::{
    AWB_MODES, EXPOSURE_MODES, ISO_CHOICES, METER_MODES, SettingKey, SettingValue,
};
use std::fs::File;
use std::os::unix::io::AsRawFd;
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};
use v4l::Device;
use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;

// ===== V4L2 Control Class Bases =====
const V4L2_CTRL_CLASS_USER: u32 = 0x0098_0000;
const V4L2_CTRL_CLASS_CAMERA: u32 = 0x009a_0000;
const V4L2_CTRL_CLASS_FLASH: u32 = 0x009c_0000;

const V4L2_CID_BASE: u32 = V4L2_CTRL_CLASS_USER | 0x900;
const V4L2_CID_CAMERA_CLASS_BASE: u32 = V4L2_CTRL_CLASS_CAMERA | 0x900;
const V4L2_CID_FLASH_CLASS_BASE: u32 = V4L2_CTRL_CLASS_FLASH | 0x900;

// ===== V4L2 Control IDs (User Class) =====

/// Brightness control
pub const V4L2_CID_BRIGHTNESS: u32 = V4L2_CID_BASE;
/// Contrast control
pub const V4L2_CID_CONTRAST: u32 = V4L2_CID_BASE + 1;
/// Saturation control
pub const V4L2_CID_SATURATION: u32 = V4L2_CID_BASE + 2;
/// Red channel balance (manual white balance gain)
pub const V4L2_CID_RED_BALANCE: u32 = V4L2_CID_BASE + 14;
/// Blue channel balance (manual white balance gain)
pub const V4L2_CID_BLUE_BALANCE: u32 = V4L2_CID_BASE + 15;
/// Sharpness control
pub const V4L2_CID_SHARPNESS: u32 = V4L2_CID_BASE + 27;

// ===== V4L2 Control IDs (Camera Class) =====

/// Exposure mode: Auto, Manual, Shutter Priority, Aperture Priority
pub const V4L2_CID_EXPOSURE_AUTO: u32 = V4L2_CID_CAMERA_CLASS_BASE + 1;
/// Absolute exposure time in 100 µs units
pub const V4L2_CID_EXPOSURE_ABSOLUTE: u32 = V4L2_CID_CAMERA_CLASS_BASE + 2;
/// White balance preset menu (the Pi firmware AWB modes)
pub const V4L2_CID_AUTO_N_PRESET_WHITE_BALANCE: u32 = V4L2_CID_CAMERA_CLASS_BASE + 20;
/// ISO sensitivity menu
pub const V4L2_CID_ISO_SENSITIVITY: u32 = V4L2_CID_CAMERA_CLASS_BASE + 23;
/// Exposure metering mode
pub const V4L2_CID_EXPOSURE_METERING: u32 = V4L2_CID_CAMERA_CLASS_BASE + 25;
/// Scene mode menu (the Pi firmware exposure modes)
pub const V4L2_CID_SCENE_MODE: u32 = V4L2_CID_CAMERA_CLASS_BASE + 26;

// ===== V4L2 Control IDs (Flash Class) =====

/// LED/flash mode (drives the camera module indicator LED)
pub const V4L2_CID_FLASH_LED_MODE: u32 = V4L2_CID_FLASH_CLASS_BASE + 1;

// ===== V4L2 Exposure Auto Menu Values =====

/// Automatic exposure time
pub const V4L2_EXPOSURE_AUTO: i32 = 0;
/// Manual exposure time
pub const V4L2_EXPOSURE_MANUAL: i32 = 1;

// ===== V4L2 Flash LED Menu Values =====

const V4L2_FLASH_LED_MODE_NONE: i32 = 0;
const V4L2_FLASH_LED_MODE_TORCH: i32 = 2;

// ===== V4L2 ioctl Numbers =====
// Calculated as: (dir << 30) | (size << 16) | ('V' << 8) | nr

/// Get control value (v4l2_control: 8 bytes)
const VIDIOC_G_CTRL: libc::c_ulong = 0xC008_561B;
/// Set control value (v4l2_control: 8 bytes)
const VIDIOC_S_CTRL: libc::c_ulong = 0xC008_561C;

/// V4L2 control get/set structure
#[repr(C)]
struct V4l2Control {
    id: u32,
    value: i32,
}

/// Get the current value of a control on the given device node
fn get_control(device_path: &str, control_id: u32) -> Result<i32> {
    let file = File::open(device_path)
        .map_err(|e| CameraError::DeviceUnavailable(format!("{}: {}", device_path, e)))?;
    let fd = file.as_raw_fd();

    let mut ctrl = V4l2Control {
        id: control_id,
        value: 0,
    };

    let result = unsafe { libc::ioctl(fd, VIDIOC_G_CTRL, &mut ctrl as *mut V4l2Control) };
    if result < 0 {
        let errno = std::io::Error::last_os_error();
        debug!(device_path, control_id, %errno, "Failed to get V4L2 control");
        return Err(CameraError::DeviceUnavailable(format!(
            "get control {:#x}: {}",
            control_id, errno
        )));
    }

    Ok(ctrl.value)
}

/// Set a control value on the given device node
fn set_control(device_path: &str, control_id: u32, value: i32) -> Result<()> {
    let file = File::open(device_path)
        .map_err(|e| CameraError::DeviceUnavailable(format!("{}: {}", device_path, e)))?;
    let fd = file.as_raw_fd();

    let mut ctrl = V4l2Control {
        id: control_id,
        value,
    };

    let result = unsafe { libc::ioctl(fd, VIDIOC_S_CTRL, &mut ctrl as *mut V4l2Control) };
    if result < 0 {
        let errno = std::io::Error::last_os_error();
        warn!(device_path, control_id, value, %errno, "Failed to set V4L2 control");
        return Err(CameraError::DeviceUnavailable(format!(
            "set control {:#x}: {}",
            control_id, errno
        )));
    }

    if ctrl.value != value {
        debug!(
            device_path,
            control_id,
            requested = value,
            actual = ctrl.value,
            "V4L2 control value was clamped by the driver"
        );
    }

    Ok(())
}

/// Index of a text choice within its registry list, as a menu value
fn menu_index(choices: &[&str], value: &str) -> Option<i32> {
    choices.iter().position(|c| *c == value).map(|i| i as i32)
}

/// Hardware-backed camera driver for a V4L2 capture node
pub struct V4l2Camera {
    path: String,
    device: Option<Device>,
    resolution: Resolution,
    framerate: Framerate,
    pixel: PixelLayout,
}

/// Negotiated on-wire pixel layout of the capture node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PixelLayout {
    Rgb3 { stride: u32 },
    Yuyv { stride: u32 },
}

impl V4l2Camera {
    pub fn new(device_path: &str) -> Self {
        Self {
            path: device_path.to_string(),
            device: None,
            resolution: Resolution {
                width: 640,
                height: 480,
            },
            framerate: Framerate::default(),
            pixel: PixelLayout::Yuyv { stride: 1280 },
        }
    }

    fn device(&self) -> Result<&Device> {
        self.device
            .as_ref()
            .ok_or_else(|| CameraError::DeviceUnavailable("device not open".into()))
    }

    fn negotiate_format(device: &Device, resolution: Resolution) -> Result<PixelLayout> {
        // Prefer RGB3 (no conversion); the Pi firmware node offers it,
        // webcams usually only do YUYV/MJPG
        let rgb = v4l::Format::new(resolution.width, resolution.height, v4l::FourCC::new(b"RGB3"));
        if let Ok(actual) = device.set_format(&rgb)
            && actual.fourcc == v4l::FourCC::new(b"RGB3")
        {
            return Ok(PixelLayout::Rgb3 {
                stride: actual.stride,
            });
        }

        let yuyv = v4l::Format::new(resolution.width, resolution.height, v4l::FourCC::new(b"YUYV"));
        let actual = device
            .set_format(&yuyv)
            .map_err(|e| CameraError::DeviceUnavailable(format!("set format: {}", e)))?;
        if actual.fourcc != v4l::FourCC::new(b"YUYV") {
            return Err(CameraError::DeviceUnavailable(format!(
                "no supported pixel format (driver offered {})",
                actual.fourcc
            )));
        }
        Ok(PixelLayout::Yuyv {
            stride: actual.stride,
        })
    }

    fn apply_framerate(&self, rate: Framerate) -> Result<()> {
        let device = self.device()?;
        // the frame interval is the reciprocal of the rate
        let params =
            v4l::video::capture::parameters::Parameters::new(v4l::Fraction::new(rate.denom, rate.num));
        device
            .set_params(&params)
            .map_err(|e| CameraError::DeviceUnavailable(format!("set framerate: {}", e)))?;
        Ok(())
    }
}

impl CameraDriver for V4l2Camera {
    fn open(&mut self, resolution: Resolution, framerate: Framerate) -> Result<()> {
        let device = Device::with_path(&self.path)
            .map_err(|e| CameraError::DeviceUnavailable(format!("{}: {}", self.path, e)))?;

        let pixel = Self::negotiate_format(&device, resolution)?;
        info!(path = %self.path, %resolution, %framerate, ?pixel, "V4L2 device opened");

        self.device = Some(device);
        self.resolution = resolution;
        self.framerate = framerate;
        self.pixel = pixel;
        self.apply_framerate(framerate)?;
        Ok(())
    }

    fn close(&mut self) {
        if self.device.take().is_some() {
            info!(path = %self.path, "V4L2 device closed");
        }
    }

    fn apply(&mut self, key: SettingKey, value: &SettingValue) -> Result<()> {
        self.device()?;
        match (key, value) {
            (SettingKey::Brightness, SettingValue::Int(v)) => {
                set_control(&self.path, V4L2_CID_BRIGHTNESS, *v as i32)
            }
            (SettingKey::Contrast, SettingValue::Int(v)) => {
                set_control(&self.path, V4L2_CID_CONTRAST, *v as i32)
            }
            (SettingKey::Saturation, SettingValue::Int(v)) => {
                set_control(&self.path, V4L2_CID_SATURATION, *v as i32)
            }
            (SettingKey::Sharpness, SettingValue::Int(v)) => {
                set_control(&self.path, V4L2_CID_SHARPNESS, *v as i32)
            }
            (SettingKey::Iso, SettingValue::Int(v)) => {
                // menu control: the index into the sensitivity list
                let index = ISO_CHOICES
                    .iter()
                    .position(|c| c == v)
                    .unwrap_or_default() as i32;
                set_control(&self.path, V4L2_CID_ISO_SENSITIVITY, index)
            }
            (SettingKey::AwbGains, SettingValue::Float(gain)) => {
                // red/blue balance use 1000 == gain 1.0 on the Pi node
                let scaled = (gain * 1000.0).round() as i32;
                set_control(&self.path, V4L2_CID_RED_BALANCE, scaled)?;
                set_control(&self.path, V4L2_CID_BLUE_BALANCE, scaled)
            }
            (SettingKey::AwbMode, SettingValue::Text(mode)) => {
                let index = menu_index(AWB_MODES, mode).unwrap_or_default();
                set_control(&self.path, V4L2_CID_AUTO_N_PRESET_WHITE_BALANCE, index)
            }
            (SettingKey::ExposureMode, SettingValue::Text(mode)) => {
                let index = menu_index(EXPOSURE_MODES, mode).unwrap_or_default();
                set_control(&self.path, V4L2_CID_SCENE_MODE, index)
            }
            (SettingKey::MeterMode, SettingValue::Text(mode)) => {
                let index = menu_index(METER_MODES, mode).unwrap_or_default();
                set_control(&self.path, V4L2_CID_EXPOSURE_METERING, index)
            }
            (SettingKey::DrcStrength, SettingValue::Text(strength)) => {
                // no portable CID for dynamic range compression
                debug!(%strength, "DRC strength not supported by the V4L2 driver");
                Ok(())
            }
            (SettingKey::ShutterSpeed, SettingValue::Int(micros)) => {
                if *micros == 0 {
                    set_control(&self.path, V4L2_CID_EXPOSURE_AUTO, V4L2_EXPOSURE_AUTO)
                } else {
                    set_control(&self.path, V4L2_CID_EXPOSURE_AUTO, V4L2_EXPOSURE_MANUAL)?;
                    // EXPOSURE_ABSOLUTE is in 100 µs units
                    set_control(
                        &self.path,
                        V4L2_CID_EXPOSURE_ABSOLUTE,
                        (*micros / 100).max(1) as i32,
                    )
                }
            }
            (SettingKey::Led, SettingValue::Bool(on)) => {
                let mode = if *on {
                    V4L2_FLASH_LED_MODE_TORCH
                } else {
                    V4L2_FLASH_LED_MODE_NONE
                };
                set_control(&self.path, V4L2_CID_FLASH_LED_MODE, mode)
            }
            (SettingKey::Resolution, SettingValue::Size(size)) => {
                let pixel = Self::negotiate_format(self.device()?, *size)?;
                self.resolution = *size;
                self.pixel = pixel;
                Ok(())
            }
            (SettingKey::Framerate, SettingValue::Rate(rate)) => self.set_framerate(*rate),
            (key, _) => Err(CameraError::TypeMismatch {
                key,
                expected: "driver-supported value",
            }),
        }
    }

    fn read(&mut self, key: SettingKey) -> Result<SettingValue> {
        self.device()?;
        match key {
            SettingKey::Resolution => Ok(SettingValue::Size(self.resolution)),
            SettingKey::Framerate => Ok(SettingValue::Rate(self.framerate)),
            SettingKey::Brightness => {
                get_control(&self.path, V4L2_CID_BRIGHTNESS).map(|v| SettingValue::Int(v.into()))
            }
            SettingKey::Contrast => {
                get_control(&self.path, V4L2_CID_CONTRAST).map(|v| SettingValue::Int(v.into()))
            }
            SettingKey::Saturation => {
                get_control(&self.path, V4L2_CID_SATURATION).map(|v| SettingValue::Int(v.into()))
            }
            SettingKey::Sharpness => {
                get_control(&self.path, V4L2_CID_SHARPNESS).map(|v| SettingValue::Int(v.into()))
            }
            SettingKey::Iso => {
                let index = get_control(&self.path, V4L2_CID_ISO_SENSITIVITY)?;
                let iso = ISO_CHOICES.get(index.max(0) as usize).copied().unwrap_or(100);
                Ok(SettingValue::Int(iso))
            }
            SettingKey::AwbGains => get_control(&self.path, V4L2_CID_RED_BALANCE)
                .map(|v| SettingValue::Float(f64::from(v) / 1000.0)),
            SettingKey::AwbMode => {
                let index = get_control(&self.path, V4L2_CID_AUTO_N_PRESET_WHITE_BALANCE)?;
                let mode = AWB_MODES.get(index.max(0) as usize).copied().unwrap_or("auto");
                Ok(SettingValue::Text(mode.to_string()))
            }
            SettingKey::ExposureMode => {
                let index = get_control(&self.path, V4L2_CID_SCENE_MODE)?;
                let mode = EXPOSURE_MODES
                    .get(index.max(0) as usize)
                    .copied()
                    .unwrap_or("auto");
                Ok(SettingValue::Text(mode.to_string()))
            }
            SettingKey::MeterMode => {
                let index = get_control(&self.path, V4L2_CID_EXPOSURE_METERING)?;
                let mode = METER_MODES
                    .get(index.max(0) as usize)
                    .copied()
                    .unwrap_or("average");
                Ok(SettingValue::Text(mode.to_string()))
            }
            SettingKey::DrcStrength => Ok(key.default_value()),
            SettingKey::ShutterSpeed => {
                let auto = get_control(&self.path, V4L2_CID_EXPOSURE_AUTO)?;
                if auto == V4L2_EXPOSURE_AUTO {
                    Ok(SettingValue::Int(0))
                } else {
                    get_control(&self.path, V4L2_CID_EXPOSURE_ABSOLUTE)
                        .map(|v| SettingValue::Int(i64::from(v) * 100))
                }
            }
            SettingKey::Led => get_control(&self.path, V4L2_CID_FLASH_LED_MODE)
                .map(|v| SettingValue::Bool(v != V4L2_FLASH_LED_MODE_NONE)),
        }
    }

    fn set_framerate(&mut self, rate: Framerate) -> Result<()> {
        self.apply_framerate(rate)?;
        self.framerate = rate;
        Ok(())
    }

    fn exposure_micros(&mut self) -> Result<u64> {
        self.device()?;
        let value = get_control(&self.path, V4L2_CID_EXPOSURE_ABSOLUTE)?;
        Ok(u64::try_from(value).unwrap_or(0) * 100)
    }

    fn capture_still(&mut self) -> Result<Frame> {
        let device = self.device()?;
        let mut stream = Stream::with_buffers(device, Type::VideoCapture, 2)
            .map_err(|e| CameraError::CaptureFailed(format!("create stream: {}", e)))?;
        let (buf, meta) = stream
            .next()
            .map_err(|e| CameraError::CaptureFailed(e.to_string()))?;
        decode_frame(buf, self.resolution, self.pixel, u64::from(meta.sequence))
    }

    fn open_stream(&mut self) -> Result<Box<dyn FrameStream>> {
        self.device()?;
        V4l2FrameStream::spawn(self.path.clone(), self.resolution, self.pixel)
    }

    fn describe(&self) -> String {
        format!("v4l2 device {} ({})", self.path, self.resolution)
    }
}

/// Continuous stream backed by a dedicated capture thread
///
/// A v4l mmap stream borrows its device, so the thread owns both and
/// hands decoded frames over a capacity-1 channel; `next_frame` blocks
/// at hardware pace, and dropping the stream tears the thread down at
/// the next frame boundary.
struct V4l2FrameStream {
    frames: Receiver<Result<Frame>>,
    handle: Option<JoinHandle<()>>,
}

impl V4l2FrameStream {
    fn spawn(path: String, resolution: Resolution, pixel: PixelLayout) -> Result<Box<dyn FrameStream>> {
        let (tx, rx) = sync_channel::<Result<Frame>>(1);
        let handle = thread::Builder::new()
            .name("v4l2-capture".into())
            .spawn(move || capture_loop(&path, resolution, pixel, &tx))
            .map_err(|e| CameraError::DeviceUnavailable(format!("spawn capture thread: {}", e)))?;

        Ok(Box::new(Self {
            frames: rx,
            handle: Some(handle),
        }))
    }
}

impl FrameStream for V4l2FrameStream {
    fn next_frame(&mut self) -> Result<Frame> {
        match self.frames.recv() {
            Ok(frame) => frame,
            Err(_) => Err(CameraError::DeviceUnavailable("capture thread exited".into())),
        }
    }
}

impl Drop for V4l2FrameStream {
    fn drop(&mut self) {
        // drop the receiver first so the thread's next send fails and it exits
        let (_, dummy) = sync_channel(1);
        drop(std::mem::replace(&mut self.frames, dummy));
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            warn!("V4L2 capture thread panicked");
        }
    }
}

fn capture_loop(
    path: &str,
    resolution: Resolution,
    pixel: PixelLayout,
    tx: &SyncSender<Result<Frame>>,
) {
    debug!(path, "V4L2 capture thread started");

    let device = match Device::with_path(path) {
        Ok(d) => d,
        Err(e) => {
            let _ = tx.send(Err(CameraError::DeviceUnavailable(format!(
                "{}: {}",
                path, e
            ))));
            return;
        }
    };

    let mut stream = match Stream::with_buffers(&device, Type::VideoCapture, 4) {
        Ok(s) => s,
        Err(e) => {
            let _ = tx.send(Err(CameraError::DeviceUnavailable(format!(
                "create stream: {}",
                e
            ))));
            return;
        }
    };

    loop {
        let item = match stream.next() {
            Ok((buf, meta)) => decode_frame(buf, resolution, pixel, u64::from(meta.sequence)),
            Err(e) => Err(CameraError::DeviceUnavailable(e.to_string())),
        };
        let failed = item.is_err();
        if tx.send(item).is_err() {
            // consumer went away; normal stop path
            break;
        }
        if failed {
            break;
        }
    }

    debug!(path, "V4L2 capture thread exiting");
}

/// Decode one raw buffer into the canonical RGB frame
fn decode_frame(
    buf: &[u8],
    resolution: Resolution,
    pixel: PixelLayout,
    sequence: u64,
) -> Result<Frame> {
    let width = resolution.width;
    let height = resolution.height;
    let mut data = vec![0u8; (width * height * FRAME_CHANNELS) as usize];

    match pixel {
        PixelLayout::Rgb3 { stride } => {
            let row_bytes = (width * 3) as usize;
            for y in 0..height as usize {
                let src = y * stride as usize;
                let dst = y * row_bytes;
                let Some(src_row) = buf.get(src..src + row_bytes) else {
                    return Err(CameraError::CaptureFailed("short RGB buffer".into()));
                };
                data[dst..dst + row_bytes].copy_from_slice(src_row);
            }
        }
        PixelLayout::Yuyv { stride } => {
            for y in 0..height {
                for x in 0..width {
                    // YUYV packs two pixels into four bytes sharing U/V
                    let pair = (x & !1) as usize;
                    let offset = y as usize * stride as usize + pair * 2;
                    let Some(quad) = buf.get(offset..offset + 4) else {
                        return Err(CameraError::CaptureFailed("short YUYV buffer".into()));
                    };
                    let luma = if x % 2 == 0 { quad[0] } else { quad[2] };
                    let (r, g, b) = yuv_to_rgb(luma, quad[1], quad[3]);
                    let idx = ((y * width + x) * FRAME_CHANNELS) as usize;
                    data[idx] = r;
                    data[idx + 1] = g;
                    data[idx + 2] = b;
                }
            }
        }
    }

    Ok(Frame::from_rgb(width, height, data, sequence))
}

/// Convert YUV to RGB using the ITU-R BT.601 formula
fn yuv_to_rgb(y: u8, u: u8, v: u8) -> (u8, u8, u8) {
    let y_f = f32::from(y);
    let u_f = f32::from(u) - 128.0;
    let v_f = f32::from(v) - 128.0;

    let r = y_f + 1.402 * v_f;
    let g = y_f - 0.344_14 * u_f - 0.714_14 * v_f;
    let b = y_f + 1.772 * u_f;

    let clamp = |val: f32| val.clamp(0.0, 255.0) as u8;
    (clamp(r), clamp(g), clamp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_id_values() {
        assert_eq!(V4L2_CID_BRIGHTNESS, 0x0098_0900);
        assert_eq!(V4L2_CID_EXPOSURE_AUTO, 0x009a_0901);
        assert_eq!(V4L2_CID_EXPOSURE_ABSOLUTE, 0x009a_0902);
        assert_eq!(V4L2_CID_ISO_SENSITIVITY, 0x009a_0917);
        assert_eq!(V4L2_CID_SCENE_MODE, 0x009a_091a);
        assert_eq!(V4L2_CID_FLASH_LED_MODE, 0x009c_0901);
    }

    #[test]
    fn test_menu_index_lookup() {
        assert_eq!(menu_index(AWB_MODES, "off"), Some(0));
        assert_eq!(menu_index(AWB_MODES, "cloudy"), Some(3));
        assert_eq!(menu_index(AWB_MODES, "plaid"), None);
    }

    #[test]
    fn test_yuv_grey_point() {
        // neutral chroma maps luma straight through
        assert_eq!(yuv_to_rgb(128, 128, 128), (128, 128, 128));
        assert_eq!(yuv_to_rgb(0, 128, 128), (0, 0, 0));
        assert_eq!(yuv_to_rgb(255, 128, 128), (255, 255, 255));
    }

    #[test]
    fn test_decode_rgb3_respects_stride() {
        let resolution = Resolution {
            width: 2,
            height: 2,
        };
        // rows padded to 8 bytes
        let buf = [
            1, 2, 3, 4, 5, 6, 0, 0, //
            7, 8, 9, 10, 11, 12, 0, 0,
        ];
        let frame =
            decode_frame(&buf, resolution, PixelLayout::Rgb3 { stride: 8 }, 0).unwrap();
        assert_eq!(&frame.data[..], &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
    }

    #[test]
    fn test_decode_rejects_short_buffer() {
        let resolution = Resolution {
            width: 4,
            height: 4,
        };
        let buf = [0u8; 8];
        assert!(decode_frame(&buf, resolution, PixelLayout::Yuyv { stride: 8 }, 0).is_err());
    }
}
