// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for camera operations
//!
//! This module provides command-line functionality for:
//! - Inspecting the setting registry
//! - Taking a photo through the shutter controller
//! - Running the preview pipeline and reporting its frame rate
//! - Listing presets

use picam::config::Config;
use picam::constants::timing;
use picam::presets;
use picam::preview::PreviewPipeline;
use picam::session::CameraSession;
use picam::settings::{SettingConstraint, SettingKey};
use picam::shutter::{ShutterController, ShutterEvent};
use picam::storage::Storage;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Print the setting registry: key, kind, bounds and default
pub fn list_settings() -> Result<(), Box<dyn std::error::Error>> {
    println!("Camera settings:");
    println!();
    for key in SettingKey::ALL {
        let rule = match key.constraint() {
            SettingConstraint::IntRange { min, max, .. } => format!("range [{}, {}]", min, max),
            SettingConstraint::FloatRange { min, max, .. } => {
                format!("range [{}, {}]", min, max)
            }
            SettingConstraint::IntChoice { choices, .. } => format!(
                "one of {}",
                choices
                    .iter()
                    .map(|c| c.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            SettingConstraint::TextChoice { choices, .. } => {
                format!("one of {}", choices.join(", "))
            }
            SettingConstraint::Toggle { .. } => "on/off".to_string(),
            SettingConstraint::Opaque => "unchecked".to_string(),
        };
        println!(
            "  {:<14} {:<40} default: {}",
            key.name(),
            rule,
            key.default_value()
        );
    }
    Ok(())
}

/// Take a single photo and print where it was stored
pub fn take_photo(
    config: &Config,
    output: Option<PathBuf>,
    delay: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = Arc::new(CameraSession::from_config(config));
    session.open()?;
    println!("Using {}", session.describe());

    let images_dir = output.unwrap_or_else(|| config.images_dir.clone());
    let mut storage = Storage::new(images_dir);
    storage.start()?;
    let storage = Arc::new(std::sync::Mutex::new(storage));

    let (shutter, mut events) = ShutterController::new(Arc::clone(&session), storage);
    shutter.set_capture_format(&config.capture_format)?;
    shutter.set_delay(delay);
    shutter.take_picture(None)?;

    loop {
        match events.blocking_recv() {
            Some(ShutterEvent::Captured(Ok(frame))) => {
                println!("Captured {}x{} image", frame.width, frame.height);
            }
            Some(ShutterEvent::Captured(Err(e))) => {
                eprintln!("Capture failed: {}", e);
            }
            Some(ShutterEvent::Finished(Ok(path))) => {
                println!("Saved to {}", path.display());
                break;
            }
            Some(ShutterEvent::Finished(Err(e))) => {
                return Err(e.into());
            }
            None => break,
        }
    }

    session.close();
    Ok(())
}

/// Run the preview pipeline, draining the frame slot at the UI cadence,
/// and report the delivered frame rate
pub fn run_preview(config: &Config, duration: u64) -> Result<(), Box<dyn std::error::Error>> {
    let session = Arc::new(CameraSession::from_config(config));
    session.open()?;
    println!("Previewing from {} (Ctrl-C to stop)", session.describe());

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))?;

    let mut pipeline = PreviewPipeline::start(Arc::clone(&session));
    let slot = pipeline.slot();

    let deadline = Instant::now() + Duration::from_secs(duration);
    let mut delivered: u64 = 0;
    let started = Instant::now();

    while Instant::now() < deadline && !interrupted.load(Ordering::SeqCst) {
        if let Some(frame) = slot.take() {
            delivered += 1;
            if delivered % 30 == 0 {
                println!(
                    "  frame #{} ({}x{})",
                    frame.sequence, frame.width, frame.height
                );
            }
        }
        if let Some(Err(e)) = pipeline.outcome() {
            eprintln!("Preview ended: {}", e);
            session.close();
            return Err(e.into());
        }
        std::thread::sleep(timing::PREVIEW_POLL_INTERVAL);
    }

    pipeline.stop();
    let elapsed = started.elapsed().as_secs_f64();
    println!(
        "Delivered {} frames in {:.1}s ({:.1} fps at the consumer)",
        delivered,
        elapsed,
        delivered as f64 / elapsed.max(0.001)
    );

    session.close();
    Ok(())
}

/// List the presets found in the presets directory
pub fn list_presets(
    config: &Config,
    dir: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = dir.unwrap_or_else(|| config.presets_dir.clone());
    let loaded = presets::load_presets(&dir);
    if loaded.is_empty() {
        println!("No presets in {}", dir.display());
        return Ok(());
    }
    for (name, preset) in loaded {
        println!(
            "  {:<20} iso {} shutter {} awb {}",
            name, preset.iso, preset.shutter_speed, preset.awb_mode
        );
    }
    Ok(())
}
