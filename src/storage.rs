// SPDX-License-Identifier: GPL-3.0-only

//! Sequential image file naming
//!
//! Captured images are named `IMG0000.png`, `IMG0001.png`, … The
//! counter starts one past the highest id already present in the target
//! directory, so restarts never overwrite earlier captures.

use crate::constants::{file_formats, storage as consts};
use crate::errors::{CameraError, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Allocates strictly increasing image filenames in one directory
#[derive(Debug)]
pub struct Storage {
    path: PathBuf,
    next_id: u64,
    num_digits: usize,
}

impl Storage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            next_id: 0,
            num_digits: consts::NUM_DIGITS,
        }
    }

    /// Directory this storage writes into
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure the directory exists and position the counter after any
    /// existing images
    pub fn start(&mut self) -> Result<()> {
        std::fs::create_dir_all(&self.path)
            .map_err(|e| CameraError::Storage(format!("{}: {}", self.path.display(), e)))?;

        self.next_id = 0;
        let entries = std::fs::read_dir(&self.path)
            .map_err(|e| CameraError::Storage(format!("{}: {}", self.path.display(), e)))?;
        for entry in entries.flatten() {
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let name = entry.file_name();
            if let Some(id) = parse_image_id(&name.to_string_lossy()) {
                self.next_id = self.next_id.max(id + 1);
            }
        }

        if self.next_id != 0 {
            info!(
                dir = %self.path.display(),
                next_id = self.next_id,
                "Storage found existing images"
            );
        } else {
            info!(dir = %self.path.display(), "Storage found no existing images, starting at id 0");
        }
        Ok(())
    }

    /// Allocate the next image path for the given extension
    ///
    /// Ids are strictly increasing across repeated calls within one
    /// session, regardless of extension.
    pub fn get_new_name(&mut self, extension: &str) -> Result<PathBuf> {
        if !file_formats::is_valid_extension(extension) {
            return Err(CameraError::Storage(format!(
                "invalid extension: {}",
                extension
            )));
        }
        let name = format!(
            "{}{:0width$}.{}",
            consts::IMAGE_PREFIX,
            self.next_id,
            extension.to_lowercase(),
            width = self.num_digits
        );
        self.next_id += 1;
        Ok(self.path.join(name))
    }
}

/// Extract the numeric id from an `IMG<digits>.<valid ext>` filename
fn parse_image_id(name: &str) -> Option<u64> {
    let rest = name.strip_prefix(consts::IMAGE_PREFIX)?;
    let (digits, extension) = rest.split_once('.')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if !file_formats::is_valid_extension(extension) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_image_id() {
        assert_eq!(parse_image_id("IMG0007.png"), Some(7));
        assert_eq!(parse_image_id("IMG12345.jpeg"), Some(12345));
        assert_eq!(parse_image_id("IMG.png"), None);
        assert_eq!(parse_image_id("IMG0007.tiff"), None);
        assert_eq!(parse_image_id("DSC0007.png"), None);
        assert_eq!(parse_image_id("IMG00x7.png"), None);
    }

    #[test]
    fn test_invalid_extension_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = Storage::new(dir.path());
        storage.start().unwrap();
        assert!(storage.get_new_name("exe").is_err());
    }
}
