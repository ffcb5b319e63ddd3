// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for sequential image naming

use picam::storage::Storage;

#[test]
fn test_empty_directory_starts_at_zero() {
    let dir = tempfile::tempdir().unwrap();
    let mut storage = Storage::new(dir.path());
    storage.start().unwrap();

    let path = storage.get_new_name("png").unwrap();
    assert_eq!(path.file_name().unwrap(), "IMG0000.png");
}

#[test]
fn test_scan_resumes_after_existing_images() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..8 {
        std::fs::write(dir.path().join(format!("IMG{:04}.png", i)), b"x").unwrap();
    }
    // unrelated files must not influence the counter
    std::fs::write(dir.path().join("IMG9999.tiff"), b"x").unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();

    let mut storage = Storage::new(dir.path());
    storage.start().unwrap();

    let path = storage.get_new_name("png").unwrap();
    assert_eq!(path.file_name().unwrap(), "IMG0008.png");
}

#[test]
fn test_names_strictly_increase_across_extensions() {
    let dir = tempfile::tempdir().unwrap();
    let mut storage = Storage::new(dir.path());
    storage.start().unwrap();

    let names: Vec<String> = ["png", "jpeg", "png", "bmp"]
        .iter()
        .map(|ext| {
            storage
                .get_new_name(ext)
                .unwrap()
                .file_name()
                .unwrap()
                .to_string_lossy()
                .into_owned()
        })
        .collect();

    assert_eq!(names, ["IMG0000.png", "IMG0001.jpeg", "IMG0002.png", "IMG0003.bmp"]);
}

#[test]
fn test_start_creates_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("b");
    let mut storage = Storage::new(&nested);
    storage.start().unwrap();
    assert!(nested.is_dir());
}
