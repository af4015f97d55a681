#![allow(dead_code)]

use assert_cmd::Command;
use chrono::NaiveDate;
use image::{Rgb, RgbImage};
use lunar_log::store::{EntryStore, FileKeyValue, FixedClock, LocalImageDir};
use std::path::Path;

/// Creates a `Command` for the `lunar-log` binary with a clean, non-interactive
/// environment pointed at `data_dir`.
pub fn base_command(data_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("lunar-log").expect("lunar-log binary not built");
    cmd.env_clear();
    if let Ok(path) = std::env::var("PATH") {
        cmd.env("PATH", path);
    }
    if let Ok(tmpdir) = std::env::var("TMPDIR") {
        cmd.env("TMPDIR", tmpdir);
    }
    cmd.env("HOME", data_dir)
        .env("LUNAR_LOG_DIR", data_dir)
        .write_stdin("");
    cmd
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Writes a solid PNG of the given size.
pub fn write_test_image(path: &Path, width: u32, height: u32) {
    RgbImage::from_pixel(width, height, Rgb([220, 220, 200]))
        .save(path)
        .expect("Failed to write test image");
}

/// An initialized store over `dir` whose clock is fixed at noon on `today`.
pub fn open_store(dir: &Path, today: NaiveDate) -> EntryStore {
    let mut store = EntryStore::new(
        Box::new(FileKeyValue::new(dir)),
        Box::new(LocalImageDir::new(dir.join("moon_images"))),
        Box::new(FixedClock::at_noon(today)),
    );
    store.init().expect("Failed to initialize store");
    store
}

pub fn image_files(dir: &Path) -> Vec<std::path::PathBuf> {
    match std::fs::read_dir(dir.join("moon_images")) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .collect(),
        Err(_) => Vec::new(),
    }
}
