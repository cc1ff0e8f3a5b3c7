//! Screenshot acquisition and on-disk management.
//!
//! This module provides:
//! - Monitor capture (`screen`)
//! - Window lookup and capture (`window`)
//! - Device-bridge capture over adb (`device`)
//! - Encoding, timestamped naming, and latest-screenshot lookup

pub mod device;
pub mod screen;
pub mod window;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageBuffer, Rgba};
use regex::Regex;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// A captured frame, RGBA as delivered by every backend.
pub type Frame = ImageBuffer<Rgba<u8>, Vec<u8>>;

/// Output encoding selected on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
        }
    }
}

/// Builds a timestamped output path: `screen_YYYYmmdd_HHMMSS_micros[_mN].<ext>`.
pub fn output_path(dir: &Path, format: ImageFormat, monitor_index: Option<usize>) -> PathBuf {
    let stamp = Local::now().format("%Y%m%d_%H%M%S_%6f");
    let name = match monitor_index {
        Some(m) => format!("screen_{}_m{}.{}", stamp, m, format.extension()),
        None => format!("screen_{}.{}", stamp, format.extension()),
    };
    dir.join(name)
}

/// Writes the frame to disk. PNG is saved as-is; JPEG drops the alpha channel
/// and encodes at the requested quality.
pub fn save_image(img: &Frame, path: &Path, format: ImageFormat, quality: u8) -> Result<()> {
    match format {
        ImageFormat::Png => img
            .save(path)
            .with_context(|| format!("Failed to save {}", path.display())),
        ImageFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgba8(img.clone()).to_rgb8();
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            let encoder = JpegEncoder::new_with_quality(&mut writer, quality);
            rgb.write_with_encoder(encoder)
                .with_context(|| format!("Failed to encode {}", path.display()))
        }
    }
}

/// Returns the newest `screen_*` screenshot in the directory, ordering by the
/// timestamp embedded in the filename and falling back to the file's mtime for
/// names that don't carry one.
pub fn latest_screenshot(dir: &Path) -> Result<Option<PathBuf>> {
    let pattern = Regex::new(r"^screen_(\d{8}_\d{6}_\d+)")?;

    let mut candidates: Vec<(String, PathBuf)> = Vec::new();
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?;
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        if !matches!(ext.as_deref(), Some("png") | Some("jpg") | Some("jpeg")) {
            continue;
        }
        let key = match pattern.captures(name) {
            Some(caps) => caps[1].to_string(),
            None if name.starts_with("screen_") => {
                let mtime: DateTime<Local> = entry.metadata()?.modified()?.into();
                mtime.format("%Y%m%d_%H%M%S_%6f").to_string()
            }
            None => continue,
        };
        candidates.push((key, path));
    }

    candidates.sort();
    Ok(candidates.pop().map(|(_, path)| path))
}

/// Ensures the output directory exists, creating it if needed.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn test_output_path_shape() {
        let dir = PathBuf::from("/tmp/shots");
        let path = output_path(&dir, ImageFormat::Png, None);
        let name = path.file_name().unwrap().to_str().unwrap();
        let re = Regex::new(r"^screen_\d{8}_\d{6}_\d{6}\.png$").unwrap();
        assert!(re.is_match(name), "unexpected name {}", name);
    }

    #[test]
    fn test_output_path_monitor_suffix() {
        let dir = PathBuf::from(".");
        let path = output_path(&dir, ImageFormat::Jpeg, Some(2));
        let name = path.file_name().unwrap().to_str().unwrap();
        let re = Regex::new(r"^screen_\d{8}_\d{6}_\d{6}_m2\.jpg$").unwrap();
        assert!(re.is_match(name), "unexpected name {}", name);
    }

    #[test]
    fn test_extension_mapping() {
        assert_eq!(ImageFormat::Png.extension(), "png");
        assert_eq!(ImageFormat::Jpeg.extension(), "jpg");
    }

    #[test]
    fn test_latest_screenshot_by_embedded_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "screen_20250101_120000_000001.png",
            "screen_20250103_080000_000001.png",
            "screen_20250102_235959_999999.jpg",
            "board_20250104_120000_000001.png",
            "notes.txt",
        ] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let latest = latest_screenshot(dir.path()).unwrap().unwrap();
        assert_eq!(
            latest.file_name().unwrap().to_str().unwrap(),
            "screen_20250103_080000_000001.png"
        );
    }

    #[test]
    fn test_latest_screenshot_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(latest_screenshot(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_save_image_roundtrip_png() {
        let dir = tempfile::tempdir().unwrap();
        let img: Frame = ImageBuffer::from_pixel(8, 8, Rgba([10, 20, 30, 255]));
        let path = dir.path().join("shot.png");
        save_image(&img, &path, ImageFormat::Png, 90).unwrap();
        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(loaded.dimensions(), (8, 8));
        assert_eq!(loaded.get_pixel(0, 0), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_save_image_jpeg_drops_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let img: Frame = ImageBuffer::from_pixel(8, 8, Rgba([200, 100, 50, 128]));
        let path = dir.path().join("shot.jpg");
        save_image(&img, &path, ImageFormat::Jpeg, 90).unwrap();
        let loaded = image::open(&path).unwrap();
        assert_eq!(loaded.color().channel_count(), 3);
    }
}
