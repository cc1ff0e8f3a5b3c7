use anyhow::{anyhow, Result};
use image::{GrayImage, ImageBuffer, Rgba};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use std::process::Command;
use tempfile::NamedTempFile;

use super::setup::{find_tessdata_dir, find_tesseract_executable};

/// Binarizes a cell tile for recognition.
///
/// Otsu picks the split between digit strokes and cell background; the
/// minority class is the digit, which Tesseract wants black on white, so the
/// image is inverted when the strokes come out white.
pub fn prepare_tile(tile: &ImageBuffer<Rgba<u8>, Vec<u8>>) -> GrayImage {
    let gray: GrayImage = image::imageops::grayscale(tile);
    let level = otsu_level(&gray);
    let mut binary = threshold(&gray, level, ThresholdType::Binary);

    let white = binary.pixels().filter(|p| p[0] == 255).count();
    let total = (binary.width() * binary.height()) as usize;
    if white * 2 < total {
        for pixel in binary.pixels_mut() {
            pixel[0] = 255 - pixel[0];
        }
    }
    binary
}

/// Fraction of text (black) pixels in a binarized tile. Near-zero means the
/// cell is empty and not worth an OCR call.
pub fn text_fraction(binary: &GrayImage) -> f32 {
    let total = (binary.width() * binary.height()) as f32;
    if total == 0.0 {
        return 0.0;
    }
    let black = binary.pixels().filter(|p| p[0] == 0).count();
    black as f32 / total
}

/// Runs Tesseract on a single binarized cell, constrained to the digits 0-9.
/// Returns the raw recognized text; the caller normalizes it to a digit.
pub fn recognize_digit_text(img: &GrayImage) -> Result<String> {
    let tesseract_exe = find_tesseract_executable()?;

    // Save image to temporary file
    let temp_input = NamedTempFile::with_suffix(".png")?;
    img.save(temp_input.path())?;

    let mut cmd = Command::new(&tesseract_exe);
    cmd.arg(temp_input.path())
        .arg("stdout")
        .arg("-l")
        .arg("eng")
        .arg("--psm")
        .arg("10") // Treat the image as a single character
        .arg("-c")
        .arg("tessedit_char_whitelist=0123456789");
    if let Ok(tessdata) = find_tessdata_dir() {
        cmd.arg("--tessdata-dir").arg(tessdata);
    }

    let output = cmd.output()?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("Tesseract failed: {}", stderr.trim()));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn tile_with_stroke(bg: u8, fg: u8) -> ImageBuffer<Rgba<u8>, Vec<u8>> {
        let mut tile = ImageBuffer::from_pixel(40, 40, Rgba([bg, bg, bg, 255]));
        // Vertical bar roughly where a "1" would sit
        for y in 8..32 {
            for x in 18..22 {
                tile.put_pixel(x, y, Rgba([fg, fg, fg, 255]));
            }
        }
        tile
    }

    #[test]
    fn test_prepare_tile_light_digit_on_dark_cell() {
        let binary = prepare_tile(&tile_with_stroke(30, 230));
        // Digit strokes must end up black on a white background.
        assert_eq!(binary.get_pixel(20, 20)[0], 0);
        assert_eq!(binary.get_pixel(2, 2)[0], 255);
    }

    #[test]
    fn test_prepare_tile_dark_digit_on_light_cell() {
        let binary = prepare_tile(&tile_with_stroke(230, 30));
        assert_eq!(binary.get_pixel(20, 20)[0], 0);
        assert_eq!(binary.get_pixel(2, 2)[0], 255);
    }

    #[test]
    fn test_text_fraction() {
        let mut img = GrayImage::from_pixel(10, 10, Luma([255]));
        assert_eq!(text_fraction(&img), 0.0);
        for x in 0..10 {
            img.put_pixel(x, 0, Luma([0]));
        }
        assert!((text_fraction(&img) - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_text_fraction_empty_image() {
        let img = GrayImage::new(0, 0);
        assert_eq!(text_fraction(&img), 0.0);
    }

    #[test]
    #[ignore = "requires a Tesseract installation"]
    fn test_recognize_digit_text_runs() {
        let binary = prepare_tile(&tile_with_stroke(30, 230));
        let text = recognize_digit_text(&binary).expect("tesseract failed");
        assert!(text.len() <= 2);
    }
}
