//! Board region detection and cropping.
//!
//! This module provides:
//! - Rectangle parsing and clamping (`Rect`)
//! - Automatic board detection (`detect`)
//! - Cropping and board crop naming (`crop`, `board_file_name`)

pub mod detect;
pub mod rect;

pub use detect::detect;
pub use rect::Rect;

use image::{ImageBuffer, Rgba};
use std::path::Path;

/// Crops the given rectangle out of the image. The rectangle must already be
/// clamped to the image bounds.
pub fn crop(
    img: &ImageBuffer<Rgba<u8>, Vec<u8>>,
    rect: &Rect,
) -> ImageBuffer<Rgba<u8>, Vec<u8>> {
    image::imageops::crop_imm(img, rect.x, rect.y, rect.width, rect.height).to_image()
}

/// Derives the board crop filename from the source screenshot path:
/// `screen_20250101_120000_000000.png` -> `board_20250101_120000_000000.png`.
pub fn board_file_name(input: &Path) -> String {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("board");
    format!("board_{}.png", stem.strip_prefix("screen_").unwrap_or(stem))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_board_file_name_strips_screen_prefix() {
        let p = PathBuf::from("screenshots/screen_20250101_120000_123456.png");
        assert_eq!(board_file_name(&p), "board_20250101_120000_123456.png");
    }

    #[test]
    fn test_board_file_name_other_stem_kept() {
        let p = PathBuf::from("input.jpg");
        assert_eq!(board_file_name(&p), "board_input.png");
    }

    #[test]
    fn test_crop_extracts_region() {
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_fn(100, 100, |x, y| Rgba([x as u8, y as u8, 0, 255]));
        let rect = Rect {
            x: 10,
            y: 20,
            width: 30,
            height: 40,
        };
        let cropped = crop(&img, &rect);
        assert_eq!(cropped.dimensions(), (30, 40));
        assert_eq!(cropped.get_pixel(0, 0)[0], 10);
        assert_eq!(cropped.get_pixel(0, 0)[1], 20);
    }
}
