pub mod engine;
pub mod grid;
pub mod rectify;
pub mod setup;

pub use grid::{normalize_digit, Grid};
pub use setup::ensure_tesseract;

use anyhow::Result;
use image::{ImageBuffer, Rgba};

use crate::config::{DetectionConfig, OcrConfig};

/// High-level function: board crop -> recognized 9x9 grid.
///
/// Rectifies the grid onto a square, tiles it 9x9 with an inward margin, and
/// runs digit recognition per tile. Empty-looking tiles skip the OCR call;
/// a recognition failure on a single tile degrades to an empty cell rather
/// than failing the whole grid.
pub fn recognize_grid(
    board: &ImageBuffer<Rgba<u8>, Vec<u8>>,
    detection: &DetectionConfig,
    cfg: &OcrConfig,
) -> Result<Grid> {
    // Fail early with install instructions instead of 81 identical errors.
    setup::find_tesseract_executable()?;

    let rectified = rectify::rectify(board, detection);
    let (width, height) = rectified.dimensions();

    let mut grid = Grid::default();
    for (row, col, rect) in grid::tile_rects(width, height, cfg.tile_margin) {
        let tile =
            image::imageops::crop_imm(&rectified, rect.x, rect.y, rect.width, rect.height)
                .to_image();
        let binary = engine::prepare_tile(&tile);
        if engine::text_fraction(&binary) < cfg.blank_threshold {
            continue;
        }
        match engine::recognize_digit_text(&binary) {
            Ok(text) => grid.set(row, col, grid::normalize_digit(&text)),
            Err(e) => {
                crate::log(&format!(
                    "OCR failed for cell ({},{}): {}",
                    row, col, e
                ));
            }
        }
    }

    crate::log(&format!("Recognized {} filled cells", grid.filled()));
    Ok(grid)
}
