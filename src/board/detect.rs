//! Automatic board region detection.
//!
//! The puzzle board is a dark, low-saturation square sitting on a lighter,
//! busier background. Detection thresholds the image in HSV space to get a
//! background mask, merges the individual cells with a morphological closing,
//! and picks the largest near-square external contour.

use image::{GrayImage, ImageBuffer, Luma, Rgba};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::distance_transform::Norm;
use imageproc::morphology::{close, open};

use crate::config::DetectionConfig;

use super::Rect;

/// Detects the board rectangle in a screenshot.
///
/// Returns `None` when the mask produces no contours or none pass the
/// area/aspect filters; the caller must then require a manual rectangle.
pub fn detect(img: &ImageBuffer<Rgba<u8>, Vec<u8>>, cfg: &DetectionConfig) -> Option<Rect> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return None;
    }

    let mask = background_mask(img, cfg);

    // Closing merges the grid cells into one connected region, the lighter
    // opening strips small noise blobs. Kernel scales with the image so the
    // same config works across window sizes.
    let min_dim = width.min(height);
    let kernel = cfg
        .kernel_min
        .max((min_dim as f32 * cfg.kernel_fraction) as u32);
    let close_radius = kernel.min(255) as u8;
    let open_radius = (kernel / 2).max(1).min(255) as u8;
    let mask = close(&mask, Norm::LInf, close_radius);
    let mask = open(&mask, Norm::LInf, open_radius);

    let contours: Vec<Contour<u32>> = find_contours(&mask);

    let img_area = width as u64 * height as u64;
    let min_area = (img_area as f64 * cfg.min_area_fraction as f64) as u64;

    let mut best: Option<(Rect, f64)> = None;
    for contour in &contours {
        if contour.border_type != BorderType::Outer || contour.parent.is_some() {
            continue;
        }
        let Some(rect) = bounding_rect(contour) else {
            continue;
        };
        if rect.area() < min_area {
            continue;
        }
        let aspect = rect.width as f32 / rect.height as f32;
        if aspect < cfg.aspect_min || aspect > cfg.aspect_max {
            continue;
        }
        let score = rect.area() as f64 * (1.0 - (aspect as f64 - 1.0).abs());
        // Strictly greater keeps the first candidate in contour order on ties.
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((rect, score));
        }
    }

    let (rect, _) = best?;
    Some(expand(rect, width, height, cfg.pad_fraction))
}

/// Thresholds to the low-saturation, low-value pixels that make up the board
/// background. Foreground is white in the returned mask.
pub(crate) fn background_mask(
    img: &ImageBuffer<Rgba<u8>, Vec<u8>>,
    cfg: &DetectionConfig,
) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut mask = GrayImage::new(width, height);
    for (x, y, pixel) in img.enumerate_pixels() {
        let (s, v) = saturation_value(pixel[0], pixel[1], pixel[2]);
        let fg = if s <= cfg.saturation_max && v <= cfg.value_max {
            255u8
        } else {
            0u8
        };
        mask.put_pixel(x, y, Luma([fg]));
    }
    mask
}

/// HSV saturation and value on the 0-255 scale. Hue is not computed; the
/// threshold accepts the full hue range.
fn saturation_value(r: u8, g: u8, b: u8) -> (u8, u8) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let s = if max == 0 {
        0
    } else {
        ((max - min) as u32 * 255 / max as u32) as u8
    };
    (s, max)
}

/// Axis-aligned bounding rectangle of a contour.
fn bounding_rect(contour: &Contour<u32>) -> Option<Rect> {
    let first = contour.points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &contour.points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some(Rect {
        x: min_x,
        y: min_y,
        width: max_x - min_x + 1,
        height: max_y - min_y + 1,
    })
}

/// Expands the rectangle outward by `pad_fraction` of its shorter side,
/// clamped to the image bounds, so edge pixels are not clipped from the crop.
fn expand(rect: Rect, img_width: u32, img_height: u32, pad_fraction: f32) -> Rect {
    let pad = (pad_fraction * rect.width.min(rect.height) as f32) as u32;
    let x = rect.x.saturating_sub(pad);
    let y = rect.y.saturating_sub(pad);
    Rect {
        x,
        y,
        width: (rect.width + 2 * pad).min(img_width - x),
        height: (rect.height + 2 * pad).min(img_height - y),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DARK: Rgba<u8> = Rgba([40, 40, 45, 255]);

    /// Light background with a mild checkerboard texture, nothing that
    /// survives the dark-background threshold.
    fn light_image(width: u32, height: u32) -> ImageBuffer<Rgba<u8>, Vec<u8>> {
        ImageBuffer::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([235, 235, 235, 255])
            } else {
                Rgba([205, 210, 215, 255])
            }
        })
    }

    fn paint_rect(img: &mut ImageBuffer<Rgba<u8>, Vec<u8>>, r: Rect, color: Rgba<u8>) {
        for y in r.y..r.y + r.height {
            for x in r.x..r.x + r.width {
                img.put_pixel(x, y, color);
            }
        }
    }

    #[test]
    fn test_detects_injected_square() {
        let mut img = light_image(200, 200);
        let injected = Rect {
            x: 20,
            y: 20,
            width: 150,
            height: 150,
        };
        paint_rect(&mut img, injected, DARK);

        let rect = detect(&img, &DetectionConfig::default()).expect("square not found");

        // Center must land inside the injected square and the area must be
        // within 10% of it, padding included.
        let (cx, cy) = rect.center();
        assert!(cx >= 20 && cx < 170, "center x {} outside square", cx);
        assert!(cy >= 20 && cy < 170, "center y {} outside square", cy);
        let ratio = rect.area() as f64 / injected.area() as f64;
        assert!((0.9..=1.1).contains(&ratio), "area ratio {} out of range", ratio);
    }

    #[test]
    fn test_padding_expands_by_two_percent() {
        let mut img = light_image(200, 200);
        paint_rect(
            &mut img,
            Rect {
                x: 20,
                y: 20,
                width: 150,
                height: 150,
            },
            DARK,
        );

        // 2% of 150 = 3px of padding on every side.
        let rect = detect(&img, &DetectionConfig::default()).unwrap();
        assert!(rect.x.abs_diff(17) <= 2, "x = {}", rect.x);
        assert!(rect.y.abs_diff(17) <= 2, "y = {}", rect.y);
        assert!(rect.width.abs_diff(156) <= 4, "width = {}", rect.width);
        assert!(rect.height.abs_diff(156) <= 4, "height = {}", rect.height);
    }

    #[test]
    fn test_all_light_image_fails() {
        let img = light_image(200, 200);
        assert_eq!(detect(&img, &DetectionConfig::default()), None);
    }

    #[test]
    fn test_wide_region_fails_aspect_filter() {
        let mut img = light_image(200, 200);
        // Large enough area but aspect ratio 2.5, well outside [0.85, 1.15].
        paint_rect(
            &mut img,
            Rect {
                x: 10,
                y: 60,
                width: 150,
                height: 60,
            },
            DARK,
        );
        assert_eq!(detect(&img, &DetectionConfig::default()), None);
    }

    #[test]
    fn test_small_region_fails_area_filter() {
        let mut img = light_image(200, 200);
        // 20x20 = 1% of the image, below the 5% floor.
        paint_rect(
            &mut img,
            Rect {
                x: 50,
                y: 50,
                width: 20,
                height: 20,
            },
            DARK,
        );
        assert_eq!(detect(&img, &DetectionConfig::default()), None);
    }

    #[test]
    fn test_largest_square_wins() {
        let mut img = light_image(300, 300);
        paint_rect(
            &mut img,
            Rect {
                x: 10,
                y: 10,
                width: 80,
                height: 80,
            },
            DARK,
        );
        paint_rect(
            &mut img,
            Rect {
                x: 120,
                y: 120,
                width: 160,
                height: 160,
            },
            DARK,
        );

        let rect = detect(&img, &DetectionConfig::default()).unwrap();
        let (cx, cy) = rect.center();
        assert!(cx >= 120 && cy >= 120, "picked the smaller square: {:?}", rect);
    }

    #[test]
    fn test_padding_clamps_at_image_edge() {
        let mut img = light_image(200, 200);
        // Square flush against the origin; padding cannot go negative.
        paint_rect(
            &mut img,
            Rect {
                x: 0,
                y: 0,
                width: 120,
                height: 120,
            },
            DARK,
        );
        let rect = detect(&img, &DetectionConfig::default()).unwrap();
        assert_eq!(rect.x, 0);
        assert_eq!(rect.y, 0);
        assert!(rect.x + rect.width <= 200);
        assert!(rect.y + rect.height <= 200);
    }

    #[test]
    fn test_saturation_value() {
        assert_eq!(saturation_value(0, 0, 0), (0, 0));
        assert_eq!(saturation_value(255, 255, 255), (0, 255));
        // Pure red: fully saturated, full value.
        assert_eq!(saturation_value(255, 0, 0), (255, 255));
        // Dark gray: no saturation, low value.
        assert_eq!(saturation_value(40, 40, 40), (0, 40));
    }
}
