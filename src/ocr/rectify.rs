//! Perspective correction of the grid region.
//!
//! The crop around the board is rarely a perfect axis-aligned square; this
//! module finds the grid's outline quad and warps it onto a square so the
//! fixed 9x9 tiling lands on the cells.

use image::{ImageBuffer, Rgba};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::distance_transform::Norm;
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use imageproc::morphology::close;

use crate::board::detect::background_mask;
use crate::config::DetectionConfig;

type Image = ImageBuffer<Rgba<u8>, Vec<u8>>;

/// Orders four quad corners as [top-left, top-right, bottom-right, bottom-left]:
/// the coordinate sum is minimal at the top-left and maximal at the bottom-right,
/// the difference x - y is maximal at the top-right and minimal at the bottom-left.
pub fn order_corners(points: [(f32, f32); 4]) -> [(f32, f32); 4] {
    let by_sum = |p: &(f32, f32)| p.0 + p.1;
    let by_diff = |p: &(f32, f32)| p.0 - p.1;

    let top_left = *points
        .iter()
        .min_by(|a, b| by_sum(a).total_cmp(&by_sum(b)))
        .unwrap();
    let bottom_right = *points
        .iter()
        .max_by(|a, b| by_sum(a).total_cmp(&by_sum(b)))
        .unwrap();
    let top_right = *points
        .iter()
        .max_by(|a, b| by_diff(a).total_cmp(&by_diff(b)))
        .unwrap();
    let bottom_left = *points
        .iter()
        .min_by(|a, b| by_diff(a).total_cmp(&by_diff(b)))
        .unwrap();

    [top_left, top_right, bottom_right, bottom_left]
}

/// Finds the corner quad of the largest dark region in the image, which for a
/// board crop is the grid itself.
pub fn find_grid_quad(img: &Image, cfg: &DetectionConfig) -> Option<[(f32, f32); 4]> {
    let mask = background_mask(img, cfg);
    let mask = close(&mask, Norm::LInf, 3);

    let contours: Vec<Contour<u32>> = find_contours(&mask);
    let contour = contours
        .iter()
        .filter(|c| c.border_type == BorderType::Outer && !c.points.is_empty())
        .max_by_key(|c| {
            let (min_x, min_y, max_x, max_y) = extent(c);
            (max_x - min_x + 1) as u64 * (max_y - min_y + 1) as u64
        })?;

    // Extreme points along the two diagonals are the quad corners.
    let corner = |key: fn(u32, u32) -> i64, max: bool| {
        let iter = contour.points.iter();
        let p = if max {
            iter.max_by_key(|p| key(p.x, p.y)).unwrap()
        } else {
            iter.min_by_key(|p| key(p.x, p.y)).unwrap()
        };
        (p.x as f32, p.y as f32)
    };
    let sum = |x: u32, y: u32| x as i64 + y as i64;
    let diff = |x: u32, y: u32| x as i64 - y as i64;

    Some([
        corner(sum, false),  // top-left
        corner(diff, true),  // top-right
        corner(sum, true),   // bottom-right
        corner(diff, false), // bottom-left
    ])
}

/// Warps the grid quad onto an axis-aligned square whose side is the longest
/// measured quad edge. Returns the input unchanged when no quad is found or
/// the projection is degenerate.
pub fn rectify(img: &Image, cfg: &DetectionConfig) -> Image {
    let Some(corners) = find_grid_quad(img, cfg) else {
        crate::log("No grid outline found, skipping perspective correction");
        return img.clone();
    };
    rectify_quad(img, corners).unwrap_or_else(|| img.clone())
}

/// Warps an explicit corner quad onto a square.
pub fn rectify_quad(img: &Image, corners: [(f32, f32); 4]) -> Option<Image> {
    let [tl, tr, br, bl] = order_corners(corners);

    let side = [dist(tl, tr), dist(tr, br), dist(br, bl), dist(bl, tl)]
        .into_iter()
        .fold(0.0f32, f32::max)
        .round();
    if side < 9.0 {
        return None;
    }
    let far = side - 1.0;

    let projection = Projection::from_control_points(
        [tl, tr, br, bl],
        [(0.0, 0.0), (far, 0.0), (far, far), (0.0, far)],
    )?;

    let mut out = ImageBuffer::new(side as u32, side as u32);
    warp_into(
        img,
        &projection,
        Interpolation::Bilinear,
        Rgba([0, 0, 0, 255]),
        &mut out,
    );
    Some(out)
}

fn dist(a: (f32, f32), b: (f32, f32)) -> f32 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

fn extent(contour: &Contour<u32>) -> (u32, u32, u32, u32) {
    let mut min_x = u32::MAX;
    let mut min_y = u32::MAX;
    let mut max_x = 0;
    let mut max_y = 0;
    for p in &contour.points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    (min_x, min_y, max_x, max_y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_corners_shuffled() {
        let ordered = order_corners([(99.0, 3.0), (2.0, 98.0), (100.0, 97.0), (1.0, 2.0)]);
        assert_eq!(ordered[0], (1.0, 2.0)); // top-left
        assert_eq!(ordered[1], (99.0, 3.0)); // top-right
        assert_eq!(ordered[2], (100.0, 97.0)); // bottom-right
        assert_eq!(ordered[3], (2.0, 98.0)); // bottom-left
    }

    #[test]
    fn test_order_corners_already_ordered() {
        let quad = [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
        assert_eq!(order_corners(quad), quad);
    }

    #[test]
    fn test_rectify_quad_axis_aligned_square() {
        // An already-square quad: the output side equals the measured edge.
        let img: Image = ImageBuffer::from_pixel(120, 120, Rgba([30, 30, 30, 255]));
        let corners = [(0.0, 0.0), (119.0, 0.0), (119.0, 119.0), (0.0, 119.0)];
        let out = rectify_quad(&img, corners).unwrap();
        assert_eq!(out.dimensions(), (119, 119));
    }

    #[test]
    fn test_rectify_quad_degenerate_returns_none() {
        let img: Image = ImageBuffer::new(50, 50);
        let corners = [(1.0, 1.0), (2.0, 1.0), (2.0, 2.0), (1.0, 2.0)];
        assert!(rectify_quad(&img, corners).is_none());
    }

    #[test]
    fn test_find_grid_quad_on_dark_square() {
        let mut img: Image = ImageBuffer::from_pixel(200, 200, Rgba([240, 240, 240, 255]));
        for y in 40..160 {
            for x in 40..160 {
                img.put_pixel(x, y, Rgba([35, 35, 40, 255]));
            }
        }
        let quad = find_grid_quad(&img, &DetectionConfig::default()).unwrap();
        let [tl, tr, br, bl] = quad;
        let near = |p: (f32, f32), x: f32, y: f32| (p.0 - x).abs() <= 4.0 && (p.1 - y).abs() <= 4.0;
        assert!(near(tl, 40.0, 40.0), "top-left {:?}", tl);
        assert!(near(tr, 159.0, 40.0), "top-right {:?}", tr);
        assert!(near(br, 159.0, 159.0), "bottom-right {:?}", br);
        assert!(near(bl, 40.0, 159.0), "bottom-left {:?}", bl);
    }

    #[test]
    fn test_rectify_no_quad_returns_input() {
        let img: Image = ImageBuffer::from_pixel(60, 60, Rgba([250, 250, 250, 255]));
        let out = rectify(&img, &DetectionConfig::default());
        assert_eq!(out.dimensions(), (60, 60));
    }
}
