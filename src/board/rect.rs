use anyhow::{anyhow, Error, Result};
use std::fmt;
use std::str::FromStr;

/// A rectangle in pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Center point of the rectangle.
    pub fn center(&self) -> (u32, u32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }
}

/// A manually supplied rectangle, as parsed from the command line. Kept signed
/// until clamping so that out-of-range input is corrected rather than rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ManualRect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl ManualRect {
    /// Clamps into the given image bounds: x and y into `[0, dim-1]`,
    /// width and height into `[1, remaining]`. Never fails.
    pub fn clamped(&self, img_width: u32, img_height: u32) -> Rect {
        let x = self.x.clamp(0, (img_width as i64 - 1).max(0)) as u32;
        let y = self.y.clamp(0, (img_height as i64 - 1).max(0)) as u32;
        let width = self.width.clamp(1, (img_width - x) as i64) as u32;
        let height = self.height.clamp(1, (img_height - y) as i64) as u32;
        Rect {
            x,
            y,
            width,
            height,
        }
    }
}

impl FromStr for ManualRect {
    type Err = Error;

    /// Parses `"x,y,w,h"`. Unparseable input is a hard error.
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<i64> = s
            .split(',')
            .map(|p| p.trim().parse::<i64>())
            .collect::<Result<_, _>>()
            .map_err(|_| anyhow!("board rectangle must be four integers: x,y,w,h (got {:?})", s))?;
        if parts.len() != 4 {
            return Err(anyhow!(
                "board rectangle needs exactly 4 values x,y,w,h, got {}",
                parts.len()
            ));
        }
        Ok(Self {
            x: parts[0],
            y: parts[1],
            width: parts[2],
            height: parts[3],
        })
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.x, self.y, self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let r: ManualRect = "80,240,360,360".parse().unwrap();
        assert_eq!(
            r,
            ManualRect {
                x: 80,
                y: 240,
                width: 360,
                height: 360
            }
        );
    }

    #[test]
    fn test_parse_with_spaces() {
        let r: ManualRect = " 1, 2, 3, 4 ".parse().unwrap();
        assert_eq!(r.x, 1);
        assert_eq!(r.height, 4);
    }

    #[test]
    fn test_parse_wrong_count() {
        assert!("1,2,3".parse::<ManualRect>().is_err());
        assert!("1,2,3,4,5".parse::<ManualRect>().is_err());
    }

    #[test]
    fn test_parse_garbage() {
        assert!("a,b,c,d".parse::<ManualRect>().is_err());
        assert!("".parse::<ManualRect>().is_err());
    }

    #[test]
    fn test_clamp_overhanging() {
        // 100x100 image, rect hanging off the bottom-right corner
        let r = ManualRect {
            x: 90,
            y: 90,
            width: 50,
            height: 50,
        };
        assert_eq!(
            r.clamped(100, 100),
            Rect {
                x: 90,
                y: 90,
                width: 10,
                height: 10
            }
        );
    }

    #[test]
    fn test_clamp_negative_origin() {
        let r = ManualRect {
            x: -10,
            y: -5,
            width: 50,
            height: 50,
        };
        assert_eq!(
            r.clamped(100, 100),
            Rect {
                x: 0,
                y: 0,
                width: 50,
                height: 50
            }
        );
    }

    #[test]
    fn test_clamp_zero_size_becomes_one() {
        let r = ManualRect {
            x: 10,
            y: 10,
            width: 0,
            height: -3,
        };
        let c = r.clamped(100, 100);
        assert_eq!(c.width, 1);
        assert_eq!(c.height, 1);
    }

    #[test]
    fn test_clamp_inside_unchanged() {
        let r = ManualRect {
            x: 20,
            y: 20,
            width: 150,
            height: 150,
        };
        assert_eq!(
            r.clamped(200, 200),
            Rect {
                x: 20,
                y: 20,
                width: 150,
                height: 150
            }
        );
    }
}
