//! Box - Rectangle regions
//!
//! Bounding boxes of connected components and clip regions.

use crate::error::{Error, Result};

/// A rectangle region
///
/// A small `Copy` type; `x`/`y` is the top-left corner and the right and
/// bottom edges are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Box {
    /// Left x coordinate
    pub x: i32,
    /// Top y coordinate
    pub y: i32,
    /// Width
    pub w: i32,
    /// Height
    pub h: i32,
}

impl Box {
    /// Create a new box
    ///
    /// # Errors
    ///
    /// Returns an error if width or height is negative.
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Result<Self> {
        if w < 0 || h < 0 {
            return Err(Error::InvalidParameter(format!(
                "box dimensions must be non-negative: w={}, h={}",
                w, h
            )));
        }
        Ok(Self { x, y, w, h })
    }

    /// Create a box without validation
    pub const fn new_unchecked(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Smallest box holding the inclusive pixel range `[x0, x1] x [y0, y1]`.
    pub fn from_inclusive(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self {
            x: x0.min(x1),
            y: y0.min(y1),
            w: (x1 - x0).abs() + 1,
            h: (y1 - y0).abs() + 1,
        }
    }

    /// Get the right x coordinate (exclusive)
    #[inline]
    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    /// Get the bottom y coordinate (exclusive)
    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    /// Check whether the point lies inside the box.
    #[inline]
    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Area in pixels.
    #[inline]
    pub fn area(&self) -> i64 {
        i64::from(self.w) * i64::from(self.h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_edges() {
        let b = Box::new(10, 20, 30, 40).unwrap();
        assert_eq!(b.right(), 40);
        assert_eq!(b.bottom(), 60);
        assert!(b.contains_point(10, 20));
        assert!(!b.contains_point(40, 20));
        assert_eq!(b.area(), 1200);
    }

    #[test]
    fn test_box_negative() {
        assert!(Box::new(0, 0, -1, 5).is_err());
    }

    #[test]
    fn test_from_inclusive() {
        let b = Box::from_inclusive(5, 7, 2, 7);
        assert_eq!(b, Box::new_unchecked(2, 7, 4, 1));
    }
}
