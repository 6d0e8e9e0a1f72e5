//! FPix - Floating-point image
//!
//! `FPix` is a 2D array of `f32` values. Disparity fields, both the sampled
//! grids and their full-resolution expansions, are stored this way.
//!
//! # Examples
//!
//! ```
//! use flatpage_core::FPix;
//!
//! let mut fpix = FPix::new(100, 100).unwrap();
//! fpix.set_pixel(10, 20, 0.5).unwrap();
//! assert_eq!(fpix.get_pixel(10, 20).unwrap(), 0.5);
//! ```

use crate::error::{Error, Result};
use crate::pix::{Pix, PixMut, PixelDepth};

/// Floating-point image
///
/// # Memory Layout
///
/// Data is stored in row-major order with no padding. The pixel at (x, y)
/// is at index `y * width + x`.
#[derive(Debug, Clone, PartialEq)]
pub struct FPix {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl FPix {
    /// Create a new FPix with all pixels set to zero
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidDimension` if width or height is 0.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Self::new_with_value(width, height, 0.0)
    }

    /// Create a new FPix with all pixels set to `value`
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidDimension` if width or height is 0.
    pub fn new_with_value(width: u32, height: u32, value: f32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }
        let size = (width as usize) * (height as usize);
        Ok(FPix {
            width,
            height,
            data: vec![value; size],
        })
    }

    /// Create a FPix from row-major data
    ///
    /// # Errors
    ///
    /// Returns an error if dimensions are invalid or data length doesn't match.
    pub fn from_data(width: u32, height: u32, data: Vec<f32>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }
        let expected_size = (width as usize) * (height as usize);
        if data.len() != expected_size {
            return Err(Error::InvalidParameter(format!(
                "data length {} doesn't match {}x{} = {}",
                data.len(),
                width,
                height,
                expected_size
            )));
        }
        Ok(FPix {
            width,
            height,
            data,
        })
    }

    /// Get the width in pixels
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get the height in pixels
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get the dimensions as (width, height)
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }

    /// Get the value at (x, y)
    ///
    /// # Errors
    ///
    /// Returns `Error::IndexOutOfBounds` if coordinates are out of range.
    #[inline]
    pub fn get_pixel(&self, x: u32, y: u32) -> Result<f32> {
        if x >= self.width || y >= self.height {
            return Err(Error::IndexOutOfBounds {
                index: self.index(x, y),
                len: self.data.len(),
            });
        }
        Ok(self.data[self.index(x, y)])
    }

    /// Set the value at (x, y)
    ///
    /// # Errors
    ///
    /// Returns `Error::IndexOutOfBounds` if coordinates are out of range.
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, value: f32) -> Result<()> {
        if x >= self.width || y >= self.height {
            return Err(Error::IndexOutOfBounds {
                index: self.index(x, y),
                len: self.data.len(),
            });
        }
        let idx = self.index(x, y);
        self.data[idx] = value;
        Ok(())
    }

    /// Get the value at (x, y) without a coordinate check
    ///
    /// # Panics
    ///
    /// Panics if the computed index lies outside the data.
    #[inline]
    pub fn get_pixel_unchecked(&self, x: u32, y: u32) -> f32 {
        self.data[self.index(x, y)]
    }

    /// Set the value at (x, y) without a coordinate check
    #[inline]
    pub fn set_pixel_unchecked(&mut self, x: u32, y: u32, value: f32) {
        let idx = self.index(x, y);
        self.data[idx] = value;
    }

    /// Get raw access to the data
    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Get mutable access to the data
    #[inline]
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Get a row of data
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row(&self, y: u32) -> &[f32] {
        let start = self.index(0, y);
        &self.data[start..start + self.width as usize]
    }

    /// Get a mutable row of data
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [f32] {
        let start = self.index(0, y);
        let end = start + self.width as usize;
        &mut self.data[start..end]
    }

    /// Find the minimum value and its first location
    pub fn min(&self) -> Option<(f32, u32, u32)> {
        self.extreme(|v, best| v < best)
    }

    /// Find the maximum value and its first location
    pub fn max(&self) -> Option<(f32, u32, u32)> {
        self.extreme(|v, best| v > best)
    }

    /// Find the minimum value only
    pub fn min_value(&self) -> Option<f32> {
        self.min().map(|(v, _, _)| v)
    }

    /// Find the maximum value only
    pub fn max_value(&self) -> Option<f32> {
        self.max().map(|(v, _, _)| v)
    }

    fn extreme(&self, better: impl Fn(f32, f32) -> bool) -> Option<(f32, u32, u32)> {
        let mut best: Option<(f32, u32, u32)> = None;
        for y in 0..self.height {
            for (x, &v) in self.row(y).iter().enumerate() {
                match best {
                    Some((b, _, _)) if !better(v, b) => {}
                    _ => best = Some((v, x as u32, y)),
                }
            }
        }
        best
    }

    /// Expand a sampled field by an integer factor.
    ///
    /// The output is `((w - 1) * factor + 1) x ((h - 1) * factor + 1)`.
    /// Values inside each cell are bilinearly interpolated from the four
    /// corner samples, so output pixel `(i * factor, j * factor)` equals
    /// input pixel `(i, j)` exactly.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidParameter` if `factor` is 0.
    pub fn scale_by_integer(&self, factor: u32) -> Result<FPix> {
        if factor == 0 {
            return Err(Error::InvalidParameter(
                "scale factor must be > 0".to_string(),
            ));
        }
        let (ws, hs) = self.dimensions();
        let wd = (ws - 1) * factor + 1;
        let hd = (hs - 1) * factor + 1;
        let mut out = FPix::new(wd, hd)?;
        let s = factor as f32;

        for i in 0..hs {
            let i1 = (i + 1).min(hs - 1);
            // The last sample row only produces one output row.
            let krange = if i + 1 < hs { factor } else { 1 };
            for j in 0..ws {
                let j1 = (j + 1).min(ws - 1);
                let mrange = if j + 1 < ws { factor } else { 1 };
                let v00 = self.get_pixel_unchecked(j, i);
                let v10 = self.get_pixel_unchecked(j1, i);
                let v01 = self.get_pixel_unchecked(j, i1);
                let v11 = self.get_pixel_unchecked(j1, i1);
                for k in 0..krange {
                    let fy = k as f32 / s;
                    for m in 0..mrange {
                        // Zero fractions return v00 exactly.
                        let fx = m as f32 / s;
                        let top = v00 + fx * (v10 - v00);
                        let bottom = v01 + fx * (v11 - v01);
                        let val = top + fy * (bottom - top);
                        out.set_pixel_unchecked(j * factor + m, i * factor + k, val);
                    }
                }
            }
        }
        Ok(out)
    }

    /// Take every `factor`-th sample in both directions, starting at (0, 0).
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidParameter` if `factor` is 0.
    pub fn subsample(&self, factor: u32) -> Result<FPix> {
        if factor == 0 {
            return Err(Error::InvalidParameter(
                "subsample factor must be > 0".to_string(),
            ));
        }
        let wd = (self.width - 1) / factor + 1;
        let hd = (self.height - 1) / factor + 1;
        let mut out = FPix::new(wd, hd)?;
        for y in 0..hd {
            for x in 0..wd {
                out.set_pixel_unchecked(x, y, self.get_pixel_unchecked(x * factor, y * factor));
            }
        }
        Ok(out)
    }

    /// Render contour lines of the field as a 1 bpp mask.
    ///
    /// A pixel is on if its value lies within `proxim` (as a fraction of
    /// `incr`) of a multiple of `incr`. `proxim` defaults to 0.15 when <= 0.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidParameter` if `incr` is not positive.
    pub fn render_contours(&self, incr: f32, proxim: f32) -> Result<Pix> {
        if incr <= 0.0 {
            return Err(Error::InvalidParameter("incr must be > 0".to_string()));
        }
        let proxim = if proxim <= 0.0 { 0.15 } else { proxim };
        let (w, h) = self.dimensions();
        let mut pixd = PixMut::new(w, h, PixelDepth::Bit1)?;
        let inv_incr = 1.0 / incr;
        for y in 0..h {
            for x in 0..w {
                let finter = inv_incr * self.get_pixel_unchecked(x, y);
                let above = finter - finter.floor();
                let below = finter.ceil() - finter;
                if above.min(below) <= proxim {
                    pixd.set_pixel_unchecked(x, y, 1);
                }
            }
        }
        Ok(pixd.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fpix_creation() {
        let fpix = FPix::new_with_value(4, 3, 1.5).unwrap();
        assert_eq!(fpix.dimensions(), (4, 3));
        assert!(fpix.data().iter().all(|&v| v == 1.5));
        assert!(FPix::new(0, 3).is_err());
        assert!(FPix::from_data(2, 2, vec![0.0; 3]).is_err());
    }

    #[test]
    fn test_fpix_min_max() {
        let fpix = FPix::from_data(3, 2, vec![1.0, -2.0, 3.0, 3.0, 0.0, -2.0]).unwrap();
        assert_eq!(fpix.min(), Some((-2.0, 1, 0)));
        assert_eq!(fpix.max(), Some((3.0, 2, 0)));
    }

    #[test]
    fn test_scale_by_integer_corners_exact() {
        let src = FPix::from_data(3, 2, vec![0.0, 10.0, 20.0, 5.0, 15.0, 40.0]).unwrap();
        let out = src.scale_by_integer(4).unwrap();
        assert_eq!(out.dimensions(), (9, 5));
        for j in 0..2 {
            for i in 0..3 {
                assert_eq!(
                    out.get_pixel(i * 4, j * 4).unwrap(),
                    src.get_pixel(i, j).unwrap()
                );
            }
        }
        // midpoint of the first cell
        assert!((out.get_pixel(2, 2).unwrap() - 7.5).abs() < 1e-5);
    }

    #[test]
    fn test_scale_by_integer_constant_field() {
        let src = FPix::new_with_value(4, 4, 2.5).unwrap();
        let out = src.scale_by_integer(7).unwrap();
        assert!(out.data().iter().all(|&v| (v - 2.5).abs() < 1e-5));
    }

    #[test]
    fn test_subsample_inverts_scale() {
        let src = FPix::from_data(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let back = src.scale_by_integer(5).unwrap().subsample(5).unwrap();
        assert_eq!(back, src);
    }

    #[test]
    fn test_subsample_inverts_scale_for_inexact_values() {
        for k in 0..2000 {
            let v = k as f32 * 0.0137 - 7.3;
            let src = FPix::new_with_value(2, 2, v).unwrap();
            let back = src.scale_by_integer(30).unwrap().subsample(30).unwrap();
            assert_eq!(back, src, "value {v}");
        }
        let data: Vec<f32> = (0..20).map(|k| (k as f32 * 0.731).sin() * 13.7).collect();
        let src = FPix::from_data(5, 4, data).unwrap();
        let back = src.scale_by_integer(30).unwrap().subsample(30).unwrap();
        assert_eq!(back, src);
    }

    #[test]
    fn test_render_contours() {
        let data: Vec<f32> = (0..10).map(|x| x as f32).collect();
        let fpix = FPix::from_data(10, 1, data).unwrap();
        let pix = fpix.render_contours(5.0, 0.1).unwrap();
        assert_eq!(pix.depth(), PixelDepth::Bit1);
        assert_eq!(pix.get_pixel(0, 0), Some(1));
        assert_eq!(pix.get_pixel(5, 0), Some(1));
        assert_eq!(pix.get_pixel(3, 0), Some(0));
        assert!(fpix.render_contours(0.0, 0.1).is_err());
    }
}
