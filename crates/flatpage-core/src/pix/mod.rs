//! PIX - The raster image container
//!
//! `Pix` holds a page image at 1, 8 or 32 bits per pixel. Both the binary
//! page used to build a dewarping model and the grayscale or color page
//! the model is applied to live in this container.
//!
//! # Pixel layout
//!
//! - Image data is stored in 32-bit words
//! - Every row starts on a 32-bit boundary (`wpl` words per line)
//! - Pixels are packed MSB to LSB within each word
//! - For 32-bit images, color order is RGBA (red in MSB)
//!
//! All pixel access goes through row slices, so an out-of-range row or
//! column is caught by slice bounds rather than by pointer arithmetic.
//!
//! # Ownership model
//!
//! `Pix` uses `Arc` for cheap cloning (shared ownership).
//! To modify pixel data, convert to `PixMut` via [`Pix::try_into_mut`]
//! or [`Pix::to_mut`], then convert back with `Into<Pix>`.

mod access;
mod ops;

pub use access::*;

use crate::error::{Error, Result};
use std::sync::Arc;

/// Pixel depth (bits per pixel)
///
/// Only the depths the dewarping pipeline reads and writes are supported:
/// binary masks, grayscale and packed RGBA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum PixelDepth {
    /// 1-bit binary image
    Bit1 = 1,
    /// 8-bit grayscale
    Bit8 = 8,
    /// 32-bit RGB or RGBA
    Bit32 = 32,
}

impl PixelDepth {
    /// Create `PixelDepth` from a raw bit count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDepth`] if `bits` is not 1, 8, or 32.
    pub fn from_bits(bits: u32) -> Result<Self> {
        match bits {
            1 => Ok(PixelDepth::Bit1),
            8 => Ok(PixelDepth::Bit8),
            32 => Ok(PixelDepth::Bit32),
            _ => Err(Error::InvalidDepth(bits)),
        }
    }

    /// Get the number of bits per pixel.
    pub fn bits(self) -> u32 {
        self as u32
    }

    /// Get the maximum pixel value representable at this depth.
    pub fn max_value(self) -> u32 {
        match self {
            PixelDepth::Bit32 => u32::MAX,
            _ => (1u32 << self.bits()) - 1,
        }
    }
}

/// Internal PIX data
#[derive(Debug)]
struct PixData {
    /// Width in pixels
    width: u32,
    /// Height in pixels
    height: u32,
    /// Depth in bits per pixel
    depth: PixelDepth,
    /// 32-bit words per line
    wpl: u32,
    /// The image data (packed 32-bit words)
    data: Vec<u32>,
}

impl PixData {
    fn zeroed(width: u32, height: u32, depth: PixelDepth) -> Self {
        let wpl = compute_wpl(width, depth);
        PixData {
            width,
            height,
            depth,
            wpl,
            data: vec![0u32; (wpl as usize) * (height as usize)],
        }
    }

    fn duplicate(&self) -> Self {
        PixData {
            width: self.width,
            height: self.height,
            depth: self.depth,
            wpl: self.wpl,
            data: self.data.clone(),
        }
    }

    #[inline]
    fn row_range(&self, y: u32) -> std::ops::Range<usize> {
        let start = (y as usize) * (self.wpl as usize);
        start..start + self.wpl as usize
    }
}

/// Compute words per line for given width and depth.
///
/// Uses u64 arithmetic to prevent overflow for large widths.
///
/// # Panics
///
/// Panics if the result would exceed `u32::MAX`.
#[inline]
fn compute_wpl(width: u32, depth: PixelDepth) -> u32 {
    let bits_per_line = u64::from(width) * u64::from(depth.bits());
    let wpl = bits_per_line.div_ceil(32);
    u32::try_from(wpl).unwrap_or_else(|_| {
        panic!(
            "image row too large: width={} depth={:?} requires {} words",
            width, depth, wpl
        )
    })
}

/// PIX - Raster image container
///
/// # Examples
///
/// ```
/// use flatpage_core::{Pix, PixelDepth};
///
/// let pix = Pix::new(640, 480, PixelDepth::Bit8).unwrap();
/// assert_eq!(pix.width(), 640);
/// assert_eq!(pix.height(), 480);
/// ```
#[derive(Debug, Clone)]
pub struct Pix {
    inner: Arc<PixData>,
}

impl Pix {
    /// Create a new PIX with the specified dimensions and depth.
    ///
    /// The image data is initialized to zero.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] if width or height is 0.
    pub fn new(width: u32, height: u32, depth: PixelDepth) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }
        Ok(Pix {
            inner: Arc::new(PixData::zeroed(width, height, depth)),
        })
    }

    /// Get the image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.inner.width
    }

    /// Get the image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.inner.height
    }

    /// Get the image dimensions as (width, height).
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.inner.width, self.inner.height)
    }

    /// Get the pixel depth.
    #[inline]
    pub fn depth(&self) -> PixelDepth {
        self.inner.depth
    }

    /// Get the words per line.
    #[inline]
    pub fn wpl(&self) -> u32 {
        self.inner.wpl
    }

    /// Get raw access to the image data.
    #[inline]
    pub fn data(&self) -> &[u32] {
        &self.inner.data
    }

    /// Get the number of strong references to this PIX.
    #[inline]
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Get the words of a specific row.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row_data(&self, y: u32) -> &[u32] {
        assert!(y < self.inner.height, "row {y} out of range");
        &self.inner.data[self.inner.row_range(y)]
    }

    /// Create a zeroed PIX with the same dimensions and depth.
    pub fn create_template(&self) -> Self {
        Pix {
            inner: Arc::new(PixData::zeroed(
                self.inner.width,
                self.inner.height,
                self.inner.depth,
            )),
        }
    }

    /// Check if two PIX have the same width, height, and depth.
    pub fn sizes_equal(&self, other: &Pix) -> bool {
        self.inner.width == other.inner.width
            && self.inner.height == other.inner.height
            && self.inner.depth == other.inner.depth
    }

    /// Create a deep copy of this PIX.
    ///
    /// Unlike `clone()` which shares data via Arc, this creates
    /// a completely independent copy.
    pub fn deep_clone(&self) -> Self {
        Pix {
            inner: Arc::new(self.inner.duplicate()),
        }
    }

    /// Try to get mutable access to the image data.
    ///
    /// Succeeds only if there is exactly one reference to the data.
    pub fn try_into_mut(self) -> std::result::Result<PixMut, Self> {
        match Arc::try_unwrap(self.inner) {
            Ok(data) => Ok(PixMut { inner: data }),
            Err(arc) => Err(Pix { inner: arc }),
        }
    }

    /// Create a mutable copy of this PIX.
    ///
    /// Always creates a new copy that can be modified.
    pub fn to_mut(&self) -> PixMut {
        PixMut {
            inner: self.inner.duplicate(),
        }
    }
}

/// Mutable PIX
///
/// Allows modification of image data. Convert back to an immutable
/// [`Pix`] using `Into<Pix>`.
#[derive(Debug)]
pub struct PixMut {
    inner: PixData,
}

impl PixMut {
    /// Create a new zeroed mutable PIX.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] if width or height is 0.
    pub fn new(width: u32, height: u32, depth: PixelDepth) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }
        Ok(PixMut {
            inner: PixData::zeroed(width, height, depth),
        })
    }

    /// Get the image width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.inner.width
    }

    /// Get the image height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.inner.height
    }

    /// Get the pixel depth.
    #[inline]
    pub fn depth(&self) -> PixelDepth {
        self.inner.depth
    }

    /// Get words per line.
    #[inline]
    pub fn wpl(&self) -> u32 {
        self.inner.wpl
    }

    /// Get raw access to the image data.
    #[inline]
    pub fn data(&self) -> &[u32] {
        &self.inner.data
    }

    /// Get mutable access to the image data.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [u32] {
        &mut self.inner.data
    }

    /// Get the words of a specific row.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row_data(&self, y: u32) -> &[u32] {
        assert!(y < self.inner.height, "row {y} out of range");
        &self.inner.data[self.inner.row_range(y)]
    }

    /// Get mutable access to a specific row.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row_data_mut(&mut self, y: u32) -> &mut [u32] {
        assert!(y < self.inner.height, "row {y} out of range");
        let range = self.inner.row_range(y);
        &mut self.inner.data[range]
    }

    /// Clear all pixels to zero.
    pub fn clear(&mut self) {
        self.inner.data.fill(0);
    }

    /// Set every pixel to its maximum value.
    ///
    /// Pad bits at the end of 1 bpp and 8 bpp rows are left clear.
    pub fn set_all(&mut self) {
        let max = self.inner.depth.max_value();
        for y in 0..self.inner.height {
            for x in 0..self.inner.width {
                self.set_pixel_unchecked(x, y, max);
            }
        }
    }
}

impl From<PixMut> for Pix {
    fn from(pix_mut: PixMut) -> Self {
        Pix {
            inner: Arc::new(pix_mut.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_depth() {
        assert_eq!(PixelDepth::from_bits(1).unwrap(), PixelDepth::Bit1);
        assert_eq!(PixelDepth::from_bits(8).unwrap(), PixelDepth::Bit8);
        assert_eq!(PixelDepth::from_bits(32).unwrap(), PixelDepth::Bit32);
        assert!(PixelDepth::from_bits(4).is_err());
        assert!(PixelDepth::from_bits(16).is_err());

        assert_eq!(PixelDepth::Bit8.bits(), 8);
        assert_eq!(PixelDepth::Bit8.max_value(), 255);
        assert_eq!(PixelDepth::Bit1.max_value(), 1);
    }

    #[test]
    fn test_pix_creation() {
        let pix = Pix::new(100, 200, PixelDepth::Bit8).unwrap();
        assert_eq!(pix.dimensions(), (100, 200));
        assert_eq!(pix.depth(), PixelDepth::Bit8);
        // 100 * 8 = 800 bits = 25 words
        assert_eq!(pix.wpl(), 25);
        assert_eq!(pix.data().len(), 25 * 200);
    }

    #[test]
    fn test_pix_creation_invalid() {
        assert!(Pix::new(0, 100, PixelDepth::Bit8).is_err());
        assert!(Pix::new(100, 0, PixelDepth::Bit1).is_err());
    }

    #[test]
    fn test_wpl_calculation() {
        assert_eq!(Pix::new(32, 1, PixelDepth::Bit1).unwrap().wpl(), 1);
        assert_eq!(Pix::new(33, 1, PixelDepth::Bit1).unwrap().wpl(), 2);
        assert_eq!(Pix::new(10, 1, PixelDepth::Bit32).unwrap().wpl(), 10);
    }

    #[test]
    fn test_pix_clone_shares_data() {
        let pix1 = Pix::new(100, 100, PixelDepth::Bit8).unwrap();
        let pix2 = pix1.clone();
        assert_eq!(pix1.ref_count(), 2);
        assert_eq!(pix1.data().as_ptr(), pix2.data().as_ptr());

        let pix3 = pix1.deep_clone();
        assert_eq!(pix3.ref_count(), 1);
        assert_ne!(pix1.data().as_ptr(), pix3.data().as_ptr());
    }

    #[test]
    fn test_try_into_mut_requires_unique() {
        let pix1 = Pix::new(10, 10, PixelDepth::Bit1).unwrap();
        let pix2 = pix1.clone();
        let pix1 = pix1.try_into_mut().unwrap_err();
        drop(pix2);
        assert!(pix1.try_into_mut().is_ok());
    }

    #[test]
    fn test_set_all_leaves_pad_bits_clear() {
        let mut pm = PixMut::new(33, 2, PixelDepth::Bit1).unwrap();
        pm.set_all();
        assert_eq!(pm.row_data(0)[0], u32::MAX);
        assert_eq!(pm.row_data(0)[1], 0x8000_0000);
    }
}
