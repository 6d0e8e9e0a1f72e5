//! Whole-image operations on binary masks

use super::{Pix, PixelDepth};
use crate::error::{Error, Result};

impl Pix {
    /// Pixelwise XOR of two 1 bpp images of the same size.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedDepth`] for non-binary input and
    /// [`Error::DimensionMismatch`] if the sizes differ.
    pub fn xor(&self, other: &Pix) -> Result<Pix> {
        if self.depth() != PixelDepth::Bit1 {
            return Err(Error::UnsupportedDepth(self.depth().bits()));
        }
        if !self.sizes_equal(other) {
            return Err(Error::DimensionMismatch {
                expected: self.dimensions(),
                actual: other.dimensions(),
            });
        }
        let mut out = self.to_mut();
        for (d, s) in out.data_mut().iter_mut().zip(other.data()) {
            *d ^= *s;
        }
        Ok(out.into())
    }

    /// Count the ON pixels of a 1 bpp image.
    ///
    /// Pad bits are never set by the accessors, so whole words are counted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedDepth`] for non-binary input.
    pub fn count_pixels(&self) -> Result<u64> {
        if self.depth() != PixelDepth::Bit1 {
            return Err(Error::UnsupportedDepth(self.depth().bits()));
        }
        Ok(self.data().iter().map(|w| u64::from(w.count_ones())).sum())
    }

    /// Check whether two images have identical size, depth and pixels.
    pub fn equals(&self, other: &Pix) -> bool {
        if !self.sizes_equal(other) {
            return false;
        }
        (0..self.height()).all(|y| {
            (0..self.width()).all(|x| self.get_pixel_unchecked(x, y) == other.get_pixel_unchecked(x, y))
        })
    }
}
