//! Pixel access functions
//!
//! Low-level functions for getting and setting individual pixels.
//!
//! # Pixel packing
//!
//! Pixels are packed MSB-to-LSB within each 32-bit word. For example,
//! in a 1-bit image, pixel 0 occupies bit 31 (MSB) of the first word.

use super::{Pix, PixMut, PixelDepth};
use crate::error::{Error, Result};

#[inline]
fn read_from_line(line: &[u32], depth: PixelDepth, x: u32) -> u32 {
    match depth {
        PixelDepth::Bit1 => get_data_bit(line, x),
        PixelDepth::Bit8 => get_data_byte(line, x),
        PixelDepth::Bit32 => line[x as usize],
    }
}

#[inline]
fn write_to_line(line: &mut [u32], depth: PixelDepth, x: u32, val: u32) {
    match depth {
        PixelDepth::Bit1 => set_data_bit(line, x, val),
        PixelDepth::Bit8 => set_data_byte(line, x, val),
        PixelDepth::Bit32 => line[x as usize] = val,
    }
}

impl Pix {
    /// Get a pixel value at (x, y).
    ///
    /// Returns `None` if coordinates are out of bounds.
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        Some(self.get_pixel_unchecked(x, y))
    }

    /// Get a pixel value without a coordinate check.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height` or `x` lies past the row's words.
    #[inline]
    pub fn get_pixel_unchecked(&self, x: u32, y: u32) -> u32 {
        read_from_line(self.row_data(y), self.depth(), x)
    }
}

impl PixMut {
    /// Get a pixel value at (x, y).
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        Some(self.get_pixel_unchecked(x, y))
    }

    /// Get a pixel value without a coordinate check.
    #[inline]
    pub fn get_pixel_unchecked(&self, x: u32, y: u32) -> u32 {
        read_from_line(self.row_data(y), self.depth(), x)
    }

    /// Set a pixel value at (x, y).
    ///
    /// The value is masked to the pixel depth.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] if coordinates are out of bounds.
    pub fn set_pixel(&mut self, x: u32, y: u32, val: u32) -> Result<()> {
        if x >= self.width() || y >= self.height() {
            return Err(Error::IndexOutOfBounds {
                index: (y as usize) * (self.width() as usize) + (x as usize),
                len: (self.width() as usize) * (self.height() as usize),
            });
        }
        self.set_pixel_unchecked(x, y, val);
        Ok(())
    }

    /// Set a pixel value without a coordinate check.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height` or `x` lies past the row's words.
    #[inline]
    pub fn set_pixel_unchecked(&mut self, x: u32, y: u32, val: u32) {
        let depth = self.depth();
        write_to_line(self.row_data_mut(y), depth, x, val);
    }
}

/// Get a 1-bit pixel value.
#[inline]
pub fn get_data_bit(line: &[u32], x: u32) -> u32 {
    (line[(x >> 5) as usize] >> (31 - (x & 31))) & 1
}

/// Set a 1-bit pixel value (any nonzero `val` sets the bit).
#[inline]
pub fn set_data_bit(line: &mut [u32], x: u32, val: u32) {
    let mask = 0x8000_0000u32 >> (x & 31);
    let word = &mut line[(x >> 5) as usize];
    if val != 0 {
        *word |= mask;
    } else {
        *word &= !mask;
    }
}

/// Get an 8-bit pixel value.
#[inline]
pub fn get_data_byte(line: &[u32], x: u32) -> u32 {
    let shift = 24 - 8 * (x & 3);
    (line[(x >> 2) as usize] >> shift) & 0xff
}

/// Set an 8-bit pixel value.
#[inline]
pub fn set_data_byte(line: &mut [u32], x: u32, val: u32) {
    let shift = 24 - 8 * (x & 3);
    let word = &mut line[(x >> 2) as usize];
    *word = (*word & !(0xff << shift)) | ((val & 0xff) << shift);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_packing_is_msb_first() {
        let mut line = [0u32; 2];
        set_data_bit(&mut line, 0, 1);
        set_data_bit(&mut line, 33, 1);
        assert_eq!(line[0], 0x8000_0000);
        assert_eq!(line[1], 0x4000_0000);
        assert_eq!(get_data_bit(&line, 33), 1);
        set_data_bit(&mut line, 0, 0);
        assert_eq!(line[0], 0);
    }

    #[test]
    fn test_byte_packing() {
        let mut line = [0u32; 1];
        set_data_byte(&mut line, 0, 0x12);
        set_data_byte(&mut line, 3, 0x1ff);
        assert_eq!(line[0], 0x1200_00ff);
        assert_eq!(get_data_byte(&line, 0), 0x12);
        assert_eq!(get_data_byte(&line, 3), 0xff);
    }

    #[test]
    fn test_get_set_all_depths() {
        for depth in [PixelDepth::Bit1, PixelDepth::Bit8, PixelDepth::Bit32] {
            let mut pm = PixMut::new(37, 5, depth).unwrap();
            let val = depth.max_value();
            pm.set_pixel(36, 4, val).unwrap();
            assert_eq!(pm.get_pixel(36, 4), Some(val));
            assert_eq!(pm.get_pixel(35, 4), Some(0));
            let pix: Pix = pm.into();
            assert_eq!(pix.get_pixel(36, 4), Some(val));
            assert_eq!(pix.get_pixel(37, 4), None);
        }
    }

    #[test]
    fn test_set_pixel_out_of_bounds() {
        let mut pm = PixMut::new(10, 10, PixelDepth::Bit8).unwrap();
        assert!(pm.set_pixel(10, 0, 1).is_err());
        assert!(pm.set_pixel(0, 10, 1).is_err());
    }
}
