//! Synthetic page generator
//!
//! Renders binary pages of "text" made of short filled character blocks
//! laid along parabolic baselines. The sag of each line interpolates
//! between the top and bottom of the page, which is the shape a bound book
//! page takes under a flatbed or camera. Because the geometry is known in
//! closed form, tests can check recovered line centers and disparities
//! against it.

use crate::error::{TestError, TestResult};
use flatpage_core::{Box, Pix, PixMut, PixelDepth};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seeded speckle noise added on top of the text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Speckle {
    /// RNG seed
    pub seed: u64,
    /// Number of isolated foreground pixels
    pub count: u32,
}

/// Description of a synthetic curved-text page
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticPage {
    /// Page width in pixels
    pub width: u32,
    /// Page height in pixels
    pub height: u32,
    /// Number of text lines
    pub lines: u32,
    /// Baseline of the first line at the page edges
    pub top: u32,
    /// Distance between consecutive lines
    pub spacing: u32,
    /// Left and right text margin
    pub margin: u32,
    /// Thickness of each text band
    pub x_height: u32,
    /// Downward sag at the page center for the first line
    pub sag_top: f32,
    /// Downward sag at the page center for the last line
    pub sag_bottom: f32,
    /// Indices of lines drawn at 30% of the full text width
    pub short_lines: Vec<u32>,
    /// Filled blocks standing in for figures or rules
    pub figures: Vec<Box>,
    /// Optional speckle noise
    pub speckle: Option<Speckle>,
}

impl Default for SyntheticPage {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 1300,
            lines: 20,
            top: 100,
            spacing: 50,
            margin: 80,
            x_height: 16,
            sag_top: 10.0,
            sag_bottom: 25.0,
            short_lines: Vec::new(),
            figures: Vec::new(),
            speckle: None,
        }
    }
}

const CHAR_WIDTH: u32 = 8;
const CHAR_GAP: u32 = 3;
const WORD_GAP: u32 = 12;

impl SyntheticPage {
    /// Create the default page description
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page size
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the number of lines
    pub fn with_lines(mut self, lines: u32) -> Self {
        self.lines = lines;
        self
    }

    /// Set the sag of the first and last lines
    pub fn with_sag(mut self, sag_top: f32, sag_bottom: f32) -> Self {
        self.sag_top = sag_top;
        self.sag_bottom = sag_bottom;
        self
    }

    /// Draw the given lines short
    pub fn with_short_lines(mut self, short: &[u32]) -> Self {
        self.short_lines = short.to_vec();
        self
    }

    /// Add a filled block
    pub fn with_figure(mut self, figure: Box) -> Self {
        self.figures.push(figure);
        self
    }

    /// Add seeded speckle noise
    pub fn with_speckle(mut self, seed: u64, count: u32) -> Self {
        self.speckle = Some(Speckle { seed, count });
        self
    }

    /// The same page with all lines straight
    pub fn flattened(&self) -> Self {
        Self {
            sag_top: 0.0,
            sag_bottom: 0.0,
            ..self.clone()
        }
    }

    /// Sag at the page center for line `i`
    pub fn sag(&self, i: u32) -> f32 {
        if self.lines <= 1 {
            return self.sag_top;
        }
        let t = i as f32 / (self.lines - 1) as f32;
        self.sag_top + t * (self.sag_bottom - self.sag_top)
    }

    /// Vertical position of the center of line `i` at column `x`
    pub fn line_center(&self, i: u32, x: f32) -> f32 {
        let half = self.width as f32 / 2.0;
        let t = (x - half) / half;
        (self.top + i * self.spacing) as f32 + self.sag(i) * (1.0 - t * t)
    }

    /// Horizontal range `[x0, x1)` covered by line `i`
    pub fn line_span(&self, i: u32) -> (u32, u32) {
        let x0 = self.margin;
        let full = self.width.saturating_sub(2 * self.margin);
        let len = if self.short_lines.contains(&i) {
            full * 3 / 10
        } else {
            full
        };
        (x0, x0 + len)
    }

    fn validate(&self) -> TestResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(TestError::InvalidPage(format!(
                "empty page {}x{}",
                self.width, self.height
            )));
        }
        if 2 * self.margin >= self.width {
            return Err(TestError::InvalidPage(format!(
                "margin {} leaves no text width",
                self.margin
            )));
        }
        if self.lines > 0 {
            let max_sag = self.sag_top.max(self.sag_bottom).max(0.0);
            let last = self.top + (self.lines - 1) * self.spacing;
            let bottom = last as f32 + max_sag + self.x_height as f32;
            if bottom >= self.height as f32 {
                return Err(TestError::InvalidPage(format!(
                    "{} lines reach row {} on a page of height {}",
                    self.lines, bottom, self.height
                )));
            }
        }
        Ok(())
    }

    /// Render the page as a 1 bpp image (foreground = 1)
    ///
    /// # Errors
    ///
    /// Returns [`TestError::InvalidPage`] if the text does not fit the page.
    pub fn render_binary(&self) -> TestResult<Pix> {
        self.validate()?;
        let mut pm = PixMut::new(self.width, self.height, PixelDepth::Bit1)?;
        let half_band = self.x_height as f32 / 2.0;

        for i in 0..self.lines {
            let (x0, x1) = self.line_span(i);
            let mut x = x0;
            let mut word = 0u32;
            while x < x1 {
                let nchars = 3 + (word * 7 + i * 3) % 5;
                for _ in 0..nchars {
                    let cx1 = (x + CHAR_WIDTH).min(x1);
                    for cx in x..cx1 {
                        let yc = self.line_center(i, cx as f32);
                        let ytop = (yc - half_band).round().max(0.0) as u32;
                        let ybot = (ytop + self.x_height).min(self.height);
                        for y in ytop..ybot {
                            pm.set_pixel_unchecked(cx, y, 1);
                        }
                    }
                    x += CHAR_WIDTH + CHAR_GAP;
                    if x >= x1 {
                        break;
                    }
                }
                x += WORD_GAP - CHAR_GAP;
                word += 1;
            }
        }

        for fig in &self.figures {
            let xs = fig.x.max(0) as u32..(fig.right().max(0) as u32).min(self.width);
            let ys = fig.y.max(0) as u32..(fig.bottom().max(0) as u32).min(self.height);
            for y in ys {
                for x in xs.clone() {
                    pm.set_pixel_unchecked(x, y, 1);
                }
            }
        }

        if let Some(speckle) = self.speckle {
            let mut rng = StdRng::seed_from_u64(speckle.seed);
            for _ in 0..speckle.count {
                let x = rng.gen_range(0..self.width);
                let y = rng.gen_range(0..self.height);
                pm.set_pixel_unchecked(x, y, 1);
            }
        }

        Ok(pm.into())
    }

    /// Render the page as 8 bpp gray: text 0, background 255
    pub fn render_gray(&self) -> TestResult<Pix> {
        binary_to_gray(&self.render_binary()?)
    }

    /// Render the page as 32 bpp RGBA: black text on white
    pub fn render_rgb(&self) -> TestResult<Pix> {
        let pixs = self.render_binary()?;
        let mut pm = PixMut::new(pixs.width(), pixs.height(), PixelDepth::Bit32)?;
        for y in 0..pixs.height() {
            for x in 0..pixs.width() {
                let val = if pixs.get_pixel_unchecked(x, y) != 0 {
                    0x0000_00ff
                } else {
                    0xffff_ffff
                };
                pm.set_pixel_unchecked(x, y, val);
            }
        }
        Ok(pm.into())
    }
}

/// Convert a binary image to 8 bpp with foreground 0 and background 255
///
/// # Errors
///
/// Returns an error if `pixs` is not 1 bpp.
pub fn binary_to_gray(pixs: &Pix) -> TestResult<Pix> {
    if pixs.depth() != PixelDepth::Bit1 {
        return Err(flatpage_core::Error::UnsupportedDepth(pixs.depth().bits()).into());
    }
    let mut pm = PixMut::new(pixs.width(), pixs.height(), PixelDepth::Bit8)?;
    for y in 0..pixs.height() {
        for x in 0..pixs.width() {
            let val = if pixs.get_pixel_unchecked(x, y) != 0 { 0 } else { 255 };
            pm.set_pixel_unchecked(x, y, val);
        }
    }
    Ok(pm.into())
}

/// Convert 8 bpp gray to binary by thresholding: values below `thresh` are foreground
pub fn gray_to_binary(pixs: &Pix, thresh: u32) -> TestResult<Pix> {
    if pixs.depth() != PixelDepth::Bit8 {
        return Err(flatpage_core::Error::UnsupportedDepth(pixs.depth().bits()).into());
    }
    let mut pm = PixMut::new(pixs.width(), pixs.height(), PixelDepth::Bit1)?;
    for y in 0..pixs.height() {
        for x in 0..pixs.width() {
            if pixs.get_pixel_unchecked(x, y) < thresh {
                pm.set_pixel_unchecked(x, y, 1);
            }
        }
    }
    Ok(pm.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_center_is_parabolic() {
        let page = SyntheticPage::new().with_sag(20.0, 20.0);
        let edge = page.line_center(0, 0.0);
        let mid = page.line_center(0, 500.0);
        assert_eq!(edge, 100.0);
        assert_eq!(mid, 120.0);
        assert!((page.line_center(0, 1000.0) - edge).abs() < 1e-4);
    }

    #[test]
    fn test_render_binary_places_text() {
        let page = SyntheticPage::new().with_lines(3);
        let pix = page.render_binary().unwrap();
        assert_eq!(pix.depth(), PixelDepth::Bit1);
        // first character of line 0 at the margin
        let yc = page.line_center(0, 80.0).round() as u32;
        assert_eq!(pix.get_pixel(80, yc), Some(1));
        assert_eq!(pix.get_pixel(10, yc), Some(0));
        assert!(pix.count_pixels().unwrap() > 0);
    }

    #[test]
    fn test_render_rejects_overflow() {
        let page = SyntheticPage::new().with_lines(40);
        assert!(page.render_binary().is_err());
    }

    #[test]
    fn test_speckle_is_reproducible() {
        let page = SyntheticPage::new().with_lines(0).with_speckle(7, 50);
        let a = page.render_binary().unwrap();
        let b = page.render_binary().unwrap();
        assert!(a.equals(&b));
        let n = a.count_pixels().unwrap();
        assert!(n > 0 && n <= 50);
    }

    #[test]
    fn test_gray_round_trip() {
        let pix = SyntheticPage::new().with_lines(2).render_binary().unwrap();
        let gray = binary_to_gray(&pix).unwrap();
        let back = gray_to_binary(&gray, 128).unwrap();
        assert!(pix.equals(&back));
    }
}
