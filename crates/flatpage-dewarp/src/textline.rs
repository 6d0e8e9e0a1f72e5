//! Text line detection for dewarping
//!
//! Finds the vertical centers of text lines in a binary page. The page is
//! filtered so that each line's x-height body becomes one solid component,
//! then the mean row of each component column gives one center point.

use crate::error::{DewarpError, DewarpResult};
use crate::types::TextLine;
use flatpage_core::{Pix, PixelDepth};
use flatpage_morph::{MorphSequence, erode_brick};
use flatpage_region::{ConnectedComponent, ConnectivityType, find_connected_components, seedfill_binary};
use serde::{Deserialize, Serialize};

/// Options for text line extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextlineOptions {
    /// Components narrower than this are discarded (default: 100)
    pub min_width: u32,
    /// Components shorter than this are discarded (default: 4)
    pub min_height: u32,
    /// Height of the vertical brick whose erosion seeds tall-component
    /// removal (default: 50)
    pub tall_seed_height: u32,
}

impl Default for TextlineOptions {
    fn default() -> Self {
        Self {
            min_width: 100,
            min_height: 4,
            tall_seed_height: 50,
        }
    }
}

impl TextlineOptions {
    /// Create new options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum component width
    pub fn with_min_width(mut self, min_width: u32) -> Self {
        self.min_width = min_width;
        self
    }

    /// Set the minimum component height
    pub fn with_min_height(mut self, min_height: u32) -> Self {
        self.min_height = min_height;
        self
    }

    /// Set the tall-component seed height; 0 disables the removal
    pub fn with_tall_seed_height(mut self, height: u32) -> Self {
        self.tall_seed_height = height;
        self
    }
}

/// Filter sequence that turns text lines into solid horizontal bands.
///
/// `c1 = max(15, w/80)` bridges the gaps between characters and
/// `c2 = max(40, w/30)` the gaps between words.
pub fn textline_sequence(width: u32) -> DewarpResult<MorphSequence> {
    let c1 = (width / 80).max(15);
    let c2 = (width / 30).max(40);
    Ok(MorphSequence::parse(&format!(
        "o1.3 + c{c1}.1 + o{c1}.1 + c{c2}.1"
    ))?)
}

/// Find the centers of text lines in a binary image with default options
///
/// # Errors
///
/// Returns [`DewarpError::UnsupportedDepth`] if `pix` is not 1 bpp.
pub fn find_textline_centers(pix: &Pix) -> DewarpResult<Vec<TextLine>> {
    find_textline_centers_with(pix, &TextlineOptions::default())
}

/// Find the centers of text lines in a binary image
///
/// Returns one [`TextLine`] per surviving component, in raster order of the
/// components. A page without text yields an empty vector.
///
/// # Errors
///
/// Returns [`DewarpError::UnsupportedDepth`] if `pix` is not 1 bpp.
pub fn find_textline_centers_with(
    pix: &Pix,
    options: &TextlineOptions,
) -> DewarpResult<Vec<TextLine>> {
    if pix.depth() != PixelDepth::Bit1 {
        return Err(DewarpError::UnsupportedDepth {
            expected: "1 bpp",
            actual: pix.depth().bits(),
        });
    }

    let filtered = textline_sequence(pix.width())?.apply(pix)?;
    let filtered = remove_tall_components(&filtered, options.tall_seed_height)?;

    let components = find_connected_components(&filtered, ConnectivityType::EightWay)?;
    let ncomp = components.len();
    let lines: Vec<TextLine> = components
        .iter()
        .filter(|cc| {
            cc.bounds.w >= options.min_width as i32 && cc.bounds.h >= options.min_height as i32
        })
        .map(column_centers)
        .filter(|line| !line.is_empty())
        .collect();

    tracing::debug!(
        components = ncomp,
        lines = lines.len(),
        "text line extraction"
    );
    Ok(lines)
}

/// Remove components that hold a vertical run of at least `seed_height`.
///
/// Such components are figures or rules rather than text.
fn remove_tall_components(pix: &Pix, seed_height: u32) -> DewarpResult<Pix> {
    if seed_height <= 1 {
        return Ok(pix.clone());
    }
    let seed = erode_brick(pix, 1, seed_height)?;
    if seed.count_pixels()? == 0 {
        return Ok(pix.clone());
    }
    let tall = seedfill_binary(&seed, pix, ConnectivityType::EightWay)?;
    Ok(pix.xor(&tall)?)
}

/// Mean row of the component's own pixels in each column it spans.
fn column_centers(cc: &ConnectedComponent) -> TextLine {
    let mask = &cc.mask;
    let (bx, by) = (cc.bounds.x as f32, cc.bounds.y as f32);
    let mut points = flatpage_core::Pta::with_capacity(mask.width() as usize);

    for x in 0..mask.width() {
        let mut sum_y = 0u64;
        let mut count = 0u64;
        for y in 0..mask.height() {
            if mask.get_pixel_unchecked(x, y) != 0 {
                sum_y += u64::from(y);
                count += 1;
            }
        }
        if count > 0 {
            points.push(bx + x as f32, by + sum_y as f32 / count as f32);
        }
    }
    TextLine::new(points)
}

/// Keep the lines whose extent is at least `fraction` of the longest
///
/// The result is ordered by decreasing extent; lines of equal extent keep
/// their input order.
pub fn remove_short_lines(lines: Vec<TextLine>, fraction: f32) -> Vec<TextLine> {
    let mut lines = lines;
    lines.sort_by(|a, b| b.extent().total_cmp(&a.extent()));
    let Some(longest) = lines.first().map(TextLine::extent) else {
        return lines;
    };
    let min_extent = fraction * longest;
    lines.retain(|line| line.extent() >= min_extent);
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use flatpage_core::{PixMut, Pta};

    fn create_test_line(y: f32, x_start: f32, x_end: f32) -> TextLine {
        let mut pta = Pta::new();
        let mut x = x_start;
        while x <= x_end {
            pta.push(x, y);
            x += 10.0;
        }
        TextLine::new(pta)
    }

    #[test]
    fn test_remove_short_lines() {
        let lines = vec![
            create_test_line(100.0, 0.0, 500.0),
            create_test_line(200.0, 0.0, 1000.0),
            create_test_line(300.0, 0.0, 850.0),
            create_test_line(400.0, 100.0, 900.0),
        ];
        let result = remove_short_lines(lines, 0.8);
        // extents 501, 1001, 851, 801; the cutoff is 800.8
        assert_eq!(result.len(), 3);
        assert_eq!(result[0].extent(), 1001.0);
        assert_eq!(result[1].extent(), 851.0);
        assert_eq!(result[2].extent(), 801.0);
    }

    #[test]
    fn test_remove_short_lines_ties_keep_order() {
        let lines = vec![
            create_test_line(100.0, 0.0, 500.0),
            create_test_line(50.0, 0.0, 500.0),
        ];
        let result = remove_short_lines(lines, 0.8);
        assert_eq!(result[0].points().get_y(0), Some(100.0));
        assert_eq!(result[1].points().get_y(0), Some(50.0));
    }

    #[test]
    fn test_remove_short_lines_empty() {
        assert!(remove_short_lines(Vec::new(), 0.8).is_empty());
    }

    #[test]
    fn test_textline_sequence_sizes() {
        assert_eq!(
            textline_sequence(1000).unwrap().to_string(),
            "o1.3 + c15.1 + o15.1 + c40.1"
        );
        assert_eq!(
            textline_sequence(2400).unwrap().to_string(),
            "o1.3 + c30.1 + o30.1 + c80.1"
        );
    }

    #[test]
    fn test_find_textline_centers_band() {
        let mut pm = PixMut::new(300, 60, PixelDepth::Bit1).unwrap();
        for y in 20..30 {
            for x in 50..250 {
                pm.set_pixel(x, y, 1).unwrap();
            }
        }
        let lines = find_textline_centers(&pm.into()).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), 200);
        assert_eq!(lines[0].points().get(0), Some((50.0, 24.5)));
    }

    #[test]
    fn test_find_textline_centers_empty_and_depth() {
        let pix = Pix::new(200, 100, PixelDepth::Bit1).unwrap();
        assert!(find_textline_centers(&pix).unwrap().is_empty());
        let gray = Pix::new(200, 100, PixelDepth::Bit8).unwrap();
        assert!(matches!(
            find_textline_centers(&gray),
            Err(DewarpError::UnsupportedDepth { .. })
        ));
    }
}
