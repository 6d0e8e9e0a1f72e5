//! Dewarp type definitions
//!
//! This module defines the options, the per-page model and the text line
//! polyline shared by the builder, the applier and the page collection.

use crate::textline::TextlineOptions;
use flatpage_core::{FPix, Pix, Pta};
use serde::{Deserialize, Serialize};

/// Options for building a page model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DewarpOptions {
    /// Sampling interval of the coarse disparity grids (default: 30)
    ///
    /// Minimum allowed is 5.
    pub sampling: u32,

    /// Minimum number of text lines required to build a model (default: 15)
    ///
    /// Minimum allowed is 4.
    pub min_lines: u32,

    /// Estimate horizontal disparity after the vertical model (default: true)
    pub build_horizontal: bool,

    /// Lines shorter than this fraction of the longest are dropped (default: 0.8)
    pub line_fraction: f32,

    /// Gain applied to the top-to-bottom vertical disparity slope when
    /// estimating horizontal disparity (default: 2000)
    pub h_slope_factor: f32,

    /// Text line extraction options
    pub textline: TextlineOptions,
}

impl Default for DewarpOptions {
    fn default() -> Self {
        Self {
            sampling: 30,
            min_lines: 15,
            build_horizontal: true,
            line_fraction: 0.8,
            h_slope_factor: 2000.0,
            textline: TextlineOptions::default(),
        }
    }
}

impl DewarpOptions {
    /// Create new options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sampling interval
    pub fn with_sampling(mut self, sampling: u32) -> Self {
        self.sampling = sampling.max(5);
        self
    }

    /// Set the minimum number of lines
    pub fn with_min_lines(mut self, min_lines: u32) -> Self {
        self.min_lines = min_lines.max(4);
        self
    }

    /// Set whether horizontal disparity is estimated
    pub fn with_build_horizontal(mut self, build_horizontal: bool) -> Self {
        self.build_horizontal = build_horizontal;
        self
    }

    /// Set the short line fraction, clamped to `[0, 1]`
    pub fn with_line_fraction(mut self, fraction: f32) -> Self {
        self.line_fraction = fraction.clamp(0.0, 1.0);
        self
    }

    /// Set the horizontal slope gain
    pub fn with_h_slope_factor(mut self, factor: f32) -> Self {
        self.h_slope_factor = factor;
        self
    }

    /// Set the text line extraction options
    pub fn with_textline(mut self, textline: TextlineOptions) -> Self {
        self.textline = textline;
        self
    }

    /// Copy with out-of-range values pulled back to their limits
    ///
    /// Options loaded through serde bypass the builders.
    pub fn clamped(&self) -> Self {
        self.clone()
            .with_sampling(self.sampling)
            .with_min_lines(self.min_lines)
            .with_line_fraction(self.line_fraction)
    }
}

/// Processing state of a page in a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PageState {
    /// No model is available for the page, own or borrowed
    Unbuilt,
    /// A vertical model is available; horizontal correction will not run
    VerticalReady,
    /// Vertical and horizontal models are available
    FullyReady,
    /// A model has been applied to the page
    Applied,
}

/// Dewarp data for a single page
///
/// Holds the disparity fields and the statistics used to judge them.
#[derive(Debug, Clone)]
pub struct Dewarp {
    /// Page number (0-indexed)
    pub(crate) page_number: usize,
    /// Image width the model was built for
    pub(crate) width: u32,
    /// Image height the model was built for
    pub(crate) height: u32,
    /// Sampled grid width
    pub(crate) nx: u32,
    /// Sampled grid height
    pub(crate) ny: u32,
    pub(crate) sampling: u32,
    pub(crate) min_lines: u32,
    pub(crate) h_slope_factor: f32,
    /// Number of text lines that contributed to the vertical model
    pub(crate) n_lines: u32,

    pub(crate) sampled_v_disparity: Option<FPix>,
    pub(crate) sampled_h_disparity: Option<FPix>,
    pub(crate) full_v_disparity: Option<FPix>,
    pub(crate) full_h_disparity: Option<FPix>,
    /// Columns added on the right by horizontal correction
    pub(crate) extra_width: u32,

    /// Line curvature range (micro-units)
    pub(crate) min_curvature: i32,
    pub(crate) max_curvature: i32,
    /// Margin slopes (milli-units)
    pub(crate) left_slope: i32,
    pub(crate) right_slope: i32,
    /// Margin curvatures (micro-units)
    pub(crate) left_curvature: i32,
    pub(crate) right_curvature: i32,

    pub(crate) v_success: bool,
    pub(crate) h_success: bool,
    pub(crate) v_valid: bool,
    pub(crate) h_valid: bool,
}

impl Dewarp {
    /// Create an empty model for a `width x height` page
    ///
    /// The sampled grid is `ceil(width / s) + 1` by `ceil(height / s) + 1`
    /// for sampling interval `s`, so its full-resolution expansion always
    /// covers the page.
    pub fn new(width: u32, height: u32, page_number: usize, options: &DewarpOptions) -> Self {
        let sampling = options.sampling.max(5);
        Self {
            page_number,
            width,
            height,
            nx: width.div_ceil(sampling) + 1,
            ny: height.div_ceil(sampling) + 1,
            sampling,
            min_lines: options.min_lines.max(4),
            h_slope_factor: options.h_slope_factor,
            n_lines: 0,
            sampled_v_disparity: None,
            sampled_h_disparity: None,
            full_v_disparity: None,
            full_h_disparity: None,
            extra_width: 0,
            min_curvature: 0,
            max_curvature: 0,
            left_slope: 0,
            right_slope: 0,
            left_curvature: 0,
            right_curvature: 0,
            v_success: false,
            h_success: false,
            v_valid: false,
            h_valid: false,
        }
    }

    /// Get the page number
    pub fn page_number(&self) -> usize {
        self.page_number
    }

    /// Get the page width the model was built for
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get the page height the model was built for
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get the sampled grid size as `(nx, ny)`
    pub fn grid_size(&self) -> (u32, u32) {
        (self.nx, self.ny)
    }

    /// Get the sampling interval
    pub fn sampling(&self) -> u32 {
        self.sampling
    }

    /// Get the minimum number of lines this model required
    pub fn min_lines(&self) -> u32 {
        self.min_lines
    }

    /// Get the number of text lines used
    pub fn n_lines(&self) -> u32 {
        self.n_lines
    }

    /// Check if the vertical disparity model was built
    pub fn v_success(&self) -> bool {
        self.v_success
    }

    /// Check if the horizontal disparity model was built
    pub fn h_success(&self) -> bool {
        self.h_success
    }

    /// Check if the vertical model passed validation
    pub fn v_valid(&self) -> bool {
        self.v_valid
    }

    /// Check if the horizontal model passed validation
    pub fn h_valid(&self) -> bool {
        self.h_valid
    }

    /// Minimum line curvature in micro-units
    pub fn min_curvature(&self) -> i32 {
        self.min_curvature
    }

    /// Maximum line curvature in micro-units
    pub fn max_curvature(&self) -> i32 {
        self.max_curvature
    }

    /// Left and right margin slopes in milli-units
    pub fn edge_slopes(&self) -> (i32, i32) {
        (self.left_slope, self.right_slope)
    }

    /// Left and right margin curvatures in micro-units
    pub fn edge_curvatures(&self) -> (i32, i32) {
        (self.left_curvature, self.right_curvature)
    }

    /// Columns added on the right when horizontal disparity is applied
    pub fn extra_width(&self) -> u32 {
        self.extra_width
    }

    /// Get the sampled vertical disparity
    pub fn sampled_v_disparity(&self) -> Option<&FPix> {
        self.sampled_v_disparity.as_ref()
    }

    /// Get the sampled horizontal disparity
    pub fn sampled_h_disparity(&self) -> Option<&FPix> {
        self.sampled_h_disparity.as_ref()
    }

    /// Get the full resolution vertical disparity
    pub fn full_v_disparity(&self) -> Option<&FPix> {
        self.full_v_disparity.as_ref()
    }

    /// Get the full resolution horizontal disparity
    pub fn full_h_disparity(&self) -> Option<&FPix> {
        self.full_h_disparity.as_ref()
    }

    /// Drop the full resolution fields
    ///
    /// The sampled fields are kept so the full fields can be regenerated.
    pub fn minimize(&mut self) {
        self.full_v_disparity = None;
        self.full_h_disparity = None;
    }
}

/// Where the model applied to a page came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelSource {
    /// The page's own model
    Own,
    /// The model of another page
    Reference(usize),
    /// No model; the page was passed through unchanged
    None,
}

/// A rendered page
#[derive(Debug, Clone)]
pub struct DewarpedPage {
    /// The output image
    pub pix: Pix,
    /// Which model produced it
    pub source: ModelSource,
    /// Whether vertical correction was applied
    pub v_applied: bool,
    /// Whether horizontal correction was applied
    pub h_applied: bool,
}

impl DewarpedPage {
    /// Check if any correction was applied
    pub fn was_corrected(&self) -> bool {
        self.v_applied || self.h_applied
    }
}

/// Text line representation
///
/// Points along the vertical center of one text line, ordered by x.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    points: Pta,
}

impl TextLine {
    /// Create a text line from its center points
    pub fn new(points: Pta) -> Self {
        Self { points }
    }

    /// Get the center points
    pub fn points(&self) -> &Pta {
        &self.points
    }

    /// Get the number of points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the line has no points
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Horizontal extent, `max_x - min_x + 1`, or 0 for an empty line
    pub fn extent(&self) -> f32 {
        self.points
            .x_range()
            .map_or(0.0, |(lo, hi)| hi - lo + 1.0)
    }

    /// Leftmost and rightmost points
    pub fn endpoints(&self) -> Option<((f32, f32), (f32, f32))> {
        let mut iter = self.points.iter();
        let first = iter.next()?;
        Some(iter.fold((first, first), |(l, r), p| {
            (if p.0 < l.0 { p } else { l }, if p.0 > r.0 { p } else { r })
        }))
    }
}

impl FromIterator<(f32, f32)> for TextLine {
    fn from_iter<I: IntoIterator<Item = (f32, f32)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dewarp_options_default() {
        let opts = DewarpOptions::default();
        assert_eq!(opts.sampling, 30);
        assert_eq!(opts.min_lines, 15);
        assert!(opts.build_horizontal);
        assert_eq!(opts.line_fraction, 0.8);
    }

    #[test]
    fn test_dewarp_options_builder_clamps() {
        let opts = DewarpOptions::new().with_sampling(2).with_min_lines(1);
        assert_eq!(opts.sampling, 5);
        assert_eq!(opts.min_lines, 4);
        let opts = DewarpOptions {
            sampling: 1,
            ..Default::default()
        };
        assert_eq!(opts.clamped().sampling, 5);
    }

    #[test]
    fn test_dewarp_grid_size() {
        let opts = DewarpOptions::new();
        let d = Dewarp::new(900, 1000, 3, &opts);
        // ceil(900/30) + 1, ceil(1000/30) + 1
        assert_eq!(d.grid_size(), (31, 35));
        assert_eq!(d.page_number(), 3);
        assert!(!d.v_success());
    }

    #[test]
    fn test_text_line_extent_and_endpoints() {
        let line: TextLine = [(10.0, 5.0), (3.0, 6.0), (20.0, 7.0)].into_iter().collect();
        assert_eq!(line.extent(), 18.0);
        assert_eq!(line.endpoints(), Some(((3.0, 6.0), (20.0, 7.0))));
        assert_eq!(TextLine::new(Pta::new()).extent(), 0.0);
    }
}
