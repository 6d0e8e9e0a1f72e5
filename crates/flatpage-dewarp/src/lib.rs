//! flatpage-dewarp - Page distortion correction
//!
//! Corrects the curvature of text lines in scanned or photographed pages,
//! typically from a bound book that does not lie flat.
//!
//! # Overview
//!
//! 1. Find the vertical centers of text lines in a binary page
//! 2. Drop lines much shorter than the longest
//! 3. Fit each line with a quadratic and measure how far it bows from its
//!    flat point; extend that over the page as a vertical disparity field
//! 4. Optionally estimate a horizontal disparity field
//! 5. Resample the page through the fields
//!
//! For a multi-page document, [`Dewarpa`] keeps one model per page and lends
//! a nearby page's model to pages whose own model is missing or unreliable.
//!
//! # Example
//!
//! ```no_run
//! use flatpage_core::{Pix, PixelDepth};
//! use flatpage_dewarp::{DewarpaOptions, dewarp_single_page};
//!
//! # let binary = Pix::new(800, 1000, PixelDepth::Bit1).unwrap();
//! let options = DewarpaOptions::new();
//! match dewarp_single_page(&binary, &binary, &options) {
//!     Ok(page) => println!("corrected: {}", page.was_corrected()),
//!     Err(e) => println!("dewarping failed: {e}"),
//! }
//! ```
//!
//! # Configuration
//!
//! ```
//! use flatpage_dewarp::{DewarpOptions, DewarpaOptions};
//!
//! let options = DewarpaOptions::new()
//!     .with_model(DewarpOptions::new().with_sampling(20).with_min_lines(10))
//!     .with_max_dist(4);
//! assert_eq!(options.model.sampling, 20);
//! ```

mod apply;
mod dewarpa;
mod error;
mod horizontal;
mod model;
mod textline;
mod types;

pub use apply::{
    apply_disparity, apply_horizontal_disparity, apply_vertical_disparity,
    apply_vertical_disparity_in_place,
};
pub use dewarpa::{
    Dewarpa, DewarpaOptions, DewarpaSummary, ModelSlot, ValidityThresholds, test_for_valid_model,
};
pub use error::{DewarpError, DewarpResult};
pub use horizontal::build_horizontal_disparity;
pub use model::{build_vertical_disparity, populate_full_resolution};
pub use textline::{
    TextlineOptions, find_textline_centers, find_textline_centers_with, remove_short_lines,
    textline_sequence,
};
pub use types::{Dewarp, DewarpOptions, DewarpedPage, ModelSource, PageState, TextLine};

use flatpage_core::Pix;

/// Dewarp a single page
///
/// The model is built from `binary` (1 bpp) and applied to `target`, which
/// may be any supported depth but should have the same size.
///
/// # Errors
///
/// Returns the error that stopped the model build, most often
/// [`DewarpError::InsufficientLines`], or an error from rendering.
pub fn dewarp_single_page(
    binary: &Pix,
    target: &Pix,
    options: &DewarpaOptions,
) -> DewarpResult<DewarpedPage> {
    let mut dewarpa = Dewarpa::new(1, options.clone());
    dewarpa.build_page_model(0, binary)?;
    dewarpa.apply_disparity(0, target)
}
