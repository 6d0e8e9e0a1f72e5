//! flatpage-morph - Binary morphology
//!
//! Brick dilation, erosion, opening and closing on 1 bpp images, plus a
//! small interpreter for chains of them written as strings such as
//! `"o1.3 + c15.1 + o15.1 + c40.1"`.

pub mod binary;
mod error;
pub mod sequence;

pub use binary::{close_brick, dilate_brick, erode_brick, open_brick};
pub use error::{MorphError, MorphResult};
pub use sequence::{MorphOp, MorphSequence, morph_sequence};
