//! flatpage-test - Regression test support for flatpage
//!
//! Provides [`RegParams`], which collects numbered comparisons and reports
//! every failure at the end of a test, and [`SyntheticPage`], a generator
//! for binary pages with curved text lines of known geometry.
//!
//! # Usage
//!
//! ```ignore
//! use flatpage_test::{RegParams, SyntheticPage};
//!
//! let pix = SyntheticPage::new().render_binary().unwrap();
//! let mut rp = RegParams::new("textline");
//! rp.compare_values(20.0, lines.len() as f64, 0.0);
//! assert!(rp.cleanup());
//! ```

mod error;
mod params;
pub mod synth;

pub use error::{TestError, TestResult};
pub use params::RegParams;
pub use synth::{SyntheticPage, binary_to_gray, gray_to_binary};
