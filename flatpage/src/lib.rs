//! flatpage - Document page dewarping for Rust
//!
//! Straightens the curved text lines of scanned or photographed book pages.
//!
//! # Overview
//!
//! - Raster and field containers, boxes and point arrays ([`Pix`], [`FPix`],
//!   [`Pta`])
//! - Binary morphology ([`morph`])
//! - Connected components and seed filling ([`region`])
//! - Disparity models, rendering and multi-page reference models
//!   ([`dewarp`])
//!
//! # Example
//!
//! ```
//! use flatpage::{Pix, PixelDepth};
//! use flatpage::dewarp::{Dewarpa, DewarpaOptions, ModelSource};
//!
//! // A blank page has no text lines, so it is passed through unchanged
//! let pix = Pix::new(640, 480, PixelDepth::Bit1).unwrap();
//! let mut dewarpa = Dewarpa::new(1, DewarpaOptions::new());
//! assert!(dewarpa.build_page_model(0, &pix).is_err());
//! let page = dewarpa.apply_disparity(0, &pix).unwrap();
//! assert_eq!(page.source, ModelSource::None);
//! ```

// Re-export core types (primary data structures used everywhere)
pub use flatpage_core::*;

// Re-export domain crates as modules to avoid name conflicts
pub use flatpage_dewarp as dewarp;
pub use flatpage_morph as morph;
pub use flatpage_region as region;
