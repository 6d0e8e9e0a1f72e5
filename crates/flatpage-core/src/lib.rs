//! Flatpage Core - Basic data structures for page dewarping
//!
//! This crate provides the containers every other flatpage crate works on:
//!
//! - [`Pix`] / [`PixMut`] - Packed raster image (immutable / mutable)
//! - [`FPix`] - Floating-point field, used for disparity arrays
//! - [`Pta`] / [`Ptaa`] - Point arrays with least-squares fitting
//! - [`Box`] - Rectangle regions

pub mod box_;
pub mod error;
pub mod fpix;
pub mod pix;
pub mod pta;

pub use box_::Box;
pub use error::{Error, Result};
pub use fpix::FPix;
pub use pix::{Pix, PixMut, PixelDepth};
pub use pta::{Pta, Ptaa, apply_linear_fit, apply_quadratic_fit};
