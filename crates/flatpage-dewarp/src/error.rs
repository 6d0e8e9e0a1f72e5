//! Error types for flatpage-dewarp

use thiserror::Error;

/// Errors that can occur while building or applying dewarping models
#[derive(Debug, Error)]
pub enum DewarpError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] flatpage_core::Error),

    /// Morphology error
    #[error("morphology error: {0}")]
    Morph(#[from] flatpage_morph::MorphError),

    /// Region error
    #[error("region error: {0}")]
    Region(#[from] flatpage_region::RegionError),

    /// Too few usable text lines to build a vertical model
    #[error("insufficient text lines: found {found}, need {required}")]
    InsufficientLines { found: usize, required: usize },

    /// A disparity field does not cover the image it is applied to
    #[error(
        "disparity field {}x{} smaller than image {}x{}",
        .field.0, .field.1, .image.0, .image.1
    )]
    FieldTooSmall { field: (u32, u32), image: (u32, u32) },

    /// Unsupported pixel depth for this operation
    #[error("unsupported depth: expected {expected}, got {actual}")]
    UnsupportedDepth { expected: &'static str, actual: u32 },

    /// The model lacks the disparity data the operation needs
    #[error("model not built: {0}")]
    ModelNotBuilt(&'static str),

    /// Page number outside the collection
    #[error("page {page} out of range for {npages} pages")]
    PageOutOfRange { page: usize, npages: usize },
}

/// Result type for dewarping operations
pub type DewarpResult<T> = Result<T, DewarpError>;
