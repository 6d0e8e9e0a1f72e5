//! Error types for the test framework

use thiserror::Error;

/// Errors that can occur while preparing test fixtures
#[derive(Debug, Error)]
pub enum TestError {
    /// A synthetic page description cannot be rendered
    #[error("invalid synthetic page: {0}")]
    InvalidPage(String),

    /// Core container error
    #[error("core error: {0}")]
    Core(#[from] flatpage_core::Error),
}

/// Result type for test operations
pub type TestResult<T> = Result<T, TestError>;
