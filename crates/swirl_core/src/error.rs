//! # Core Error Types
//!
//! Errors raised by the math and timing primitives.

use thiserror::Error;

/// Errors that can occur in the core primitives.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Inverse interpolation over an empty range.
    #[error("division by zero: range [{a}, {b}] is empty")]
    DivideByZero {
        /// Range start.
        a: f32,
        /// Range end.
        b: f32,
    },

    /// A countdown was configured with an unusable duration.
    #[error("invalid duration {0}: must be finite and non-negative")]
    InvalidDuration(f32),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
