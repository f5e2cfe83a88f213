//! Error types for conversion operations

use thiserror::Error;

/// Errors that can occur during HTML to Markdown conversion
///
/// Callers of [`crate::Converter`] see this as one opaque failure kind; the
/// variants exist so the engine can report what went wrong and the C ABI
/// can hand out a stable numeric code.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// Input bytes are invalid for the detected charset, or the charset is unsupported
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Cooperative deadline exceeded
    #[error("conversion timeout exceeded")]
    Timeout,

    /// Input is larger than the configured limit
    #[error("input of {size} bytes exceeds the {limit} byte limit")]
    InputTooLarge { size: usize, limit: usize },

    /// Input rejected by the engine (nesting limit, NULL pointers across the C ABI)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Unexpected condition, including panics caught at the C ABI
    #[error("internal error: {0}")]
    Internal(String),
}

impl ConversionError {
    /// Numeric error code used by the C ABI
    pub fn code(&self) -> u32 {
        match self {
            ConversionError::Encoding(_) => 2,
            ConversionError::Timeout => 3,
            ConversionError::InputTooLarge { .. } => 4,
            ConversionError::InvalidInput(_) => 5,
            ConversionError::Internal(_) => 99,
        }
    }
}
