//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding or decoding index keys.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Failed to encode a key.
    #[error("encoding failed: {message}")]
    EncodingFailed {
        /// Description of the encoding error.
        message: String,
    },

    /// Unexpected end of input.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// The varlena header disagrees with the number of bytes supplied.
    #[error("size mismatch: header says {declared} bytes, got {actual}")]
    SizeMismatch {
        /// Size recorded in the header.
        declared: usize,
        /// Size of the buffer.
        actual: usize,
    },

    /// Unknown or contradictory flag bits.
    #[error("invalid key flags: {flags:#010x}")]
    InvalidFlags {
        /// The raw flag word.
        flags: u32,
    },

    /// Invalid UTF-8 in a path label.
    #[error("invalid UTF-8 in label")]
    InvalidUtf8,

    /// Structurally invalid payload.
    #[error("invalid key structure: {message}")]
    InvalidStructure {
        /// Description of the structural error.
        message: String,
    },
}

impl CodecError {
    /// Create an encoding failed error.
    pub fn encoding_failed(message: impl Into<String>) -> Self {
        Self::EncodingFailed {
            message: message.into(),
        }
    }

    /// Create an invalid structure error.
    pub fn invalid_structure(message: impl Into<String>) -> Self {
        Self::InvalidStructure {
            message: message.into(),
        }
    }

    /// Create a size mismatch error.
    pub fn size_mismatch(declared: usize, actual: usize) -> Self {
        Self::SizeMismatch { declared, actual }
    }
}
