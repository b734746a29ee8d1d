//! Encoder error types.

use thiserror::Error;

/// Errors produced while encoding a PNG.
///
/// Every variant aborts the encode call; no partial output is ever returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// Width or height is zero or above 2^31 - 1, or the byte size overflows `usize`.
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Image width.
        width: u32,
        /// Image height.
        height: u32,
    },

    /// Pixel data length does not match `width * height * 4`.
    #[error("Pixel buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch {
        /// Expected bytes.
        expected: usize,
        /// Actual bytes.
        actual: usize,
    },

    /// Anything other than 8-bit-per-channel RGBA.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Compressor options rejected before compression started.
    #[error("Invalid compressor options: {0}")]
    InvalidOptions(String),

    /// The compressor failed while producing the stream.
    #[error("Compressor error: {0}")]
    Compressor(String),

    /// Payload does not fit the 32-bit chunk length field.
    #[error("Chunk payload too large: {0} bytes")]
    ChunkTooLarge(usize),
}

impl EncodeError {
    /// True for failures that originate in the compressor (options or stream).
    pub fn is_compressor_failure(&self) -> bool {
        matches!(self, EncodeError::InvalidOptions(_) | EncodeError::Compressor(_))
    }
}

/// Encoder result type.
pub type Result<T> = std::result::Result<T, EncodeError>;
