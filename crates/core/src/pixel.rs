//! Borrowed RGBA pixel buffer view.
//!
//! The encoder never copies caller pixels: a [`PixelBuffer`] validates the
//! dimensions once and then hands out scanlines as sub-slices.

use crate::error::{EncodeError, Result};

/// Bytes per pixel for 8-bit RGBA.
pub const BYTES_PER_PIXEL: usize = 4;

/// Largest width or height an IHDR may carry (2^31 - 1).
pub const MAX_DIMENSION: u32 = i32::MAX as u32;

/// Pixel layout a caller claims its buffer has.
///
/// Only [`PixelFormat::Rgba8`] can be encoded; the others exist so callers
/// holding differently laid-out data get a clear rejection instead of a
/// garbled IHDR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 8-bit RGBA, 4 bytes per pixel.
    Rgba8,
    /// 8-bit RGB, 3 bytes per pixel.
    Rgb8,
    /// 8-bit BGRA, 4 bytes per pixel.
    Bgra8,
    /// 8-bit grayscale.
    Gray8,
    /// 16-bit RGBA, 8 bytes per pixel.
    Rgba16,
}

/// Validated, read-only view of row-major RGBA pixels with no row padding.
#[derive(Debug, Clone, Copy)]
pub struct PixelBuffer<'a> {
    width: u32,
    height: u32,
    data: &'a [u8],
}

impl<'a> PixelBuffer<'a> {
    /// Wrap `data` as a `width`×`height` RGBA image.
    ///
    /// Fails with [`EncodeError::InvalidDimensions`] for zero, overflowing or
    /// over-[`MAX_DIMENSION`] sizes and [`EncodeError::BufferSizeMismatch`]
    /// when `data` is not exactly `width * height * 4` bytes.
    pub fn new(width: u32, height: u32, data: &'a [u8]) -> Result<Self> {
        let expected = expected_len(width, height)?;
        if data.len() != expected {
            return Err(EncodeError::BufferSizeMismatch { expected, actual: data.len() });
        }
        Ok(PixelBuffer { width, height, data })
    }

    /// Like [`PixelBuffer::new`] but rejects any layout other than RGBA8.
    pub fn with_format(width: u32, height: u32, data: &'a [u8], format: PixelFormat) -> Result<Self> {
        if format != PixelFormat::Rgba8 {
            return Err(EncodeError::UnsupportedFormat(format!(
                "{:?} (only 8-bit RGBA is supported)",
                format
            )));
        }
        Self::new(width, height, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Bytes in one scanline (`width * 4`).
    pub fn byte_width(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    /// Raw bytes of row `y`.
    pub fn scanline(&self, y: usize) -> &'a [u8] {
        let bw = self.byte_width();
        &self.data[y * bw..(y + 1) * bw]
    }
}

fn expected_len(width: u32, height: u32) -> Result<usize> {
    if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(EncodeError::InvalidDimensions { width, height });
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(BYTES_PER_PIXEL))
        .ok_or(EncodeError::InvalidDimensions { width, height })
}
