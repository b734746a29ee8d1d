//! RGBA → PNG encoder.
//!
//! Produces `signature ++ IHDR ++ IDAT ++ IEND`: one header chunk, one data
//! chunk holding the zlib stream of the filtered scanlines, and an empty
//! trailer. The output buffer is allocated once at its final size.

use serde::{Deserialize, Serialize};
use tracing::{debug, enabled, Level};

use crate::chunk::{chunk_len, write_chunk, ChunkType};
use crate::deflate::{Compressor, DeflateOptions, DeflateOverrides, MinizCompressor};
use crate::error::Result;
use crate::filter::{filter_image, FilterStrategy, FilterType};
use crate::pixel::PixelBuffer;

/// PNG file signature.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// IHDR payload length.
pub const IHDR_LEN: usize = 13;

const BIT_DEPTH: u8 = 8;
const COLOR_TYPE_RGBA: u8 = 6;
const COMPRESSION_METHOD: u8 = 0;
/// Method 0 = adaptive filtering with a filter byte per row.
const FILTER_METHOD: u8 = 0;
const INTERLACE_NONE: u8 = 0;

/// Encoder configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EncoderConfig {
    /// Per-row filter selection.
    pub filter: FilterStrategy,
    /// Overrides on top of [`DeflateOptions::default`].
    pub deflate: DeflateOverrides,
}

/// PNG encoder for 8-bit RGBA images.
#[derive(Debug, Clone)]
pub struct PngEncoder<C = MinizCompressor> {
    config: EncoderConfig,
    compressor: C,
}

impl PngEncoder {
    /// Create a new PNG encoder with default settings.
    pub fn new() -> Self {
        Self::with_config(EncoderConfig::default())
    }

    /// Create encoder with configuration.
    pub fn with_config(config: EncoderConfig) -> Self {
        PngEncoder { config, compressor: MinizCompressor }
    }
}

impl Default for PngEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Compressor> PngEncoder<C> {
    /// Create an encoder that hands IDAT data to `compressor`.
    pub fn with_compressor(config: EncoderConfig, compressor: C) -> Self {
        PngEncoder { config, compressor }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Options forwarded to the compressor: defaults merged with overrides.
    pub fn deflate_options(&self) -> DeflateOptions {
        DeflateOptions::default().merged(&self.config.deflate)
    }

    /// Filter every scanline without compressing.
    pub fn filter_image(&self, pixels: &PixelBuffer<'_>) -> Vec<u8> {
        filter_image(pixels, self.config.filter)
    }

    /// Encode `pixels` to a complete PNG byte stream.
    pub fn encode(&self, pixels: &PixelBuffer<'_>) -> Result<Vec<u8>> {
        let filtered = self.filter_image(pixels);
        if enabled!(Level::DEBUG) {
            log_filter_histogram(&filtered, pixels.byte_width());
        }

        let compressed = self.compressor.deflate(&filtered, &self.deflate_options())?;

        let total = PNG_SIGNATURE.len()
            + chunk_len(IHDR_LEN)
            + chunk_len(compressed.len())
            + chunk_len(0);
        let mut png = Vec::with_capacity(total);
        png.extend_from_slice(&PNG_SIGNATURE);
        write_chunk(&mut png, ChunkType::IHDR, &ihdr_payload(pixels.width(), pixels.height()))?;
        write_chunk(&mut png, ChunkType::IDAT, &compressed)?;
        write_chunk(&mut png, ChunkType::IEND, &[])?;
        debug_assert_eq!(png.len(), total);

        debug!(
            width = pixels.width(),
            height = pixels.height(),
            filtered = filtered.len(),
            idat = compressed.len(),
            total,
            "png encoded"
        );
        Ok(png)
    }
}

/// IHDR for an 8-bit RGBA, non-interlaced image.
fn ihdr_payload(width: u32, height: u32) -> [u8; IHDR_LEN] {
    let mut ihdr = [0u8; IHDR_LEN];
    ihdr[0..4].copy_from_slice(&width.to_be_bytes());
    ihdr[4..8].copy_from_slice(&height.to_be_bytes());
    ihdr[8] = BIT_DEPTH;
    ihdr[9] = COLOR_TYPE_RGBA;
    ihdr[10] = COMPRESSION_METHOD;
    ihdr[11] = FILTER_METHOD;
    ihdr[12] = INTERLACE_NONE;
    ihdr
}

fn log_filter_histogram(filtered: &[u8], byte_width: usize) {
    let mut counts = [0usize; FilterType::ALL.len()];
    for row in filtered.chunks_exact(byte_width + 1) {
        counts[row[0] as usize] += 1;
    }
    debug!(
        none = counts[FilterType::None as usize],
        sub = counts[FilterType::Sub as usize],
        up = counts[FilterType::Up as usize],
        average = counts[FilterType::Average as usize],
        paeth = counts[FilterType::Paeth as usize],
        "row filters"
    );
}

/// Encode a `width`×`height` RGBA buffer with default filtering and the given
/// compressor overrides.
pub fn encode_rgba(width: u32, height: u32, rgba: &[u8], overrides: &DeflateOverrides) -> Result<Vec<u8>> {
    let pixels = PixelBuffer::new(width, height, rgba)?;
    let config = EncoderConfig { deflate: *overrides, ..EncoderConfig::default() };
    PngEncoder::with_config(config).encode(&pixels)
}
