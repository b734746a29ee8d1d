//! Deflate compression options and the compressor seam.
//!
//! The encoder only needs `deflate(bytes, options) -> bytes`. [`Compressor`]
//! is that contract; [`MinizCompressor`] implements it with `miniz_oxide`.
//!
//! Option ranges follow zlib:
//!
//! | field         | valid values                                  |
//! |---------------|-----------------------------------------------|
//! | `level`       | 0 (store) ..= 9 (best)                        |
//! | `window_bits` | 15 (zlib wrapper) or -15 (raw deflate)        |
//! | `chunk_size`  | power of two in 256 ..= 32768                 |
//! | `strategy`    | 0 default, 1 filtered, 2 huffman, 3 RLE, 4 fixed |
//!
//! `miniz_oxide` always searches a 32 KiB window, so smaller windows
//! (`|window_bits| < 15`) cannot be honoured and are rejected.

use miniz_oxide::deflate::core::{
    compress, create_comp_flags_from_zip_params, CompressorOxide, TDEFLFlush, TDEFLStatus,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EncodeError, Result};

pub const STRATEGY_DEFAULT: i32 = 0;
pub const STRATEGY_FILTERED: i32 = 1;
pub const STRATEGY_HUFFMAN_ONLY: i32 = 2;
pub const STRATEGY_RLE: i32 = 3;
pub const STRATEGY_FIXED: i32 = 4;

/// Default compression level (zlib's default).
pub const DEFAULT_LEVEL: i32 = 6;
/// Default window size: 32 KiB with a zlib header, as PNG requires.
pub const DEFAULT_WINDOW_BITS: i32 = 15;
/// Default output chunk size.
pub const DEFAULT_CHUNK_SIZE: usize = 32 * 1024;

/// The only window size the compressor produces.
const MAX_WINDOW_BITS: u32 = 15;
const MIN_CHUNK_SIZE: usize = 256;
const MAX_CHUNK_SIZE: usize = 32 * 1024;

/// Fully resolved compressor options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeflateOptions {
    pub level: i32,
    pub window_bits: i32,
    pub chunk_size: usize,
    pub strategy: i32,
}

impl Default for DeflateOptions {
    fn default() -> Self {
        DeflateOptions {
            level: DEFAULT_LEVEL,
            window_bits: DEFAULT_WINDOW_BITS,
            chunk_size: DEFAULT_CHUNK_SIZE,
            strategy: STRATEGY_RLE,
        }
    }
}

impl DeflateOptions {
    /// Apply caller overrides field by field; set fields win.
    pub fn merged(&self, overrides: &DeflateOverrides) -> DeflateOptions {
        DeflateOptions {
            level: overrides.level.unwrap_or(self.level),
            window_bits: overrides.window_bits.unwrap_or(self.window_bits),
            chunk_size: overrides.chunk_size.unwrap_or(self.chunk_size),
            strategy: overrides.strategy.unwrap_or(self.strategy),
        }
    }

    /// Check every field against its documented range.
    pub fn validate(&self) -> Result<()> {
        if !(0..=9).contains(&self.level) {
            return Err(EncodeError::InvalidOptions(format!(
                "level {} out of range 0..=9",
                self.level
            )));
        }
        if self.window_bits.unsigned_abs() != MAX_WINDOW_BITS {
            return Err(EncodeError::InvalidOptions(format!(
                "window bits {} unsupported (only 15, or -15 for raw deflate)",
                self.window_bits
            )));
        }
        if !self.chunk_size.is_power_of_two()
            || !(MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE).contains(&self.chunk_size)
        {
            return Err(EncodeError::InvalidOptions(format!(
                "chunk size {} is not a power of two in {}..={}",
                self.chunk_size, MIN_CHUNK_SIZE, MAX_CHUNK_SIZE
            )));
        }
        if !(STRATEGY_DEFAULT..=STRATEGY_FIXED).contains(&self.strategy) {
            return Err(EncodeError::InvalidOptions(format!(
                "strategy {} out of range 0..=4",
                self.strategy
            )));
        }
        Ok(())
    }

    /// Whether the output carries a zlib header and Adler-32 trailer.
    pub fn zlib_wrapped(&self) -> bool {
        self.window_bits > 0
    }
}

/// Caller-supplied partial options. Unset fields keep the encoder defaults.
///
/// Deserializes from option bags such as `{ "level": 5, "windowBits": 15 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct DeflateOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_bits: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<i32>,
}

impl DeflateOverrides {
    pub fn with_level(mut self, level: i32) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_window_bits(mut self, window_bits: i32) -> Self {
        self.window_bits = Some(window_bits);
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size);
        self
    }

    pub fn with_strategy(mut self, strategy: i32) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Layer `other` on top of `self`; fields set in `other` win.
    pub fn overlay(&self, other: &DeflateOverrides) -> DeflateOverrides {
        DeflateOverrides {
            level: other.level.or(self.level),
            window_bits: other.window_bits.or(self.window_bits),
            chunk_size: other.chunk_size.or(self.chunk_size),
            strategy: other.strategy.or(self.strategy),
        }
    }
}

/// Deflate compressor contract consumed by the encoder.
pub trait Compressor {
    /// Compress `data` with fully resolved `options`.
    fn deflate(&self, data: &[u8], options: &DeflateOptions) -> Result<Vec<u8>>;
}

/// [`Compressor`] backed by `miniz_oxide`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinizCompressor;

impl Compressor for MinizCompressor {
    fn deflate(&self, data: &[u8], options: &DeflateOptions) -> Result<Vec<u8>> {
        options.validate()?;

        let flags = create_comp_flags_from_zip_params(options.level, options.window_bits, options.strategy);
        let mut compressor = CompressorOxide::new(flags);

        // Output grows one chunk at a time until the stream is finished.
        let mut output = Vec::new();
        let mut out_pos = 0;
        let mut input = data;
        loop {
            output.resize(out_pos + options.chunk_size, 0);
            let (status, bytes_in, bytes_out) =
                compress(&mut compressor, input, &mut output[out_pos..], TDEFLFlush::Finish);
            out_pos += bytes_out;
            input = &input[bytes_in..];

            match status {
                TDEFLStatus::Done => break,
                TDEFLStatus::Okay => continue,
                failed => {
                    return Err(EncodeError::Compressor(format!("deflate stream failed: {:?}", failed)));
                }
            }
        }
        output.truncate(out_pos);

        debug!(
            input = data.len(),
            output = out_pos,
            level = options.level,
            zlib = options.zlib_wrapped(),
            "deflate finished"
        );
        Ok(output)
    }
}
