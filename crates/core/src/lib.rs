//! # pngenc-core
//!
//! Encodes 8-bit RGBA pixel buffers as PNG (v0.3.0).
//!
//! Each scanline is run through PNG's adaptive filters (None, Sub, Up,
//! Average, Paeth), the filtered stream is deflated into a zlib stream, and
//! the result is framed into CRC-checked chunks:
//!
//! ```text
//! 89 50 4E 47 0D 0A 1A 0A | IHDR | IDAT | IEND
//! ```
//!
//! ## Architecture
//!
//! - [`pixel`] — [`PixelBuffer`], a validated borrowed view of RGBA pixels
//! - [`filter`] — Predictors, heuristic filter selection, whole-image filtering
//! - [`chunk`] — Chunk framing and CRC-32
//! - [`deflate`] — [`DeflateOptions`] / [`DeflateOverrides`] and the [`Compressor`] seam
//! - [`png`] — [`PngEncoder`], which orders signature, IHDR, IDAT and IEND
//! - [`data_url`] — Base64 data URLs, quality → level mapping, [`data_url::PixelSource`]
//!
//! ## Example
//!
//! ```
//! use pngenc_core::{encode_rgba, DeflateOverrides};
//!
//! let png = encode_rgba(1, 1, &[255, 0, 0, 255], &DeflateOverrides::default()).unwrap();
//! assert_eq!(&png[1..4], b"PNG");
//! ```

pub mod chunk;
pub mod data_url;
pub mod deflate;
pub mod error;
pub mod filter;
pub mod pixel;
pub mod png;

pub use chunk::{crc32, make_chunk, ChunkType};
pub use data_url::{encode_source, quality_to_level, to_data_url};
pub use deflate::{Compressor, DeflateOptions, DeflateOverrides, MinizCompressor};
pub use error::{EncodeError, Result};
pub use filter::{FilterStrategy, FilterType};
pub use pixel::{PixelBuffer, PixelFormat, BYTES_PER_PIXEL, MAX_DIMENSION};
pub use png::{encode_rgba, EncoderConfig, PngEncoder, PNG_SIGNATURE};
