//! Base64 / data-URL output and the host pixel-source adapter.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::deflate::{DeflateOverrides, DEFAULT_LEVEL};
use crate::error::Result;
use crate::pixel::PixelBuffer;
use crate::png::encode_rgba;

/// MIME prefix of a base64 PNG data URL.
pub const DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Map a 0..1 quality to a deflate level, inverted: 1.0 → 0, 0.0 → 9.
///
/// Out-of-range values are clamped. NaN and infinities get the default level.
pub fn quality_to_level(quality: f64) -> i32 {
    if !quality.is_finite() {
        return DEFAULT_LEVEL;
    }
    ((1.0 - quality.clamp(0.0, 1.0)) * 9.0).round() as i32
}

pub fn to_base64(png: &[u8]) -> String {
    STANDARD.encode(png)
}

/// `data:image/png;base64,...` for an encoded PNG.
pub fn to_data_url(png: &[u8]) -> String {
    let mut url = String::with_capacity(DATA_URL_PREFIX.len() + png.len().div_ceil(3) * 4);
    url.push_str(DATA_URL_PREFIX);
    STANDARD.encode_string(png, &mut url);
    url
}

/// Anything that can hand over a row-major RGBA snapshot of itself, such as
/// a canvas or a framebuffer.
pub trait PixelSource {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// `width * height * 4` bytes, row-major, no padding.
    fn rgba(&self) -> &[u8];
}

impl PixelSource for PixelBuffer<'_> {
    fn width(&self) -> u32 {
        PixelBuffer::width(self)
    }

    fn height(&self) -> u32 {
        PixelBuffer::height(self)
    }

    fn rgba(&self) -> &[u8] {
        self.data()
    }
}

/// Encode a pixel source as a PNG data URL.
///
/// `quality` goes through [`quality_to_level`]; `None` keeps the default
/// compression level.
pub fn encode_source<S: PixelSource + ?Sized>(source: &S, quality: Option<f64>) -> Result<String> {
    let mut overrides = DeflateOverrides::default();
    if let Some(q) = quality {
        overrides = overrides.with_level(quality_to_level(q));
    }
    let png = encode_rgba(source.width(), source.height(), source.rgba(), &overrides)?;
    Ok(to_data_url(&png))
}
