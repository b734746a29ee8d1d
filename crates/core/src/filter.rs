//! PNG scanline filters (predictors) and adaptive filter selection.
//!
//! Each filter predicts a byte from its left (`a`), above (`b`) and
//! upper-left (`c`) neighbours and stores the residual `raw - prediction`
//! modulo 256. Missing neighbours (row 0, or the first pixel of a row) are
//! zero for every filter.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::pixel::{PixelBuffer, BYTES_PER_PIXEL};

/// PNG filter type, stored as the first byte of every filtered row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterType {
    /// No filter.
    None = 0,
    /// Difference from the left byte.
    Sub = 1,
    /// Difference from the byte above.
    Up = 2,
    /// Difference from the mean of left and above.
    Average = 3,
    /// Difference from the Paeth predictor of left, above, upper-left.
    Paeth = 4,
}

impl FilterType {
    /// All filter types in wire order.
    pub const ALL: [FilterType; 5] = [
        FilterType::None,
        FilterType::Sub,
        FilterType::Up,
        FilterType::Average,
        FilterType::Paeth,
    ];

    /// Filters tried by adaptive selection, in tie-break order.
    pub const CANDIDATES: [FilterType; 4] = [
        FilterType::Sub,
        FilterType::Up,
        FilterType::Average,
        FilterType::Paeth,
    ];

    /// Create from byte value.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(FilterType::None),
            1 => Some(FilterType::Sub),
            2 => Some(FilterType::Up),
            3 => Some(FilterType::Average),
            4 => Some(FilterType::Paeth),
            _ => None,
        }
    }

    /// Predicted value for a byte given its left, above and upper-left
    /// neighbours.
    #[inline]
    pub fn predict(self, a: u8, b: u8, c: u8) -> u8 {
        match self {
            FilterType::None => 0,
            FilterType::Sub => a,
            FilterType::Up => b,
            // u16 keeps the ninth bit of the sum
            FilterType::Average => ((a as u16 + b as u16) / 2) as u8,
            FilterType::Paeth => paeth_predictor(a, b, c),
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FilterType::None => "none",
            FilterType::Sub => "sub",
            FilterType::Up => "up",
            FilterType::Average => "average",
            FilterType::Paeth => "paeth",
        };
        f.write_str(name)
    }
}

/// How the encoder picks a filter for each row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterStrategy {
    /// Pick the cheapest of Sub/Up/Average/Paeth per row.
    #[default]
    Adaptive,
    /// Always use the None filter.
    None,
    /// Always use the Sub filter.
    Sub,
    /// Always use the Up filter.
    Up,
    /// Always use the Average filter.
    Average,
    /// Always use the Paeth filter.
    Paeth,
}

impl FilterStrategy {
    /// The forced filter, or `None` for adaptive selection.
    pub fn fixed(self) -> Option<FilterType> {
        match self {
            FilterStrategy::Adaptive => None,
            FilterStrategy::None => Some(FilterType::None),
            FilterStrategy::Sub => Some(FilterType::Sub),
            FilterStrategy::Up => Some(FilterType::Up),
            FilterStrategy::Average => Some(FilterType::Average),
            FilterStrategy::Paeth => Some(FilterType::Paeth),
        }
    }
}

impl FromStr for FilterStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "adaptive" => Ok(FilterStrategy::Adaptive),
            "none" => Ok(FilterStrategy::None),
            "sub" => Ok(FilterStrategy::Sub),
            "up" => Ok(FilterStrategy::Up),
            "average" | "avg" => Ok(FilterStrategy::Average),
            "paeth" => Ok(FilterStrategy::Paeth),
            other => Err(format!("unknown filter '{}'", other)),
        }
    }
}

/// Paeth predictor function.
///
/// Ties resolve to `a`, then `b`, then `c`; decoders rely on this order.
#[inline]
pub fn paeth_predictor(a: u8, b: u8, c: u8) -> u8 {
    let p = a as i16 + b as i16 - c as i16;
    let pa = (p - a as i16).abs();
    let pb = (p - b as i16).abs();
    let pc = (p - c as i16).abs();

    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

/// Left, above and upper-left neighbours of byte `i`.
#[inline]
fn neighbours(current: &[u8], previous: Option<&[u8]>, i: usize, bpp: usize) -> (u8, u8, u8) {
    let a = if i >= bpp { current[i - bpp] } else { 0 };
    let b = previous.map(|p| p[i]).unwrap_or(0);
    let c = if i >= bpp {
        previous.map(|p| p[i - bpp]).unwrap_or(0)
    } else {
        0
    };
    (a, b, c)
}

/// Filter a row of pixels into `output` (same length as `current`).
pub fn filter_row(
    filter_type: FilterType,
    current: &[u8],
    previous: Option<&[u8]>,
    bytes_per_pixel: usize,
    output: &mut [u8],
) {
    if filter_type == FilterType::None {
        output.copy_from_slice(current);
        return;
    }
    for i in 0..current.len() {
        let (a, b, c) = neighbours(current, previous, i, bytes_per_pixel);
        output[i] = current[i].wrapping_sub(filter_type.predict(a, b, c));
    }
}

/// Heuristic cost of filtering a row: the sum of `|raw - prediction|`.
///
/// The difference is taken before the modulo-256 wrap, so each byte costs
/// between 0 and 255.
pub fn filter_cost(
    filter_type: FilterType,
    current: &[u8],
    previous: Option<&[u8]>,
    bytes_per_pixel: usize,
) -> u64 {
    let mut sum = 0u64;
    for i in 0..current.len() {
        let (a, b, c) = neighbours(current, previous, i, bytes_per_pixel);
        let diff = current[i] as i16 - filter_type.predict(a, b, c) as i16;
        sum += diff.unsigned_abs() as u64;
    }
    sum
}

/// Select the cheapest filter for a row among [`FilterType::CANDIDATES`].
///
/// Only a strictly smaller cost replaces the current best, so ties keep the
/// earlier candidate.
pub fn select_filter(current: &[u8], previous: Option<&[u8]>, bytes_per_pixel: usize) -> FilterType {
    let mut best_filter = FilterType::CANDIDATES[0];
    let mut best_sum = u64::MAX;

    for filter in FilterType::CANDIDATES {
        let sum = filter_cost(filter, current, previous, bytes_per_pixel);
        if sum < best_sum {
            best_sum = sum;
            best_filter = filter;
        }
    }

    best_filter
}

/// Filter every scanline of `pixels` into one freshly allocated buffer of
/// `(byte_width + 1) * height` bytes.
pub fn filter_image(pixels: &PixelBuffer<'_>, strategy: FilterStrategy) -> Vec<u8> {
    let row_bytes = pixels.byte_width();
    let height = pixels.height() as usize;
    let mut filtered = vec![0u8; (row_bytes + 1) * height];

    let mut prev_row: Option<&[u8]> = None;
    for (y, out) in filtered.chunks_exact_mut(row_bytes + 1).enumerate() {
        let row = pixels.scanline(y);
        let filter_type = match strategy.fixed() {
            Some(f) => f,
            None => select_filter(row, prev_row, BYTES_PER_PIXEL),
        };
        trace!(row = y, filter = %filter_type, "scanline filtered");

        out[0] = filter_type as u8;
        filter_row(filter_type, row, prev_row, BYTES_PER_PIXEL, &mut out[1..]);
        prev_row = Some(row);
    }

    filtered
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Inverse of `filter_row`, used to check reconstruction.
    fn unfilter_row(filter_type: FilterType, current: &mut [u8], previous: Option<&[u8]>, bpp: usize) {
        for i in 0..current.len() {
            let (a, b, c) = neighbours(current, previous, i, bpp);
            current[i] = current[i].wrapping_add(filter_type.predict(a, b, c));
        }
    }

    #[test]
    fn test_filter_type() {
        assert_eq!(FilterType::from_u8(0), Some(FilterType::None));
        assert_eq!(FilterType::from_u8(4), Some(FilterType::Paeth));
        assert_eq!(FilterType::from_u8(5), None);
        for f in FilterType::ALL {
            assert_eq!(FilterType::from_u8(f as u8), Some(f));
        }
    }

    #[test]
    fn test_paeth_predictor() {
        assert_eq!(paeth_predictor(0, 0, 0), 0);
        assert_eq!(paeth_predictor(100, 100, 100), 100);
        // p = 10 + 20 - 10 = 20: closest to b
        assert_eq!(paeth_predictor(10, 20, 10), 20);
        // p = 10 + 20 - 20 = 10: closest to a
        assert_eq!(paeth_predictor(10, 20, 20), 10);
        // p = 200 + 200 - 0 = 400: a and b tie, a wins
        assert_eq!(paeth_predictor(200, 200, 0), 200);
        // p = 50 + 60 - 255 = -145: a is nearest
        assert_eq!(paeth_predictor(50, 60, 255), 50);
    }

    #[test]
    fn test_paeth_tie_prefers_left() {
        // All three equal: left wins.
        let (left, above, upper_left) = (5u8, 5u8, 5u8);
        assert_eq!(paeth_predictor(left, above, upper_left), left);
        // p = 8, pa = 2, pb = 4, pc = 2: left beats upper-left.
        assert_eq!(paeth_predictor(6, 12, 10), 6);
        // p = 8, pa = 4, pb = 2, pc = 2: above beats upper-left.
        assert_eq!(paeth_predictor(12, 6, 10), 6);
        // p = 6, pa = 2, pb = 2, pc = 0: upper-left strictly closest.
        assert_eq!(paeth_predictor(4, 8, 6), 6);
    }

    #[test]
    fn test_filter_sub_first_pixel_uses_zero_left() {
        let row = [10, 20, 30, 40, 15, 25, 35, 45];
        let mut out = [0u8; 8];
        filter_row(FilterType::Sub, &row, None, 4, &mut out);
        assert_eq!(out, [10, 20, 30, 40, 5, 5, 5, 5]);
    }

    #[test]
    fn test_filter_up_row_zero_is_identity() {
        let row = [1, 2, 3, 4];
        let mut out = [0u8; 4];
        filter_row(FilterType::Up, &row, None, 4, &mut out);
        assert_eq!(out, row);
    }

    #[test]
    fn test_filter_wraps_modulo_256() {
        let prev = [200, 0, 0, 0];
        let row = [10, 0, 0, 0];
        let mut out = [0u8; 4];
        filter_row(FilterType::Up, &row, Some(&prev), 4, &mut out);
        assert_eq!(out[0], 10u8.wrapping_sub(200));
    }

    #[test]
    fn test_average_keeps_ninth_bit() {
        // left = 200, above = 200 -> (400 / 2) = 200, not (144 / 2) = 72
        let prev = [0, 0, 0, 0, 200, 0, 0, 0];
        let row = [200, 0, 0, 0, 210, 0, 0, 0];
        let mut out = [0u8; 8];
        filter_row(FilterType::Average, &row, Some(&prev), 4, &mut out);
        assert_eq!(out[4], 10);
        // first pixel: left = 0, above = 0
        assert_eq!(out[0], 200);
    }

    #[test]
    fn test_filter_roundtrip() {
        let rows: [[u8; 12]; 3] = [
            [255, 0, 0, 255, 254, 1, 3, 255, 0, 128, 7, 9],
            [100, 150, 200, 50, 75, 100, 255, 255, 0, 0, 17, 33],
            [1, 255, 2, 254, 3, 253, 4, 252, 5, 251, 6, 250],
        ];
        for filter in FilterType::ALL {
            let mut prev: Option<&[u8]> = None;
            for row in &rows {
                let mut filtered = [0u8; 12];
                filter_row(filter, row, prev, 4, &mut filtered);
                unfilter_row(filter, &mut filtered, prev, 4);
                assert_eq!(&filtered, row, "Roundtrip failed for {:?}", filter);
                prev = Some(row);
            }
        }
    }

    #[test]
    fn test_cost_uses_prewrap_difference() {
        // Sub residual for byte 4 is 250 - 5 = 245; wrapped-signed would
        // cost 11, pre-wrap costs 245.
        let row = [5, 0, 0, 0, 250, 0, 0, 0];
        assert_eq!(filter_cost(FilterType::Sub, &row, None, 4), 5 + 245);
        assert_eq!(filter_cost(FilterType::None, &row, None, 4), 255);
    }

    #[test]
    fn test_select_sub_for_repeated_pixels() {
        let row = [255, 0, 0, 255, 255, 0, 0, 255];
        assert_eq!(select_filter(&row, None, 4), FilterType::Sub);
    }

    #[test]
    fn test_select_up_for_repeated_rows() {
        let prev = [9, 200, 31, 77, 140, 3, 250, 60];
        assert_eq!(select_filter(&prev, Some(&prev), 4), FilterType::Up);
    }

    #[test]
    fn test_select_ties_keep_first_candidate() {
        // Every candidate costs zero on an all-zero row.
        let row = [0u8; 8];
        assert_eq!(select_filter(&row, None, 4), FilterType::Sub);
        assert_eq!(select_filter(&row, Some(&row), 4), FilterType::Sub);
    }

    #[test]
    fn test_selection_is_deterministic() {
        let data: Vec<u8> = (0..4 * 5 * 6).map(|i| ((i * 37 + i / 7) % 256) as u8).collect();
        let pixels = PixelBuffer::new(5, 6, &data).unwrap();
        let a = filter_image(&pixels, FilterStrategy::Adaptive);
        let b = filter_image(&pixels, FilterStrategy::Adaptive);
        assert_eq!(a, b);
    }

    #[test]
    fn test_filter_image_layout_and_roundtrip() {
        let data: Vec<u8> = (0..4 * 3 * 4).map(|i| (i * 29 % 251) as u8).collect();
        let pixels = PixelBuffer::new(3, 4, &data).unwrap();
        let filtered = filter_image(&pixels, FilterStrategy::Adaptive);
        assert_eq!(filtered.len(), (12 + 1) * 4);

        let mut prev: Option<Vec<u8>> = None;
        for (y, row) in filtered.chunks_exact(13).enumerate() {
            let filter = FilterType::from_u8(row[0]).unwrap();
            assert_ne!(filter, FilterType::None);
            let mut raw = row[1..].to_vec();
            unfilter_row(filter, &mut raw, prev.as_deref(), 4);
            assert_eq!(raw, pixels.scanline(y));
            prev = Some(raw);
        }
    }

    #[test]
    fn test_fixed_strategy() {
        let data = [7u8; 2 * 2 * 4];
        let pixels = PixelBuffer::new(2, 2, &data).unwrap();
        let filtered = filter_image(&pixels, FilterStrategy::None);
        assert_eq!(filtered[0], 0);
        assert_eq!(&filtered[1..9], &[7; 8]);
        assert_eq!(filtered[9], 0);

        let filtered = filter_image(&pixels, FilterStrategy::Paeth);
        assert_eq!(filtered[0], FilterType::Paeth as u8);
        assert_eq!(filtered[9], FilterType::Paeth as u8);
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!("Adaptive".parse::<FilterStrategy>(), Ok(FilterStrategy::Adaptive));
        assert_eq!("avg".parse::<FilterStrategy>(), Ok(FilterStrategy::Average));
        assert!("median".parse::<FilterStrategy>().is_err());
        assert_eq!(FilterStrategy::default(), FilterStrategy::Adaptive);
        assert_eq!(FilterStrategy::Sub.fixed(), Some(FilterType::Sub));
    }
}
