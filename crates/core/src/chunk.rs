//! PNG chunk framing.
//!
//! ```text
//! +----------------+----------------+------------------+----------------+
//! | length (u32 BE)| type (4 bytes) | payload (length) | CRC32 (u32 BE) |
//! +----------------+----------------+------------------+----------------+
//! ```
//!
//! The CRC covers type + payload, never the length field.

use std::fmt;

use crate::error::{EncodeError, Result};

/// Framing overhead of every chunk: length + type + CRC.
pub const CHUNK_OVERHEAD: usize = 12;

/// Four-byte chunk type tag.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkType(pub [u8; 4]);

impl ChunkType {
    /// Image header.
    pub const IHDR: ChunkType = ChunkType(*b"IHDR");
    /// Image data.
    pub const IDAT: ChunkType = ChunkType(*b"IDAT");
    /// Image trailer.
    pub const IEND: ChunkType = ChunkType(*b"IEND");

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Tag as a big-endian integer (`IHDR` = `0x4948_4452`).
    pub fn to_u32(self) -> u32 {
        u32::from_be_bytes(self.0)
    }
}

impl fmt::Debug for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkType({})", String::from_utf8_lossy(&self.0))
    }
}

/// CRC-32 (ISO-HDLC, as used by PNG and zlib) of `bytes`, continuing from
/// `seed`. A seed of 0 starts a fresh checksum.
pub fn crc32(seed: u32, bytes: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new_with_initial(seed);
    hasher.update(bytes);
    hasher.finalize()
}

/// Framed size of a chunk carrying `payload_len` bytes.
pub fn chunk_len(payload_len: usize) -> usize {
    payload_len + CHUNK_OVERHEAD
}

/// Append one framed chunk to `out`.
pub fn write_chunk(out: &mut Vec<u8>, chunk_type: ChunkType, data: &[u8]) -> Result<()> {
    let len = u32::try_from(data.len()).map_err(|_| EncodeError::ChunkTooLarge(data.len()))?;
    out.reserve(chunk_len(data.len()));
    out.extend_from_slice(&len.to_be_bytes());

    // CRC over type + data, read back from the output
    let crc_start = out.len();
    out.extend_from_slice(chunk_type.as_bytes());
    out.extend_from_slice(data);
    let crc = crc32(0, &out[crc_start..]);
    out.extend_from_slice(&crc.to_be_bytes());
    Ok(())
}

/// Frame `data` as a standalone chunk of `data.len() + 12` bytes.
pub fn make_chunk(chunk_type: ChunkType, data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(chunk_len(data.len()));
    write_chunk(&mut out, chunk_type, data)?;
    Ok(out)
}
