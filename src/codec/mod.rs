//! Deflate method support for item streams.
//!
//! ZIP stores deflate data raw, without the two-byte zlib header a zlib
//! inflater expects. When an entry is handed to such an inflater, the item
//! stream rebuilds the header from the entry's general purpose flags with
//! [`legacy_header`].
//!
//! With the `deflate` feature, [`InflateReader`] chains that reconstruction
//! with a zlib decoder.

#[cfg(feature = "deflate")]
mod deflate;

#[cfg(feature = "deflate")]
pub use deflate::InflateReader;

/// Compression method nibble of the zlib header (deflate).
pub const METHOD_DEFLATE: u8 = 8;

/// Window size nibble of the zlib header: 2^(7 + 8) = 32 KiB.
pub const WINDOW_32K: u8 = 7;

/// Length of the synthesized zlib header.
pub const LEGACY_HEADER_LEN: usize = 2;

/// Deflate compression level class.
///
/// A ZIP entry records the level its deflate data was produced with in bits
/// 1 and 2 of the general purpose flag; zlib records it in the `FLEVEL`
/// field of its header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeflateLevel {
    /// Fastest algorithm (zlib level 1).
    SuperFast,
    /// Fast algorithm (zlib levels 2-5).
    Fast,
    /// Default algorithm (zlib level 6).
    #[default]
    Normal,
    /// Maximum compression (zlib levels 7-9).
    Maximum,
}

impl DeflateLevel {
    /// Classifies a ZIP general purpose bit flag.
    ///
    /// | bit 2 | bit 1 | level |
    /// |-------|-------|-------|
    /// | 0 | 0 | normal |
    /// | 0 | 1 | maximum |
    /// | 1 | 0 | fast |
    /// | 1 | 1 | superfast |
    pub fn from_flags(general_purpose: u16) -> Self {
        match (general_purpose >> 1) & 0b11 {
            0b00 => DeflateLevel::Normal,
            0b01 => DeflateLevel::Maximum,
            0b10 => DeflateLevel::Fast,
            _ => DeflateLevel::SuperFast,
        }
    }

    /// Returns the general purpose flag bits for this level.
    pub fn to_flags(self) -> u16 {
        match self {
            DeflateLevel::Normal => 0b000,
            DeflateLevel::Maximum => 0b010,
            DeflateLevel::Fast => 0b100,
            DeflateLevel::SuperFast => 0b110,
        }
    }

    /// Returns the zlib `FLEVEL` value (0-3).
    pub fn zlib_flevel(self) -> u8 {
        match self {
            DeflateLevel::SuperFast => 0,
            DeflateLevel::Fast => 1,
            DeflateLevel::Normal => 2,
            DeflateLevel::Maximum => 3,
        }
    }

    /// Returns the class a zlib compression level (0-9) belongs to.
    pub fn from_zlib_level(level: u32) -> Self {
        match level {
            0 | 1 => DeflateLevel::SuperFast,
            2..=5 => DeflateLevel::Fast,
            6 => DeflateLevel::Normal,
            _ => DeflateLevel::Maximum,
        }
    }
}

/// Builds the two-byte zlib header for deflate data of the given level.
///
/// The header is what a standard zlib writer emits: method 8 with a 32 KiB
/// window in the first byte, the level in bits 6-7 of the second, and a
/// check value making the big-endian 16-bit word a multiple of 31.
///
/// ```rust
/// use zipspan::codec::{DeflateLevel, legacy_header};
///
/// assert_eq!(legacy_header(DeflateLevel::Normal), [0x78, 0x9C]);
/// ```
pub fn legacy_header(level: DeflateLevel) -> [u8; LEGACY_HEADER_LEN] {
    let cmf = u16::from((WINDOW_32K << 4) | METHOD_DEFLATE);
    let mut header = (cmf << 8) | (u16::from(level.zlib_flevel()) << 6);
    let remainder = header % 31;
    if remainder != 0 {
        header += 31 - remainder;
    }
    header.to_be_bytes()
}
