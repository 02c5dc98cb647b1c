//! Zlib inflation over item streams.

use std::io::{self, Read};

use flate2::read::DeflateDecoder;

use super::LEGACY_HEADER_LEN;

/// Compression method nibble of a zlib header that announces deflate.
const DEFLATE_METHOD: u8 = 8;

/// Preset dictionary flag of a zlib header.
const PRESET_DICTIONARY: u8 = 0x20;

/// Inflates deflate data read through a zlib-framed source.
///
/// The source is usually an [`ItemStream`](crate::item::ItemStream) opened
/// with a legacy header, which prepends the zlib header the stored entry
/// lacks. The header is checked on the first read and the deflate body is
/// decoded up to its final block. ZIP entries carry no Adler-32 trailer, so
/// none is read.
pub struct InflateReader<R> {
    inner: DeflateDecoder<R>,
    header_checked: bool,
}

impl<R> std::fmt::Debug for InflateReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InflateReader")
            .field("header_checked", &self.header_checked)
            .field("total_in", &self.inner.total_in())
            .field("total_out", &self.inner.total_out())
            .finish_non_exhaustive()
    }
}

impl<R: Read> InflateReader<R> {
    /// Creates a new inflater.
    ///
    /// # Arguments
    ///
    /// * `input` - A source yielding a zlib header followed by deflate data
    pub fn new(input: R) -> Self {
        Self {
            inner: DeflateDecoder::new(input),
            header_checked: false,
        }
    }

    /// Returns the number of compressed bytes consumed, header included.
    pub fn total_in(&self) -> u64 {
        let header = if self.header_checked {
            LEGACY_HEADER_LEN as u64
        } else {
            0
        };
        header + self.inner.total_in()
    }

    /// Returns the number of bytes produced.
    pub fn total_out(&self) -> u64 {
        self.inner.total_out()
    }

    /// Consumes the inflater and returns the source.
    pub fn into_inner(self) -> R {
        self.inner.into_inner()
    }

    /// Reads the zlib header off the source before the decoder sees it.
    fn check_header(&mut self) -> io::Result<()> {
        let mut header = [0u8; LEGACY_HEADER_LEN];
        self.inner.get_mut().read_exact(&mut header)?;
        let [cmf, flg] = header;

        if cmf & 0x0F != DEFLATE_METHOD || u16::from_be_bytes(header) % 31 != 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("invalid zlib header {:02X}{:02X}", cmf, flg),
            ));
        }
        if flg & PRESET_DICTIONARY != 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "zlib preset dictionaries are not supported",
            ));
        }
        self.header_checked = true;
        Ok(())
    }
}

impl<R: Read> Read for InflateReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.header_checked {
            self.check_header()?;
        }
        self.inner.read(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{DeflateLevel, legacy_header};
    use flate2::Compression;
    use flate2::write::{DeflateEncoder, ZlibEncoder};
    use std::io::Write;

    fn raw_deflate(data: &[u8], level: u32) -> Vec<u8> {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::new(level));
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_inflate_with_synthesized_header() {
        let data = b"Hello, World! Hello, World! Hello, World!".repeat(20);
        for level in [1, 4, 6, 9] {
            let mut framed = legacy_header(DeflateLevel::from_zlib_level(level)).to_vec();
            framed.extend(raw_deflate(&data, level));

            let mut reader = InflateReader::new(&framed[..]);
            let mut out = Vec::new();
            reader.read_to_end(&mut out).unwrap();
            assert_eq!(out, data);
            assert_eq!(reader.total_out(), data.len() as u64);
        }
    }

    #[test]
    fn test_inflate_stops_without_adler_trailer() {
        let data = b"stored entries end after the final deflate block".repeat(40);
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(6));
        encoder.write_all(&data).unwrap();
        let mut zlib = encoder.finish().unwrap();
        zlib.truncate(zlib.len() - 4);

        let mut reader = InflateReader::new(&zlib[..]);
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, data);
        assert_eq!(reader.total_in(), zlib.len() as u64);
    }

    #[test]
    fn test_inflate_rejects_bad_header_check() {
        let mut framed = vec![0x78, 0x9D];
        framed.extend(raw_deflate(b"abc", 6));
        let err = InflateReader::new(&framed[..])
            .read_to_end(&mut Vec::new())
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_inflate_rejects_preset_dictionary() {
        // 0x78BB passes the check but sets FDICT
        let framed = [0x78, 0xBB, 0, 0, 0, 0];
        let err = InflateReader::new(&framed[..])
            .read_to_end(&mut Vec::new())
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_inflate_rejects_missing_header() {
        let data = raw_deflate(&[7u8; 512], 6);
        let mut reader = InflateReader::new(&data[..]);
        let mut out = Vec::new();
        assert!(reader.read_to_end(&mut out).is_err());
    }
}
