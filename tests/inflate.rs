//! Deflate entries decoded through legacy-header item streams.
//!
//! ZIP stores deflate data without the zlib framing. These tests produce
//! real zlib output, strip it down to what an archive stores, and check that
//! an item stream with a synthesized header feeds a zlib inflater correctly.

#![cfg(feature = "deflate")]

mod common;

use std::io::{Read, Seek, SeekFrom, Write};

use common::{memory_stream, reopen};
use flate2::Compression;
use flate2::write::ZlibEncoder;
use zipspan::ItemStream;
use zipspan::codec::{DeflateLevel, InflateReader, LEGACY_HEADER_LEN, legacy_header};

/// Trailing Adler-32 checksum of a zlib stream.
const ADLER_LEN: usize = 4;

fn sample_text() -> Vec<u8> {
    b"The quick brown fox jumps over the lazy dog. ".repeat(200)
}

/// Compresses `data` with zlib and returns the full zlib stream.
fn zlib(data: &[u8], level: u32) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(level));
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

#[test]
fn test_synthesized_header_matches_encoder() {
    for level in 1..=9 {
        let framed = zlib(b"header check", level);
        assert_eq!(
            &framed[..LEGACY_HEADER_LEN],
            &legacy_header(DeflateLevel::from_zlib_level(level)),
            "zlib level {}",
            level
        );
    }
}

#[test]
fn test_inflate_entry_from_split_archive() {
    let text = sample_text();
    for level in [1, 5, 6, 9] {
        let framed = zlib(&text, level);
        let raw = &framed[LEGACY_HEADER_LEN..framed.len() - ADLER_LEN];

        let mut stream = memory_stream(64, b"LOCAL HEADER");
        stream.write_all(raw).unwrap();
        let mut stream = reopen(stream);

        // The entry records its level in general purpose bits 1-2
        let flags = DeflateLevel::from_zlib_level(level).to_flags();
        stream.seek(SeekFrom::Start(12)).unwrap();
        let item = ItemStream::reader(&mut stream, raw.len() as u64)
            .unwrap()
            .with_legacy_header(DeflateLevel::from_flags(flags));

        let mut inflater = InflateReader::new(item);
        let mut out = Vec::new();
        inflater.read_to_end(&mut out).unwrap();
        assert_eq!(out, text, "zlib level {}", level);
    }
}

#[test]
fn test_compressor_output_written_through_item_stream() {
    let text = sample_text();
    let framed = zlib(&text, 6);
    let raw_len = framed.len() - LEGACY_HEADER_LEN - ADLER_LEN;

    // The compressor emits the zlib header; the item stream drops it
    let mut stream = memory_stream(64, b"");
    let stored = {
        let mut item = ItemStream::writer(&mut stream)
            .unwrap()
            .with_legacy_header(DeflateLevel::Normal);
        item.write_all(&framed[..framed.len() - ADLER_LEN]).unwrap();
        item.stored_size()
    };
    assert_eq!(stored, raw_len as u64);

    let mut stream = reopen(stream);
    stream.seek(SeekFrom::Start(0)).unwrap();
    let item = ItemStream::reader(&mut stream, stored)
        .unwrap()
        .with_legacy_header(DeflateLevel::Normal);
    let mut inflater = InflateReader::new(item);
    let mut out = Vec::new();
    inflater.read_to_end(&mut out).unwrap();
    assert_eq!(out, text);
    assert_eq!(inflater.total_out(), text.len() as u64);
}
