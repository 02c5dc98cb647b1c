//! Fuzz target for item stream reads with a synthesized legacy header.
//!
//! Run with: cargo +nightly fuzz run item_stream
//!
//! The first two bytes pick the general purpose flags, the read size and the
//! entry offset; the rest is the stored payload. Reads in arbitrary chunk
//! sizes must always yield the zlib header followed by the payload, and
//! inflating must fail cleanly rather than panic.

#![no_main]

use std::io::{Cursor, Read};

use libfuzzer_sys::fuzz_target;
use zipspan::ItemStream;
use zipspan::codec::{DeflateLevel, InflateReader, legacy_header};

fuzz_target!(|data: &[u8]| {
    let [flags, chunk, payload @ ..] = data else {
        return;
    };
    let level = DeflateLevel::from_flags(u16::from(*flags));
    let chunk = usize::from(*chunk % 32) + 1;
    let offset = u64::from(*flags >> 3);

    let mut stored = vec![0u8; offset as usize];
    stored.extend_from_slice(payload);
    let mut owner = Cursor::new(stored);
    owner.set_position(offset);

    let mut item = ItemStream::reader(&mut owner, payload.len() as u64)
        .expect("reader")
        .with_legacy_header(level);
    let mut out = Vec::new();
    let mut buf = vec![0u8; chunk];
    loop {
        let n = item.read(&mut buf).expect("read");
        if n == 0 {
            break;
        }
        out.extend_from_slice(&buf[..n]);
    }
    assert_eq!(&out[..2], &legacy_header(level));
    assert_eq!(&out[2..], payload);
    drop(item);

    owner.set_position(offset);
    let item = ItemStream::reader(&mut owner, payload.len() as u64)
        .expect("reader")
        .with_legacy_header(level);
    let mut sink = Vec::new();
    let _ = InflateReader::new(item).take(1 << 20).read_to_end(&mut sink);
});
