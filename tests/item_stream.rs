//! Item stream integration tests.
//!
//! Entries are written through item streams layered on split streams, the
//! volumes are reopened, and the entries are read back through item streams
//! again, exercising positioning relative to the entry start across volume
//! boundaries.

mod common;

use std::io::{Read, Seek, SeekFrom, Write};

use common::{memory_stream, pattern, reopen};
use zipspan::codec::{DeflateLevel, legacy_header};
use zipspan::volume::{MemoryVolumeDirectory, SplitVolumeStream};
use zipspan::{Error, ItemMode, ItemStream, StreamMode};

/// Volumes small enough that every entry crosses at least one boundary.
const PART_SIZE: u64 = 64;

/// Writes `prefix` directly, then `entry` through a plain item stream.
///
/// Returns the entry's start offset and stored size.
fn write_entry(
    stream: &mut SplitVolumeStream<MemoryVolumeDirectory>,
    prefix: &[u8],
    entry: &[u8],
) -> (u64, u64) {
    stream.write_all(prefix).unwrap();
    let mut item = ItemStream::writer(stream).unwrap();
    item.write_all(entry).unwrap();
    (item.start(), item.stored_size())
}

#[test]
fn test_plain_entry_across_volumes() {
    let mut stream = memory_stream(PART_SIZE, b"");
    let entry = pattern(200);
    let (start, size) = write_entry(&mut stream, b"LOCAL HEADER", &entry);
    assert_eq!((start, size), (12, 200));
    assert_eq!(stream.volume_sizes(), vec![64, 64, 64, 20]);

    let mut stream = reopen(stream);
    stream.seek(SeekFrom::Start(start)).unwrap();
    let mut item = ItemStream::reader(&mut stream, size).unwrap();
    let mut data = Vec::new();
    item.read_to_end(&mut data).unwrap();
    assert_eq!(data, entry);
}

#[test]
fn test_entries_are_independent() {
    let mut stream = memory_stream(PART_SIZE, b"");
    let first = pattern(90);
    let second = b"second entry".repeat(8);
    let (first_start, first_size) = write_entry(&mut stream, b"H1", &first);
    let (second_start, second_size) = write_entry(&mut stream, b"H2", &second);
    assert_eq!(second_start, first_start + first_size + 2);

    let mut stream = reopen(stream);

    // Read the second entry first; each item stream positions the owner itself
    stream.seek(SeekFrom::Start(second_start)).unwrap();
    let mut item = ItemStream::reader(&mut stream, second_size).unwrap();
    let mut data = Vec::new();
    item.read_to_end(&mut data).unwrap();
    assert_eq!(data, second);
    drop(item);

    stream.seek(SeekFrom::Start(first_start)).unwrap();
    let mut item = ItemStream::reader(&mut stream, first_size).unwrap();
    item.seek(SeekFrom::Start(50)).unwrap();
    let mut tail = Vec::new();
    item.read_to_end(&mut tail).unwrap();
    assert_eq!(tail, &first[50..]);
}

#[test]
fn test_legacy_header_over_split_stream() {
    let mut stream = memory_stream(PART_SIZE, b"");
    let payload = pattern(100);
    let mut framed = legacy_header(DeflateLevel::Fast).to_vec();
    framed.extend_from_slice(&payload);

    stream.write_all(b"HDR").unwrap();
    let size = {
        let mut item = ItemStream::writer(&mut stream)
            .unwrap()
            .with_legacy_header(DeflateLevel::Fast);
        item.write_all(&framed).unwrap();
        assert_eq!(item.logical_size(), 102);
        item.stored_size()
    };
    assert_eq!(size, 100);
    assert_eq!(stream.total_size(), 103);

    let mut stream = reopen(stream);
    stream.seek(SeekFrom::Start(3)).unwrap();
    let mut item = ItemStream::reader(&mut stream, size)
        .unwrap()
        .with_legacy_header(DeflateLevel::from_flags(0x0004));
    let mut data = Vec::new();
    item.read_to_end(&mut data).unwrap();
    assert_eq!(data, framed);
}

#[test]
fn test_owner_errors_keep_their_type() {
    // A write-mode owner refuses reads; the item stream reports the owner's error
    let mut stream = memory_stream(PART_SIZE, &pattern(10));
    stream.seek(SeekFrom::Start(0)).unwrap();
    let mut item = ItemStream::reader(&mut stream, 10).unwrap();
    let mut buf = [0u8; 4];
    assert!(matches!(
        item.read_data(&mut buf),
        Err(Error::ModeViolation {
            operation: "read",
            mode: StreamMode::Write
        })
    ));
}

#[test]
fn test_entry_truncated_by_end_of_archive() {
    let stream = memory_stream(PART_SIZE, &pattern(100));
    let mut stream = reopen(stream);
    stream.seek(SeekFrom::Start(90)).unwrap();

    let mut item = ItemStream::reader(&mut stream, 50).unwrap();
    let mut buf = [0u8; 50];
    assert_eq!(item.read_data(&mut buf).unwrap(), 10);
    assert!(matches!(
        item.read_data(&mut buf),
        Err(Error::IncompleteIo { .. })
    ));
}

#[test]
fn test_item_streams_reject_wrong_direction() {
    let mut stream = memory_stream(PART_SIZE, b"");
    let mut item = ItemStream::new(&mut stream, ItemMode::PlainWrite, 0).unwrap();
    let mut buf = [0u8; 1];
    assert!(item.read(&mut buf).is_err());
    drop(item);

    let mut stream = reopen(memory_stream(PART_SIZE, b"abc"));
    let mut item = ItemStream::reader(&mut stream, 3).unwrap();
    let err = item.write(b"x").unwrap_err();
    let typed = err.get_ref().and_then(|e| e.downcast_ref::<Error>());
    assert!(matches!(typed, Some(Error::ReadOnlyViolation)));
}

#[cfg(feature = "zipcrypto")]
mod zipcrypto {
    use super::*;
    use zipspan::checksum::Crc32;
    use zipspan::crypto::{ENCRYPTION_HEADER_LEN, ZipCryptor, ZipDecryptor};

    const PASSWORD: &[u8] = b"correct horse";

    /// Writes one encrypted entry and returns (start of encryption header,
    /// stored size, check byte).
    fn write_encrypted(
        stream: &mut SplitVolumeStream<MemoryVolumeDirectory>,
        entry: &[u8],
    ) -> (u64, u64, u8) {
        let check = (Crc32::compute(entry) >> 24) as u8;
        let start = stream.position();

        let mut cryptor = ZipCryptor::new(PASSWORD);
        let header = cryptor.encryption_header(rand::random::<[u8; 11]>(), check);
        stream.write_all(&header).unwrap();

        let mut item = ItemStream::encrypting(stream, cryptor).unwrap();
        for chunk in entry.chunks(17) {
            item.write_all(chunk).unwrap();
        }
        let stored = ENCRYPTION_HEADER_LEN as u64 + item.stored_size();
        (start, stored, check)
    }

    #[test]
    fn test_encrypted_entry_roundtrip() {
        let entry = pattern(300);
        let mut stream = memory_stream(PART_SIZE, b"PK\x03\x04");
        let (start, stored, check) = write_encrypted(&mut stream, &entry);
        assert_eq!(stored, 312);

        let mut stream = reopen(stream);
        stream.seek(SeekFrom::Start(start)).unwrap();
        let mut header = [0u8; ENCRYPTION_HEADER_LEN];
        stream.read_exact(&mut header).unwrap();

        let mut decryptor = ZipDecryptor::new(PASSWORD);
        assert!(decryptor.verify_header(&header, check));

        let mut item = ItemStream::decrypting(
            &mut stream,
            stored - ENCRYPTION_HEADER_LEN as u64,
            decryptor,
        )
        .unwrap();
        let mut data = Vec::new();
        let mut chunk = [0u8; 23];
        loop {
            let n = item.read(&mut chunk).unwrap();
            if n == 0 {
                break;
            }
            data.extend_from_slice(&chunk[..n]);
        }
        assert_eq!(data, entry);
    }

    #[test]
    fn test_stored_bytes_are_encrypted() {
        let entry = vec![0u8; 128];
        let mut stream = memory_stream(PART_SIZE, b"");
        write_encrypted(&mut stream, &entry);

        let mut stream = reopen(stream);
        stream.seek(SeekFrom::Start(ENCRYPTION_HEADER_LEN as u64)).unwrap();
        let mut stored = vec![0u8; 128];
        stream.read_exact(&mut stored).unwrap();
        assert_ne!(stored, entry);
    }

    #[test]
    fn test_wrong_password_garbles_entry() {
        let entry = pattern(64);
        let mut stream = memory_stream(PART_SIZE, b"");
        let (start, stored, check) = write_encrypted(&mut stream, &entry);

        let mut stream = reopen(stream);
        stream.seek(SeekFrom::Start(start)).unwrap();
        let mut header = [0u8; ENCRYPTION_HEADER_LEN];
        stream.read_exact(&mut header).unwrap();

        // The check byte alone lets a wrong password through 1 time in 256
        let mut decryptor = ZipDecryptor::new(b"wrong password");
        let _ = decryptor.verify_header(&header, check);

        let size = stored - ENCRYPTION_HEADER_LEN as u64;
        let mut item = ItemStream::decrypting(&mut stream, size, decryptor).unwrap();
        let mut data = Vec::new();
        item.read_to_end(&mut data).unwrap();
        assert_ne!(data, entry);
    }
}
