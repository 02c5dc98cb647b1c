//! Shared test utilities for integration tests.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use zipspan::volume::{MemoryVolumeDirectory, SplitVolumeStream};
use zipspan::{VolumeConfig, VolumeDirectory};

/// Returns `len` bytes where byte `i` is `i % 251`.
///
/// 251 is prime, so the pattern never lines up with volume sizes and a byte
/// read from the wrong offset is detected.
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// Writes `data` through a file-backed split stream and finishes the session.
///
/// Returns the archive's base path and the final volume sizes.
pub fn write_split_archive(dir: &Path, name: &str, part_size: u64, data: &[u8]) -> (PathBuf, Vec<u64>) {
    let base_path = dir.join(name);
    let mut stream = SplitVolumeStream::create(VolumeConfig::new(&base_path, part_size)).unwrap();
    stream.write_all(data).unwrap();
    let sizes = stream.finish().unwrap();
    (base_path, sizes)
}

/// Writes `data` through an in-memory split stream.
pub fn memory_stream(part_size: u64, data: &[u8]) -> SplitVolumeStream<MemoryVolumeDirectory> {
    let mut stream = SplitVolumeStream::new(MemoryVolumeDirectory::new(part_size).unwrap()).unwrap();
    stream.write_all(data).unwrap();
    stream
}

/// Finalizes a write session and reopens its volumes for reading.
pub fn reopen(stream: SplitVolumeStream<MemoryVolumeDirectory>) -> SplitVolumeStream<MemoryVolumeDirectory> {
    let mut directory = stream.into_directory();
    directory.finalize_write().unwrap();
    let volumes = directory.into_volumes();
    SplitVolumeStream::new(MemoryVolumeDirectory::from_volumes(volumes)).unwrap()
}

/// Reads everything from the start of a stream.
pub fn read_all<S: Read + Seek>(stream: &mut S) -> Vec<u8> {
    stream.seek(SeekFrom::Start(0)).unwrap();
    let mut data = Vec::new();
    stream.read_to_end(&mut data).unwrap();
    data
}

/// Returns the per-volume sizes reported by a directory.
pub fn sizes_of<D: VolumeDirectory>(directory: &D) -> Vec<u64> {
    directory.volume_sizes()
}
