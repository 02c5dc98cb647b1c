//! Split archive support.
//!
//! This module presents an archive stored across several bounded files
//! (volumes) as one seekable stream.
//!
//! # Overview
//!
//! Split archives are useful for:
//! - Storing large archives on media with size limits (floppies, CDs, FAT32)
//! - Splitting archives for easier transfer or upload
//!
//! [`SplitVolumeStream`] performs the virtual-to-physical address translation
//! and owns resize and split semantics. Where the bytes live is decided by a
//! [`VolumeDirectory`]: [`FileVolumeDirectory`] for numbered files on disk and
//! [`MemoryVolumeDirectory`] for in-memory volumes.
//!
//! # Writing a Split Archive
//!
//! ```rust,no_run
//! use std::io::Write;
//! use zipspan::volume::{SplitVolumeStream, VolumeConfig};
//!
//! let config = VolumeConfig::new("backup.zip", 100 * 1024 * 1024);
//! let mut stream = SplitVolumeStream::create(config)?;
//!
//! stream.write_all(b"...")?;
//! let sizes = stream.finish()?;
//! println!("Created {} volumes", sizes.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Reading a Split Archive
//!
//! ```rust,no_run
//! use std::io::Read;
//! use zipspan::volume::{SplitVolumeStream, VolumeConfig};
//!
//! let mut stream = SplitVolumeStream::open(VolumeConfig::new("backup.zip", 0))?;
//! let mut data = Vec::new();
//! stream.read_to_end(&mut data)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Volume Naming Convention
//!
//! - `backup.z01` - First volume
//! - `backup.z02` - Second volume
//! - `backup.z100` - Hundredth volume (the number widens as needed)
//! - `backup.zip` - Last volume, renamed when the write session finishes
//!
//! An archive that fits in one volume ends up as a plain `backup.zip`.

mod config;
mod directory;
mod file;
mod memory;
mod stream;

pub use config::{MIN_PART_SIZE, SizeDiscovery, VolumeConfig, detect_base_path};
pub use directory::VolumeDirectory;
pub use file::FileVolumeDirectory;
pub use memory::MemoryVolumeDirectory;
pub use stream::SplitVolumeStream;
