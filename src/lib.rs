//! # zipspan
//!
//! Stream plumbing for ZIP archive engines: split archives and per-entry
//! transforms.
//!
//! This crate provides the two streams an archive reader or writer sits on:
//!
//! - [`SplitVolumeStream`] presents an archive stored across numbered volume
//!   files (`archive.z01`, `archive.z02`, ..., `archive.zip`) as one seekable
//!   byte stream, creating, trimming and renaming volumes as the archive is
//!   written.
//! - [`ItemStream`] presents one entry's bytes inside an owner stream,
//!   decrypting on read, encrypting on write, and optionally synthesizing the
//!   zlib header that ZIP strips from deflate data.
//!
//! ## Quick Start
//!
//! ### Writing a Split Archive
//!
//! ```rust,no_run
//! use std::io::Write;
//! use zipspan::{Result, SplitVolumeStream, VolumeConfig};
//!
//! fn main() -> Result<()> {
//!     // 1.44 MB volumes
//!     let mut stream = SplitVolumeStream::create(VolumeConfig::floppy("backup.zip"))?;
//!     stream.write_all(&vec![0u8; 4_000_000])?;
//!
//!     // Deletes empty trailing volumes and renames the last one to backup.zip
//!     let sizes = stream.finish()?;
//!     println!("{} volumes", sizes.len());
//!     Ok(())
//! }
//! ```
//!
//! ### Reading an Encrypted Entry
//!
//! ```rust,ignore
//! use std::io::{Read, Seek, SeekFrom};
//! use zipspan::crypto::ZipDecryptor;
//! use zipspan::{ItemStream, Result, SplitVolumeStream, VolumeConfig};
//!
//! fn main() -> Result<()> {
//!     let mut archive = SplitVolumeStream::open(VolumeConfig::new("backup.zip", 0))?;
//!
//!     // Offset and size come from the entry's local header
//!     archive.seek(SeekFrom::Start(42))?;
//!     let mut item = ItemStream::decrypting(&mut archive, 1024, ZipDecryptor::new(b"secret"))?;
//!
//!     let mut data = Vec::new();
//!     item.read_to_end(&mut data)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `deflate` | Yes | [`codec::InflateReader`] over legacy-header item streams |
//! | `zipcrypto` | Yes | Traditional PKWARE encryption |
//!
//! ## Error Handling
//!
//! Inherent stream methods return [`Result<T>`], which uses the [`Error`] type.
//! The streams also implement the [`std::io`] traits; errors surfacing
//! through them carry the typed [`Error`], recoverable by downcasting.
//!
//! ```rust,no_run
//! use zipspan::{Error, SplitVolumeStream, VolumeConfig};
//!
//! match SplitVolumeStream::open(VolumeConfig::new("backup.zip", 0)) {
//!     Ok(stream) => println!("{} bytes", stream.total_size()),
//!     Err(Error::VolumeMissing { volume, path, .. }) => {
//!         println!("Insert volume {} ({})", volume, path);
//!     }
//!     Err(e) => println!("Error: {}", e),
//! }
//! ```
//!
//! ## Concurrency
//!
//! All streams are synchronous and hold no locks. Drive one stream from one
//! caller at a time; a [`SplitVolumeStream`] keeps at most one volume file
//! open.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod checksum;
pub mod codec;
pub mod crypto;
pub mod error;
pub mod item;
pub mod mode;
pub mod probe;
pub mod volume;

pub use error::{Error, Result};
pub use item::{ItemMode, ItemStream};
pub use mode::StreamMode;
pub use probe::SizeProbe;

// Re-export volume API at crate root for convenience
pub use volume::{SizeDiscovery, SplitVolumeStream, VolumeConfig, VolumeDirectory};
