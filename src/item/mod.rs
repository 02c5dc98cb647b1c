//! Entry-level projection of an owner stream.
//!
//! An [`ItemStream`] presents the raw byte range of one archive entry inside a
//! larger owner stream (often a [`SplitVolumeStream`](crate::volume::SplitVolumeStream)).
//! Positions are logical: offset 0 is wherever the owner was positioned when
//! the item stream was created.
//!
//! Two transforms apply on the way through:
//!
//! - Encryption on write and decryption on read, through the [`Cryptor`] and
//!   [`Decryptor`] capabilities. Which one applies is fixed by [`ItemMode`].
//! - Legacy header synthesis. ZIP stores deflate data without the two-byte
//!   zlib header; with [`ItemStream::with_legacy_header`] a read yields that
//!   header in front of the payload, and a write drops it.
//!
//! # Example
//!
//! ```rust
//! use std::io::{Cursor, Read};
//! use zipspan::codec::DeflateLevel;
//! use zipspan::ItemStream;
//!
//! let mut owner = Cursor::new(b"..payload".to_vec());
//! owner.set_position(2);
//!
//! let mut item = ItemStream::reader(&mut owner, 7)
//!     .unwrap()
//!     .with_legacy_header(DeflateLevel::Normal);
//! let mut data = Vec::new();
//! item.read_to_end(&mut data).unwrap();
//! assert_eq!(data, b"\x78\x9Cpayload");
//! ```

use std::io::{self, Read, Seek, SeekFrom, Write};

use crate::codec::{DeflateLevel, LEGACY_HEADER_LEN, legacy_header};
use crate::crypto::{Cryptor, Decryptor};
use crate::{Error, Result, StreamMode};

/// What an [`ItemStream`] does with the bytes passing through it.
///
/// The variant is chosen at construction and never changes, so a stream
/// cannot hold both a cryptor and a decryptor.
pub enum ItemMode<'c> {
    /// Read stored bytes unchanged.
    PlainRead,
    /// Write bytes unchanged.
    PlainWrite,
    /// Decrypt stored bytes on read.
    Decrypting(Box<dyn Decryptor + 'c>),
    /// Encrypt bytes on write.
    Encrypting(Box<dyn Cryptor + 'c>),
}

impl ItemMode<'_> {
    /// Returns the direction this mode serves.
    pub fn stream_mode(&self) -> StreamMode {
        match self {
            ItemMode::PlainRead | ItemMode::Decrypting(_) => StreamMode::Read,
            ItemMode::PlainWrite | ItemMode::Encrypting(_) => StreamMode::Write,
        }
    }

    /// Returns `true` if a cipher is attached.
    pub fn is_encrypted(&self) -> bool {
        matches!(self, ItemMode::Decrypting(_) | ItemMode::Encrypting(_))
    }
}

impl std::fmt::Debug for ItemMode<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ItemMode::PlainRead => "PlainRead",
            ItemMode::PlainWrite => "PlainWrite",
            ItemMode::Decrypting(_) => "Decrypting",
            ItemMode::Encrypting(_) => "Encrypting",
        })
    }
}

/// A seekable view of one entry's bytes inside an owner stream.
///
/// The owner is borrowed, not owned. Every owner access seeks to
/// `start + offset` first, so the owner may be moved by others between
/// calls; seeking the item stream itself never touches the owner.
pub struct ItemStream<'a, S> {
    owner: &'a mut S,
    mode: ItemMode<'a>,
    start: u64,
    /// Stored payload bytes, excluding any synthesized header.
    size: u64,
    position: u64,
    header: Option<[u8; LEGACY_HEADER_LEN]>,
    scratch: Vec<u8>,
}

impl<'a, S: Seek> ItemStream<'a, S> {
    /// Creates an item stream starting at the owner's current position.
    ///
    /// # Arguments
    ///
    /// * `owner` - The stream holding the entry
    /// * `mode` - Direction and cipher
    /// * `size` - Stored payload size; in write mode, the size already present
    pub fn new(owner: &'a mut S, mode: ItemMode<'a>, size: u64) -> Result<Self> {
        let start = owner.stream_position()?;
        log::debug!(
            "Item stream ({:?}) at owner offset {}, {} bytes",
            mode,
            start,
            size
        );
        Ok(Self {
            owner,
            mode,
            start,
            size,
            position: 0,
            header: None,
            scratch: Vec::new(),
        })
    }

    /// Creates a plain reader over `size` stored bytes.
    pub fn reader(owner: &'a mut S, size: u64) -> Result<Self> {
        Self::new(owner, ItemMode::PlainRead, size)
    }

    /// Creates a reader that decrypts `size` stored bytes.
    pub fn decrypting(
        owner: &'a mut S,
        size: u64,
        decryptor: impl Decryptor + 'a,
    ) -> Result<Self> {
        Self::new(owner, ItemMode::Decrypting(Box::new(decryptor)), size)
    }

    /// Creates a plain writer.
    pub fn writer(owner: &'a mut S) -> Result<Self> {
        Self::new(owner, ItemMode::PlainWrite, 0)
    }

    /// Creates a writer that encrypts everything it stores.
    pub fn encrypting(owner: &'a mut S, cryptor: impl Cryptor + 'a) -> Result<Self> {
        Self::new(owner, ItemMode::Encrypting(Box::new(cryptor)), 0)
    }

    /// Enables legacy header handling for deflate data of the given level.
    ///
    /// A reader yields the two-byte zlib header before the stored payload. A
    /// writer expects its input to start with a zlib header and drops those
    /// two bytes. In both directions the logical size is the stored size
    /// plus two.
    ///
    /// The owner never receives the header: it is neither encrypted nor
    /// written, and a legacy reader rebuilds it from `level`.
    pub fn with_legacy_header(mut self, level: DeflateLevel) -> Self {
        self.header = Some(legacy_header(level));
        self
    }

    /// Returns the stream's direction.
    pub fn mode(&self) -> StreamMode {
        self.mode.stream_mode()
    }

    /// Returns the logical position.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Returns the owner offset the entry starts at.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Returns the number of payload bytes stored in the owner.
    pub fn stored_size(&self) -> u64 {
        self.size
    }

    /// Returns the logical size, counting a synthesized header.
    pub fn logical_size(&self) -> u64 {
        self.size + self.header_len()
    }

    /// Returns `true` if a legacy header is synthesized or dropped.
    pub fn has_legacy_header(&self) -> bool {
        self.header.is_some()
    }

    /// Moves the logical position, clamped to `[0, logical_size]`.
    ///
    /// The owner is not touched until the next read or write.
    pub fn seek_to(&mut self, pos: SeekFrom) -> Result<u64> {
        let size = self.logical_size();
        let target = match pos {
            SeekFrom::Start(offset) => i128::from(offset),
            SeekFrom::Current(delta) => i128::from(self.position) + i128::from(delta),
            SeekFrom::End(delta) => i128::from(size) + i128::from(delta),
        };
        self.position = target.clamp(0, i128::from(size)) as u64;
        Ok(self.position)
    }

    fn header_len(&self) -> u64 {
        if self.header.is_some() {
            LEGACY_HEADER_LEN as u64
        } else {
            0
        }
    }

    /// Maps a logical position at or past the header to an owner offset.
    fn owner_offset(&self, logical: u64) -> u64 {
        self.start + (logical - self.header_len())
    }

    /// Copies synthesized header bytes for the current position into `buf`.
    fn fill_header(&self, buf: &mut [u8]) -> usize {
        match self.header {
            Some(header) if self.position < LEGACY_HEADER_LEN as u64 => {
                let from = self.position as usize;
                let n = (LEGACY_HEADER_LEN - from).min(buf.len());
                buf[..n].copy_from_slice(&header[from..from + n]);
                n
            }
            _ => 0,
        }
    }
}

impl<S: Read + Seek> ItemStream<'_, S> {
    /// Reads entry bytes at the logical position.
    ///
    /// Returns fewer bytes than requested only at the end of the entry or
    /// when the owner returns a partial read.
    pub fn read_data(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.mode.stream_mode() != StreamMode::Read {
            return Err(Error::mode_violation("read", StreamMode::Write));
        }
        let remaining = self.logical_size().saturating_sub(self.position);
        let count = buf.len().min(usize::try_from(remaining).unwrap_or(usize::MAX));
        if count == 0 {
            return Ok(0);
        }

        let mut filled = self.fill_header(&mut buf[..count]);
        if filled > 0 {
            log::trace!("Synthesized {} legacy header byte(s)", filled);
        }

        if filled < count {
            let offset = self.owner_offset(self.position + filled as u64);
            self.owner.seek(SeekFrom::Start(offset))?;
            let want = count - filled;
            let n = match &mut self.mode {
                ItemMode::Decrypting(decryptor) => {
                    self.scratch.clear();
                    self.scratch.resize(want, 0);
                    let n = self.owner.read(&mut self.scratch)?;
                    decryptor.decrypt_buffer(&mut self.scratch[..n]);
                    buf[filled..filled + n].copy_from_slice(&self.scratch[..n]);
                    n
                }
                _ => self.owner.read(&mut buf[filled..count])?,
            };
            if n == 0 && filled == 0 {
                return Err(Error::incomplete("read", want, 0));
            }
            filled += n;
        }

        self.position += filled as u64;
        Ok(filled)
    }
}

impl<S: Write + Seek> ItemStream<'_, S> {
    /// Writes entry bytes at the logical position.
    ///
    /// With a legacy header, bytes falling on logical offsets 0 and 1 are
    /// consumed without being stored.
    pub fn write_data(&mut self, buf: &[u8]) -> Result<usize> {
        if self.mode.stream_mode() != StreamMode::Write {
            return Err(Error::ReadOnlyViolation);
        }
        let skipped = match self.header {
            Some(_) if self.position < LEGACY_HEADER_LEN as u64 => {
                (LEGACY_HEADER_LEN - self.position as usize).min(buf.len())
            }
            _ => 0,
        };
        let payload = &buf[skipped..];

        if !payload.is_empty() {
            let offset = self.owner_offset(self.position + skipped as u64);
            self.owner.seek(SeekFrom::Start(offset))?;
            match &mut self.mode {
                ItemMode::Encrypting(cryptor) => {
                    self.scratch.clear();
                    self.scratch.extend_from_slice(payload);
                    cryptor.encrypt_buffer(&mut self.scratch);
                    self.owner.write_all(&self.scratch)?;
                }
                _ => self.owner.write_all(payload)?,
            }
            let stored_end = offset - self.start + payload.len() as u64;
            self.size = self.size.max(stored_end);
        }

        self.position += buf.len() as u64;
        Ok(buf.len())
    }

    /// Flushes the owner stream.
    pub fn flush_owner(&mut self) -> Result<()> {
        self.owner.flush()?;
        Ok(())
    }
}

impl<S: Read + Seek> Read for ItemStream<'_, S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_data(buf).map_err(Into::into)
    }
}

impl<S: Write + Seek> Write for ItemStream<'_, S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_data(buf).map_err(Into::into)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_owner().map_err(Into::into)
    }
}

impl<S: Seek> Seek for ItemStream<'_, S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.seek_to(pos).map_err(Into::into)
    }
}

impl<S> std::fmt::Debug for ItemStream<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemStream")
            .field("mode", &self.mode)
            .field("start", &self.start)
            .field("size", &self.size)
            .field("position", &self.position)
            .field("legacy_header", &self.header.is_some())
            .finish_non_exhaustive()
    }
}
