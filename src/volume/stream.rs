//! A single seekable stream over an ordered set of volumes.

use std::io::{self, Read, Seek, SeekFrom, Write};

use super::{FileVolumeDirectory, VolumeConfig, VolumeDirectory};
use crate::{Error, Result, StreamMode};

/// A stream that presents a sequence of bounded volumes as one continuous
/// byte range.
///
/// The stream keeps one virtual position and maps it onto whichever volume
/// contains it, crossing volume boundaries transparently. Volume storage is
/// supplied by a [`VolumeDirectory`].
///
/// In write mode, volumes are filled up to the directory's part size and new
/// volumes are created on demand. Volumes other than the last never grow: a
/// write positioned inside them can only overwrite existing bytes.
///
/// The mode comes from the directory and never changes. Reads fail on a
/// write stream and writes fail on a read stream.
///
/// # Example
///
/// ```rust
/// use std::io::{Read, Seek, SeekFrom, Write};
/// use zipspan::volume::{MemoryVolumeDirectory, SplitVolumeStream};
///
/// let mut writer = SplitVolumeStream::new(MemoryVolumeDirectory::new(100)?)?;
/// let data: Vec<u8> = (0..250).map(|i| i as u8).collect();
/// writer.write_all(&data)?;
/// assert_eq!(writer.volume_sizes(), vec![100, 100, 50]);
///
/// let volumes = writer.into_directory().into_volumes();
/// let mut reader = SplitVolumeStream::new(MemoryVolumeDirectory::from_volumes(volumes))?;
/// reader.seek_volume(1, 30)?;
/// let mut buf = [0u8; 10];
/// reader.read_exact(&mut buf)?;
/// assert_eq!(buf[0], 130);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct SplitVolumeStream<D: VolumeDirectory> {
    directory: D,
    mode: StreamMode,
    /// Virtual position, always within `0..=total_size`.
    position: u64,
    /// Cumulative start offset of each volume.
    starts: Vec<u64>,
    total_size: u64,
}

impl<D: VolumeDirectory> SplitVolumeStream<D> {
    /// Creates a stream over the volumes of `directory`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VolumeNotFound`] if a read-mode directory has no
    /// volumes.
    pub fn new(directory: D) -> Result<Self> {
        let mode = directory.mode();
        if mode.is_read() && directory.volume_count() == 0 {
            return Err(Error::VolumeNotFound { index: 0 });
        }

        let mut stream = Self {
            directory,
            mode,
            position: 0,
            starts: Vec::new(),
            total_size: 0,
        };
        stream.refresh_table();
        Ok(stream)
    }

    /// Returns the mode of the stream.
    pub fn mode(&self) -> StreamMode {
        self.mode
    }

    /// Returns the current virtual position.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Returns the total size across all volumes.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Returns the number of volumes.
    pub fn volume_count(&self) -> usize {
        self.starts.len()
    }

    /// Returns the size of every volume, in order.
    pub fn volume_sizes(&self) -> Vec<u64> {
        self.directory.volume_sizes()
    }

    /// Returns the underlying volume directory.
    pub fn directory(&self) -> &D {
        &self.directory
    }

    /// Consumes the stream and returns the volume directory.
    pub fn into_directory(self) -> D {
        self.directory
    }

    /// Reads up to `buf.len()` bytes, continuing across volume boundaries.
    ///
    /// Returns fewer bytes than requested only at the end of the data.
    ///
    /// # Errors
    ///
    /// - [`Error::ModeViolation`] if the stream is in write mode
    /// - [`Error::IncompleteIo`] if a volume returns no data where data is
    ///   expected
    pub fn read_data(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.require(StreamMode::Read, "read")?;

        let mut done = 0;
        while done < buf.len() && self.position < self.total_size {
            let (index, offset) = self.locate(self.position)?;
            let available = self.directory.volume_size(index).saturating_sub(offset);
            if available == 0 {
                return Err(Error::incomplete("read", buf.len() - done, 0));
            }
            let want = available.min((buf.len() - done) as u64) as usize;

            let volume = self.directory.open_volume(index)?;
            volume.seek(SeekFrom::Start(offset))?;
            let n = volume.read(&mut buf[done..done + want])?;
            if n == 0 {
                return Err(Error::incomplete("read", want, 0));
            }

            done += n;
            self.position += n as u64;
        }

        if done > 0 && done < buf.len() {
            log::trace!("short read of {} bytes at end of data", done);
        }
        Ok(done)
    }

    /// Writes all of `buf`, filling the current volume up to the part size
    /// and continuing in the next volume.
    ///
    /// # Errors
    ///
    /// - [`Error::ModeViolation`] if the stream is in read mode
    /// - [`Error::IncompleteIo`] if a volume accepts fewer bytes than offered
    pub fn write_data(&mut self, buf: &[u8]) -> Result<usize> {
        self.require(StreamMode::Write, "write")?;

        let mut done = 0;
        while done < buf.len() {
            let (index, offset) = self.write_target()?;
            let room = self.capacity(index).saturating_sub(offset);
            let want = room.min((buf.len() - done) as u64) as usize;

            let volume = self.directory.open_volume(index)?;
            volume.seek(SeekFrom::Start(offset))?;
            let n = volume.write(&buf[done..done + want])?;

            // Media such as memory buffers grow during the write itself, so
            // compare against the table rather than the directory
            let end = offset + n as u64;
            if end > self.table_size(index) {
                self.directory.record_size(index, end);
                self.refresh_table();
            }
            done += n;
            self.position += n as u64;

            if n < want {
                return Err(Error::incomplete("write", want, n));
            }
        }
        Ok(done)
    }

    /// Moves the virtual position.
    ///
    /// The target is clamped into `0..=total_size`. The volume containing the
    /// new position is opened and positioned at the matching offset.
    pub fn seek_to(&mut self, pos: SeekFrom) -> Result<u64> {
        let target = match pos {
            SeekFrom::Start(p) => i128::from(p),
            SeekFrom::End(p) => i128::from(self.total_size) + i128::from(p),
            SeekFrom::Current(p) => i128::from(self.position) + i128::from(p),
        };
        self.position = target.clamp(0, i128::from(self.total_size)) as u64;

        if !self.starts.is_empty() {
            let (index, offset) = self.locate(self.position)?;
            let volume = self.directory.open_volume(index)?;
            volume.seek(SeekFrom::Start(offset))?;
        }
        Ok(self.position)
    }

    /// Moves to `offset` bytes into volume `volume_index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VolumeNotFound`] if the volume does not exist.
    pub fn seek_volume(&mut self, volume_index: usize, offset: u64) -> Result<u64> {
        let start = *self
            .starts
            .get(volume_index)
            .ok_or(Error::VolumeNotFound {
                index: volume_index,
            })?;
        self.seek_to(SeekFrom::Start(start.saturating_add(offset)))
    }

    /// Resizes the stream to `new_size` bytes.
    ///
    /// Shrinking moves the position to `new_size`, truncates the volume that
    /// contains it and deletes every later volume. Growing zero-fills the last
    /// volume up to the part size and then adds full volumes until the size
    /// is reached; the position is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModeViolation`] if the stream is in read mode.
    pub fn set_size(&mut self, new_size: u64) -> Result<()> {
        self.require(StreamMode::Write, "resize")?;

        if new_size < self.total_size {
            self.shrink(new_size)
        } else if new_size > self.total_size {
            self.grow(new_size)
        } else {
            Ok(())
        }
    }

    /// Closes the current volume and continues in a new one.
    ///
    /// Used to make an archive record start at the beginning of a volume.
    /// Nothing happens when the current volume is still empty.
    ///
    /// # Errors
    ///
    /// - [`Error::ModeViolation`] if the stream is in read mode
    /// - [`Error::InvalidOperation`] if the position is not at the end of the
    ///   data
    pub fn start_new_volume(&mut self) -> Result<()> {
        self.require(StreamMode::Write, "split")?;
        if self.position != self.total_size {
            return Err(Error::InvalidOperation(format!(
                "cannot start a new volume at position {} before the end of data at {}",
                self.position, self.total_size
            )));
        }

        if self.starts.is_empty() {
            return Ok(());
        }
        let (index, _) = self.locate(self.position)?;
        if self.directory.volume_size(index) > 0 {
            let created = self.directory.create_volume()?;
            self.refresh_table();
            log::debug!("started volume {} on request", created);
        }
        Ok(())
    }

    /// Returns the volume index backing the current position and the offset
    /// within that volume.
    ///
    /// A position at the end of a full last volume in write mode is reported
    /// as offset 0 of the next volume, which is where the next byte will land.
    pub fn relative_info(&self) -> (usize, u64) {
        let Ok((index, offset)) = self.locate(self.position) else {
            return (0, 0);
        };
        let is_last = index + 1 == self.starts.len();
        if self.mode.is_write() && is_last && offset >= self.directory.part_size() {
            (index + 1, 0)
        } else {
            (index, offset)
        }
    }

    /// Ends the write session and returns the final volume sizes.
    ///
    /// Trailing empty volumes are removed and the directory performs its
    /// final renaming.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModeViolation`] if the stream is in read mode.
    pub fn finish(mut self) -> Result<Vec<u64>> {
        self.require(StreamMode::Write, "finish")?;
        self.directory.finalize_write()?;
        Ok(self.directory.volume_sizes())
    }

    fn require(&self, mode: StreamMode, operation: &'static str) -> Result<()> {
        if self.mode == mode {
            Ok(())
        } else {
            Err(Error::mode_violation(operation, self.mode))
        }
    }

    /// Rebuilds the cumulative start table from the directory's sizes.
    fn refresh_table(&mut self) {
        let count = self.directory.volume_count();
        self.starts.clear();
        let mut cumulative = 0u64;
        for index in 0..count {
            self.starts.push(cumulative);
            cumulative += self.directory.volume_size(index);
        }
        self.total_size = cumulative;
    }

    /// Size of volume `index` as of the last table rebuild.
    fn table_size(&self, index: usize) -> u64 {
        let Some(&start) = self.starts.get(index) else {
            return 0;
        };
        let end = self
            .starts
            .get(index + 1)
            .copied()
            .unwrap_or(self.total_size);
        end - start
    }

    /// Maps a virtual position to `(volume index, offset in volume)`.
    ///
    /// Picks the last volume whose start is at or before `pos`.
    fn locate(&self, pos: u64) -> Result<(usize, u64)> {
        let after = self.starts.partition_point(|&start| start <= pos);
        if after == 0 {
            return Err(Error::VolumeNotFound { index: 0 });
        }
        let index = after - 1;
        Ok((index, pos - self.starts[index]))
    }

    /// Number of bytes volume `index` may hold in this session.
    fn capacity(&self, index: usize) -> u64 {
        let size = self.directory.volume_size(index);
        if index + 1 == self.starts.len() {
            self.directory.part_size().max(size)
        } else {
            size
        }
    }

    /// Resolves the volume the next written byte goes to, creating it if
    /// needed.
    fn write_target(&mut self) -> Result<(usize, u64)> {
        if !self.starts.is_empty() {
            let (index, offset) = self.locate(self.position)?;
            if offset < self.capacity(index) {
                return Ok((index, offset));
            }
        }

        let index = self.directory.create_volume()?;
        self.refresh_table();
        log::debug!(
            "volume {} created at virtual offset {}",
            index,
            self.position
        );
        Ok((index, 0))
    }

    fn shrink(&mut self, new_size: u64) -> Result<()> {
        self.seek_to(SeekFrom::Start(new_size))?;
        let (index, offset) = self.locate(new_size)?;

        self.directory.set_volume_len(index, offset)?;
        self.directory.trim_from_volume(index)?;
        self.refresh_table();

        log::debug!(
            "shrunk to {} bytes ending in volume {} at offset {}",
            new_size,
            index,
            offset
        );
        Ok(())
    }

    fn grow(&mut self, new_size: u64) -> Result<()> {
        let mut remaining = new_size - self.total_size;
        let mut index = match self.starts.len() {
            0 => self.directory.create_volume()?,
            count => count - 1,
        };

        loop {
            let size = self.directory.volume_size(index);
            let take = self.directory.part_size().saturating_sub(size).min(remaining);
            if take > 0 {
                self.directory.set_volume_len(index, size + take)?;
                remaining -= take;
            }
            self.refresh_table();

            if remaining == 0 {
                break;
            }
            index = self.directory.create_volume()?;
        }

        log::debug!(
            "grew to {} bytes across {} volumes",
            self.total_size,
            self.starts.len()
        );
        Ok(())
    }
}

impl SplitVolumeStream<FileVolumeDirectory> {
    /// Opens the volumes of an existing split archive for reading.
    ///
    /// See [`FileVolumeDirectory::open`].
    pub fn open(config: VolumeConfig) -> Result<Self> {
        Self::new(FileVolumeDirectory::open(config)?)
    }

    /// Starts a write session for a new split archive.
    ///
    /// See [`FileVolumeDirectory::create`].
    pub fn create(config: VolumeConfig) -> Result<Self> {
        Self::new(FileVolumeDirectory::create(config)?)
    }
}

impl<D: VolumeDirectory> Read for SplitVolumeStream<D> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_data(buf).map_err(io::Error::from)
    }
}

impl<D: VolumeDirectory> Write for SplitVolumeStream<D> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_data(buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.directory.flush().map_err(io::Error::from)
    }
}

impl<D: VolumeDirectory> Seek for SplitVolumeStream<D> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.seek_to(pos).map_err(io::Error::from)
    }
}

impl<D: VolumeDirectory> std::fmt::Debug for SplitVolumeStream<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SplitVolumeStream")
            .field("mode", &self.mode)
            .field("volume_count", &self.starts.len())
            .field("total_size", &self.total_size)
            .field("position", &self.position)
            .finish()
    }
}
