//! In-memory volumes.

use std::io::{Cursor, Write};

use super::VolumeDirectory;
use super::config::MIN_PART_SIZE;
use crate::{Error, Result, StreamMode};

/// A [`VolumeDirectory`] that keeps every volume in memory.
///
/// Useful for tests and for building split output that is shipped somewhere
/// other than the local file system.
///
/// # Example
///
/// ```rust
/// use std::io::Write;
/// use zipspan::volume::{MemoryVolumeDirectory, SplitVolumeStream};
///
/// let directory = MemoryVolumeDirectory::new(100).unwrap();
/// let mut stream = SplitVolumeStream::new(directory).unwrap();
/// stream.write_all(&[7u8; 250]).unwrap();
///
/// let volumes = stream.into_directory().into_volumes();
/// assert_eq!(volumes.iter().map(Vec::len).collect::<Vec<_>>(), [100, 100, 50]);
/// ```
#[derive(Debug)]
pub struct MemoryVolumeDirectory {
    volumes: Vec<Cursor<Vec<u8>>>,
    part_size: u64,
    mode: StreamMode,
}

impl MemoryVolumeDirectory {
    /// Creates an empty directory for a write session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if `part_size` is below
    /// [`MIN_PART_SIZE`].
    pub fn new(part_size: u64) -> Result<Self> {
        if part_size < MIN_PART_SIZE {
            return Err(Error::InvalidConfiguration(format!(
                "part size {} is below the minimum of {} bytes",
                part_size, MIN_PART_SIZE
            )));
        }
        Ok(Self {
            volumes: Vec::new(),
            part_size,
            mode: StreamMode::Write,
        })
    }

    /// Creates a directory over existing volumes for a read session.
    pub fn from_volumes(volumes: Vec<Vec<u8>>) -> Self {
        Self {
            volumes: volumes.into_iter().map(Cursor::new).collect(),
            part_size: u64::MAX,
            mode: StreamMode::Read,
        }
    }

    /// Consumes the directory and returns the volume contents.
    pub fn into_volumes(self) -> Vec<Vec<u8>> {
        self.volumes.into_iter().map(Cursor::into_inner).collect()
    }
}

impl VolumeDirectory for MemoryVolumeDirectory {
    type Volume = Cursor<Vec<u8>>;

    fn mode(&self) -> StreamMode {
        self.mode
    }

    fn volume_count(&self) -> usize {
        self.volumes.len()
    }

    fn volume_size(&self, index: usize) -> u64 {
        self.volumes
            .get(index)
            .map_or(0, |volume| volume.get_ref().len() as u64)
    }

    fn part_size(&self) -> u64 {
        self.part_size
    }

    fn open_volume(&mut self, index: usize) -> Result<&mut Self::Volume> {
        self.volumes
            .get_mut(index)
            .ok_or(Error::VolumeNotFound { index })
    }

    fn create_volume(&mut self) -> Result<usize> {
        if self.mode.is_read() {
            return Err(Error::mode_violation("create a volume in", self.mode));
        }
        self.volumes.push(Cursor::new(Vec::new()));
        Ok(self.volumes.len() - 1)
    }

    fn record_size(&mut self, _index: usize, _size: u64) {
        // Sizes are the buffer lengths.
    }

    fn set_volume_len(&mut self, index: usize, len: u64) -> Result<()> {
        let volume = self.open_volume(index)?;
        volume.get_mut().resize(len as usize, 0);
        Ok(())
    }

    fn trim_from_volume(&mut self, index: usize) -> Result<()> {
        self.volumes.truncate(index + 1);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    fn finalize_write(&mut self) -> Result<()> {
        if self.mode.is_read() {
            return Err(Error::mode_violation("finalize", self.mode));
        }
        if self.volumes.is_empty() {
            self.volumes.push(Cursor::new(Vec::new()));
        }
        while self.volumes.len() > 1
            && self
                .volumes
                .last()
                .is_some_and(|volume| volume.get_ref().is_empty())
        {
            self.volumes.pop();
        }
        if let Some(volume) = self.volumes.last_mut() {
            volume.flush()?;
        }
        Ok(())
    }
}
