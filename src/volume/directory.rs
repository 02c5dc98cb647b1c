//! Volume resolution for split streams.

use std::io::{Read, Seek, Write};

use crate::{Result, StreamMode};

/// Resolves volume indices to physical segments for a [`SplitVolumeStream`].
///
/// A directory owns the backing storage of a split stream: it knows how many
/// volumes exist, how large each one is, and how to open, create, resize and
/// delete them. The stream only performs virtual-to-physical address
/// translation on top of it, so the same stream logic serves files, memory or
/// any other medium.
///
/// Implementations keep at most one volume handle open. Opening a volume
/// releases whatever volume was open before.
///
/// [`SplitVolumeStream`]: super::SplitVolumeStream
pub trait VolumeDirectory {
    /// Handle to one open volume.
    type Volume: Read + Write + Seek;

    /// Returns the mode this directory was opened in.
    fn mode(&self) -> StreamMode;

    /// Returns the number of volumes currently known.
    fn volume_count(&self) -> usize;

    /// Returns the recorded size of volume `index` in bytes.
    ///
    /// Returns 0 for an index past the last volume.
    fn volume_size(&self, index: usize) -> u64;

    /// Returns the maximum size a volume may reach in a write session.
    fn part_size(&self) -> u64;

    /// Opens volume `index` and returns its handle.
    ///
    /// The returned handle's cursor position is unspecified; callers seek
    /// before every transfer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VolumeNotFound`](crate::Error::VolumeNotFound) if the
    /// index is past the last volume.
    fn open_volume(&mut self, index: usize) -> Result<&mut Self::Volume>;

    /// Creates a new empty volume after the last one, opens it, and returns
    /// its index.
    fn create_volume(&mut self) -> Result<usize>;

    /// Records the size of volume `index` after data was written to it.
    fn record_size(&mut self, index: usize, size: u64);

    /// Truncates or zero-extends volume `index` to exactly `len` bytes.
    fn set_volume_len(&mut self, index: usize, len: u64) -> Result<()>;

    /// Deletes every volume after `index`, keeping volumes `0..=index`.
    ///
    /// Calling this again with the same index changes nothing.
    fn trim_from_volume(&mut self, index: usize) -> Result<()>;

    /// Flushes the open volume, if any.
    fn flush(&mut self) -> Result<()>;

    /// Releases the open volume handle, if any.
    fn close(&mut self) -> Result<()>;

    /// Ends a write session.
    ///
    /// Closes the open handle and drops trailing empty volumes. Called once,
    /// after the last write.
    fn finalize_write(&mut self) -> Result<()>;

    /// Returns the sizes of all volumes, in order.
    fn volume_sizes(&self) -> Vec<u64> {
        (0..self.volume_count())
            .map(|index| self.volume_size(index))
            .collect()
    }
}
