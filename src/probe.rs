//! A stream that measures output without storing it.

use std::io::{self, Seek, SeekFrom, Write};

/// A write-only stream that only counts.
///
/// Writing through a `SizeProbe` tells how large some output would be (for
/// example a compressed entry or a central directory) without persisting it.
/// The probe tracks a position and the furthest byte ever written, so
/// seek-and-overwrite patterns measure the same as they would on disk.
///
/// # Example
///
/// ```rust
/// use std::io::Write;
/// use zipspan::SizeProbe;
///
/// let mut probe = SizeProbe::new();
/// probe.write_all(&[0u8; 300]).unwrap();
/// assert_eq!(probe.size(), 300);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizeProbe {
    position: u64,
    size: u64,
}

impl SizeProbe {
    /// Creates an empty probe.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the furthest offset written.
    pub fn size(&self) -> u64 {
        self.size
    }
}

impl Write for SizeProbe {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.position += buf.len() as u64;
        self.size = self.size.max(self.position);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for SizeProbe {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(p) => i128::from(p),
            SeekFrom::End(p) => i128::from(self.size) + i128::from(p),
            SeekFrom::Current(p) => i128::from(self.position) + i128::from(p),
        };
        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Cannot seek before start of stream",
            ));
        }
        self.position = target as u64;
        Ok(self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overwrite_does_not_grow() {
        let mut probe = SizeProbe::new();
        probe.write_all(&[0u8; 100]).unwrap();
        probe.seek(SeekFrom::Start(10)).unwrap();
        probe.write_all(&[0u8; 20]).unwrap();
        assert_eq!(probe.size(), 100);
        assert_eq!(probe.stream_position().unwrap(), 30);
    }

    #[test]
    fn test_seek_before_start() {
        let mut probe = SizeProbe::new();
        assert!(probe.seek(SeekFrom::Current(-1)).is_err());
    }
}
