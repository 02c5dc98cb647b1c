//! Stream access modes.

use std::fmt;

/// The direction a stream is opened in.
///
/// The mode is fixed when a stream is constructed. Every operation checks it,
/// and there is no way to switch an open stream between reading and writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamMode {
    /// Existing data is read; nothing is created, resized or deleted.
    Read,
    /// Data is written; volumes are created on demand.
    Write,
}

impl StreamMode {
    /// Returns `true` for [`StreamMode::Read`].
    pub fn is_read(self) -> bool {
        self == StreamMode::Read
    }

    /// Returns `true` for [`StreamMode::Write`].
    pub fn is_write(self) -> bool {
        self == StreamMode::Write
    }
}

impl fmt::Display for StreamMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamMode::Read => write!(f, "read"),
            StreamMode::Write => write!(f, "write"),
        }
    }
}
