//! Error types for split-volume and item stream operations.
//!
//! This module provides the [`Error`] enum which represents all possible
//! failure modes of the streams in this crate, along with a convenient
//! [`Result<T>`] type alias.
//!
//! # Error Handling
//!
//! Inherent stream operations return `Result<T, Error>`. The same streams also
//! implement [`std::io::Read`], [`std::io::Write`] and [`std::io::Seek`]; those
//! impls convert an [`Error`] into an [`io::Error`] that still carries the
//! typed error, so it can be recovered by downcasting:
//!
//! ```rust
//! use std::io::Write;
//! use zipspan::volume::{MemoryVolumeDirectory, SplitVolumeStream};
//! use zipspan::Error;
//!
//! let directory = MemoryVolumeDirectory::from_volumes(vec![b"data".to_vec()]);
//! let mut stream = SplitVolumeStream::new(directory).unwrap();
//!
//! let err = stream.write(b"nope").unwrap_err();
//! let typed = err.get_ref().and_then(|e| e.downcast_ref::<Error>());
//! assert!(matches!(typed, Some(Error::ModeViolation { .. })));
//! ```
//!
//! ## Exhaustive Error Matching
//!
//! ```rust,no_run
//! use zipspan::Error;
//!
//! fn describe(error: &Error) -> String {
//!     match error {
//!         Error::ModeViolation { operation, mode } => {
//!             format!("cannot {} a stream opened for {}", operation, mode)
//!         }
//!         Error::VolumeNotFound { index } => format!("no volume {}", index),
//!         Error::IncompleteIo { operation, .. } => format!("{} came up short", operation),
//!         other => other.to_string(),
//!     }
//! }
//! # fn main() {}
//! ```

use std::io;

use crate::StreamMode;

/// The main error type for stream operations.
///
/// # Error Categories
///
/// | Category | Variants | Typical Cause |
/// |----------|----------|---------------|
/// | I/O | [`Io`][Self::Io], [`IncompleteIo`][Self::IncompleteIo], [`VolumeMissing`][Self::VolumeMissing] | Storage medium failures |
/// | Usage | [`ModeViolation`][Self::ModeViolation], [`ReadOnlyViolation`][Self::ReadOnlyViolation], [`InvalidOperation`][Self::InvalidOperation] | Calling an operation the stream cannot serve |
/// | Addressing | [`VolumeNotFound`][Self::VolumeNotFound] | Referencing a volume that does not exist |
/// | Configuration | [`InvalidConfiguration`][Self::InvalidConfiguration] | Rejected settings |
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred on the underlying medium.
    #[error("I/O error: {0}")]
    Io(#[source] io::Error),

    /// An operation was attempted that the stream's mode does not allow.
    ///
    /// A stream is opened for either reading or writing, and the mode never
    /// changes for the lifetime of the stream.
    #[error("cannot {operation} a stream opened in {mode} mode")]
    ModeViolation {
        /// The rejected operation.
        operation: &'static str,
        /// The mode the stream was opened in.
        mode: StreamMode,
    },

    /// A volume index does not exist.
    ///
    /// Returned when seeking to a volume past the last one, or when a read
    /// session has no volume at the requested index.
    #[error("volume {index} not found")]
    VolumeNotFound {
        /// The zero-based volume index.
        index: usize,
    },

    /// A physical read or write transferred fewer bytes than required.
    ///
    /// This signals a failing medium or a volume truncated behind the
    /// stream's back. No retry is attempted.
    #[error("{operation} transferred {actual} of {expected} bytes")]
    IncompleteIo {
        /// The physical operation, `"read"` or `"write"`.
        operation: &'static str,
        /// Bytes that were required.
        expected: usize,
        /// Bytes that were actually transferred.
        actual: usize,
    },

    /// A volume file could not be opened.
    #[error("volume {volume} missing: expected at '{path}'")]
    VolumeMissing {
        /// The volume number (1-indexed).
        volume: u32,
        /// The expected path of the volume.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A configuration value was rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The operation is not valid in the stream's current state.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// A write was attempted on a read-only projection stream.
    #[error("stream is read-only")]
    ReadOnlyViolation,
}

impl Error {
    /// Returns `true` if the error comes from using a stream against its mode.
    pub fn is_mode_error(&self) -> bool {
        matches!(self, Error::ModeViolation { .. } | Error::ReadOnlyViolation)
    }

    /// Returns `true` if this error might be recoverable.
    ///
    /// - `VolumeMissing`: the caller can supply the missing volume file
    /// - `Io` (transient kinds only): `WouldBlock`, `Interrupted`, `TimedOut`
    ///
    /// Retrying is the caller's decision; the streams never retry on their own.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::VolumeMissing { .. } => true,
            Error::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted | io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }

    /// Returns the zero-based volume index associated with this error, if any.
    pub fn volume_index(&self) -> Option<usize> {
        match self {
            Error::VolumeNotFound { index } => Some(*index),
            Error::VolumeMissing { volume, .. } => Some(volume.saturating_sub(1) as usize),
            _ => None,
        }
    }

    /// Creates a ModeViolation error.
    pub fn mode_violation(operation: &'static str, mode: StreamMode) -> Self {
        Error::ModeViolation { operation, mode }
    }

    /// Creates an IncompleteIo error.
    pub fn incomplete(operation: &'static str, expected: usize, actual: usize) -> Self {
        Error::IncompleteIo {
            operation,
            expected,
            actual,
        }
    }
}

impl From<io::Error> for Error {
    /// Wraps an I/O error, unwrapping an [`Error`] that was carried through
    /// a [`std::io`] trait boundary.
    fn from(err: io::Error) -> Self {
        if !err.get_ref().is_some_and(|inner| inner.is::<Error>()) {
            return Error::Io(err);
        }
        let kind = err.kind();
        match err.into_inner().map(|inner| inner.downcast::<Error>()) {
            Some(Ok(typed)) => *typed,
            Some(Err(inner)) => Error::Io(io::Error::new(kind, inner)),
            None => Error::Io(io::Error::from(kind)),
        }
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(e) => e,
            Error::IncompleteIo { .. } => io::Error::new(io::ErrorKind::UnexpectedEof, err),
            Error::VolumeNotFound { .. } | Error::VolumeMissing { .. } => {
                io::Error::new(io::ErrorKind::NotFound, err)
            }
            Error::InvalidConfiguration(_) => io::Error::new(io::ErrorKind::InvalidInput, err),
            Error::ModeViolation { .. } | Error::ReadOnlyViolation => {
                io::Error::new(io::ErrorKind::Unsupported, err)
            }
            other => io::Error::other(other),
        }
    }
}

/// A specialized Result type for stream operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_from() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_mode_violation_message() {
        let err = Error::mode_violation("write", StreamMode::Read);
        assert_eq!(err.to_string(), "cannot write a stream opened in read mode");
        assert!(err.is_mode_error());
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_incomplete_io() {
        let err = Error::incomplete("read", 10, 0);
        assert_eq!(err.to_string(), "read transferred 0 of 10 bytes");
    }

    #[test]
    fn test_volume_index() {
        assert_eq!(Error::VolumeNotFound { index: 4 }.volume_index(), Some(4));

        let err = Error::VolumeMissing {
            volume: 3,
            path: "archive.z03".into(),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(err.volume_index(), Some(2));
        assert!(err.is_recoverable());
        assert!(std::error::Error::source(&err).is_some());

        assert_eq!(Error::ReadOnlyViolation.volume_index(), None);
    }

    #[test]
    fn test_is_recoverable_transient_io_errors() {
        for kind in [
            io::ErrorKind::WouldBlock,
            io::ErrorKind::Interrupted,
            io::ErrorKind::TimedOut,
        ] {
            assert!(Error::Io(io::Error::new(kind, "transient")).is_recoverable());
        }
        assert!(!Error::Io(io::Error::new(io::ErrorKind::InvalidData, "bad")).is_recoverable());
    }

    #[test]
    fn test_into_io_error_keeps_typed_error() {
        let io_err: io::Error = Error::VolumeNotFound { index: 7 }.into();
        assert_eq!(io_err.kind(), io::ErrorKind::NotFound);
        let inner = io_err.get_ref().and_then(|e| e.downcast_ref::<Error>());
        assert!(matches!(inner, Some(Error::VolumeNotFound { index: 7 })));
    }

    #[test]
    fn test_into_io_error_unwraps_io() {
        let io_err: io::Error = Error::Io(io::Error::new(io::ErrorKind::TimedOut, "slow")).into();
        assert_eq!(io_err.kind(), io::ErrorKind::TimedOut);
    }

    #[test]
    fn test_typed_error_survives_io_boundary() {
        let io_err: io::Error = Error::incomplete("write", 8, 3).into();
        let err: Error = io_err.into();
        assert!(matches!(
            err,
            Error::IncompleteIo {
                operation: "write",
                expected: 8,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
