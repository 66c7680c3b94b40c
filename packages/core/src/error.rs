//! Unified error types for the fstopo-core library.
//!
//! Uses SNAFU for context-rich error handling: every variant carries the
//! device or partition it concerns plus the path and underlying cause, so a
//! failed tick can be diagnosed without re-running it.

use snafu::Snafu;
use std::path::PathBuf;
use std::time::Duration;

/// Result type alias using the library's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse failure family of an [`Error`].
///
/// A snapshot aborts on the first error of any kind; the kind tells the
/// caller which stage of the pass gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Directory or file listing/read failure.
    Enumeration,
    /// Malformed numeric or text content.
    Parse,
    /// Device-mapper alias could not be resolved.
    Resolution,
    /// Filesystem-statistics probe failed or returned inconsistent data.
    Probe,
    /// The per-tick deadline expired before the pass finished.
    Timeout,
}

/// Unified error type for all snapshot operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Failed to list the block-device tree root.
    #[snafu(display("failed to list block devices at {}", path.display()))]
    ListDevices {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to list one device's directory while looking for partitions.
    #[snafu(display("failed to list partitions of {device} at {}", path.display()))]
    ListPartitions {
        device: String,
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to read a sector-count file.
    #[snafu(display("failed to read size of {name} at {}", path.display()))]
    SizeRead {
        name: String,
        path: PathBuf,
        source: std::io::Error,
    },

    /// Sector-count file held something other than a decimal integer.
    #[snafu(display("failed to parse size of {name}: {content:?}"))]
    SizeParse {
        name: String,
        content: String,
        source: std::num::ParseIntError,
    },

    /// Failed to read the device-mapper alias name of a holder.
    #[snafu(display(
        "failed to read device-mapper name for partition {partition} at {}",
        path.display()
    ))]
    MapperName {
        partition: String,
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to read the mount table.
    #[snafu(display("failed to read mount table at {}", path.display()))]
    MountTable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The filesystem-statistics syscall failed for a mounted path.
    #[snafu(display("statfs failed for {} on partition {partition}", path.display()))]
    Statfs {
        partition: String,
        path: PathBuf,
        source: nix::Error,
    },

    /// The probe reported a negative block size.
    #[snafu(display(
        "statfs reported negative block size {block_size} for {}",
        path.display()
    ))]
    NegativeBlockSize { path: PathBuf, block_size: i64 },

    /// The snapshot pass ran past its deadline.
    #[snafu(display("snapshot exceeded its deadline of {deadline:?}"))]
    DeadlineExceeded { deadline: Duration },
}

impl Error {
    /// Returns the failure family this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ListDevices { .. }
            | Error::ListPartitions { .. }
            | Error::SizeRead { .. }
            | Error::MountTable { .. } => ErrorKind::Enumeration,
            Error::SizeParse { .. } => ErrorKind::Parse,
            Error::MapperName { .. } => ErrorKind::Resolution,
            Error::Statfs { .. } | Error::NegativeBlockSize { .. } => ErrorKind::Probe,
            Error::DeadlineExceeded { .. } => ErrorKind::Timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_kind_mapping() {
        let err = Error::ListDevices {
            path: PathBuf::from("/sys/block"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(err.kind(), ErrorKind::Enumeration);

        let err = Error::NegativeBlockSize {
            path: PathBuf::from("/mnt/data"),
            block_size: -4096,
        };
        assert_eq!(err.kind(), ErrorKind::Probe);

        let err = Error::DeadlineExceeded {
            deadline: Duration::from_secs(1),
        };
        assert_eq!(err.kind(), ErrorKind::Timeout);
    }

    #[test]
    fn test_display_carries_context() {
        let err = Error::SizeParse {
            name: "sda1".to_string(),
            content: "abc".to_string(),
            source: "abc".parse::<u64>().unwrap_err(),
        };
        let message = err.to_string();
        assert!(message.contains("sda1"));
        assert!(message.contains("abc"));
    }
}
