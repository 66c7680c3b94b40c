//! Filesystem usage derivation.
//!
//! Usage comes from a statistics probe on a mounted path: block size,
//! free-block count, and the numeric filesystem-type magic. The probe sits
//! behind a trait so the assembler can be exercised against synthetic device
//! trees without anything actually mounted; production uses the statfs
//! syscall, which (unlike statvfs) reports the type magic.

use std::path::Path;

use nix::sys::statfs::statfs;
use snafu::ensure;

use crate::error::{NegativeBlockSizeSnafu, Result};

/// Label reported for filesystems whose magic is not in the table.
pub const UNKNOWN_FS: &str = "unknown";

/// Raw numbers returned by a filesystem-statistics probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsStats {
    /// Reported block size in bytes. Signed: a negative value is a
    /// consistency violation the caller must treat as fatal.
    pub block_size: i64,
    /// Number of free blocks.
    pub blocks_free: u64,
    /// Numeric filesystem-type identifier (statfs `f_type`).
    pub fs_magic: i64,
}

/// Filesystem-statistics probe keyed by a mounted path.
pub trait StatProbe: Send + Sync {
    /// Probes the filesystem mounted at `path`.
    fn stat(&self, path: &Path) -> std::result::Result<FsStats, nix::Error>;
}

/// Production probe backed by the statfs syscall.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatfsProbe;

impl StatProbe for StatfsProbe {
    fn stat(&self, path: &Path) -> std::result::Result<FsStats, nix::Error> {
        let stat = statfs(path)?;
        Ok(FsStats {
            block_size: stat.block_size() as i64,
            blocks_free: stat.blocks_free() as u64,
            fs_magic: stat.filesystem_type().0 as i64,
        })
    }
}

/// Derives used space in KiB from a partition's raw size and probe output.
///
/// `used = size − (blocks_free × block_size ÷ 1024)`. The subtraction wraps:
/// a mounted filesystem that spans a stacked device can report more free
/// space than the backing partition's raw size, so `used ≤ size` is not
/// guaranteed.
pub fn used_kib(size_kib: u64, path: &Path, stats: &FsStats) -> Result<u64> {
    ensure!(
        stats.block_size >= 0,
        NegativeBlockSizeSnafu {
            path: path.to_path_buf(),
            block_size: stats.block_size,
        }
    );
    let free_kib = stats.blocks_free * stats.block_size as u64 / 1024;
    Ok(size_kib.wrapping_sub(free_kib))
}

/// Statfs magic values for filesystems worth naming, with the canonical name
/// reported in a snapshot. ext2 and ext3 share the ext4 magic and are
/// reported as ext4.
const FS_TYPE_NAMES: &[(i64, &str)] = &[
    (0xEF53, "ext4"),
    (0x9123_683E, "btrfs"),
    (0x5846_5342, "xfs"),
    (0xF2F5_2010, "f2fs"),
    (0x4D44, "vfat"),
    (0x2011_BAB0, "exfat"),
    (0x5346_544E, "ntfs"),
    (0x2FC1_2FC1, "zfs"),
    (0x5265_4973, "reiserfs"),
    (0x3153_464A, "jfs"),
    (0x3434, "nilfs"),
    (0xCA45_1A4E, "bcachefs"),
    (0x482B, "hfsplus"),
    (0x137F, "minix"),
    (0x7371_7368, "squashfs"),
    (0x9660, "iso9660"),
    (0x1501_3346, "udf"),
    (0x6969, "nfs"),
    (0xFF53_4D42, "cifs"),
    (0xFE53_4D42, "smb2"),
    (0x6573_5546, "fuseblk"),
    (0x0102_1994, "tmpfs"),
    (0x8584_58F6, "ramfs"),
    (0x794C_7630, "overlay"),
];

/// Resolves a statfs type magic to its canonical filesystem name, falling
/// back to [`UNKNOWN_FS`].
pub fn fs_type_name(fs_magic: i64) -> &'static str {
    FS_TYPE_NAMES
        .iter()
        .find(|(magic, _)| *magic == fs_magic)
        .map(|(_, name)| *name)
        .unwrap_or(UNKNOWN_FS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn stats(block_size: i64, blocks_free: u64) -> FsStats {
        FsStats {
            block_size,
            blocks_free,
            fs_magic: 0xEF53,
        }
    }

    #[test]
    fn test_used_derivation() {
        // 1000 KiB raw, 100 free blocks of 1024 bytes => 900 KiB used.
        let used = used_kib(1000, Path::new("/mnt"), &stats(1024, 100)).unwrap();
        assert_eq!(used, 900);
    }

    #[test]
    fn test_used_scales_with_block_size() {
        // 512 free blocks of 4096 bytes => 2048 KiB free.
        let used = used_kib(10_240, Path::new("/mnt"), &stats(4096, 512)).unwrap();
        assert_eq!(used, 8192);
    }

    #[test]
    fn test_negative_block_size_is_fatal() {
        let err = used_kib(1000, Path::new("/mnt"), &stats(-4096, 100)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Probe);
    }

    #[test]
    fn test_used_wraps_when_free_exceeds_size() {
        // Free space beyond the raw partition size wraps instead of going
        // negative; callers get a very large unsigned value, never a panic.
        let used = used_kib(1000, Path::new("/mnt"), &stats(1024, 2048)).unwrap();
        assert_eq!(used, 1000u64.wrapping_sub(2048));
    }

    #[test]
    fn test_fs_type_names() {
        assert_eq!(fs_type_name(0xEF53), "ext4");
        assert_eq!(fs_type_name(0x9123_683E), "btrfs");
        assert_eq!(fs_type_name(0x5846_5342), "xfs");
        assert_eq!(fs_type_name(0x0102_1994), "tmpfs");
    }

    #[test]
    fn test_unrecognized_magic_is_unknown() {
        assert_eq!(fs_type_name(0x0BAD_F00D), UNKNOWN_FS);
        assert_eq!(fs_type_name(0), UNKNOWN_FS);
    }
}
