//! Block-device and partition enumeration.
//!
//! Walks a sysfs-style device tree (one directory per block device, a `size`
//! file holding the raw 512-byte sector count, partition subdirectories named
//! after the owning device) and produces the model types that make up a
//! snapshot. Device-mapper composites appear in the tree under a `dm` name
//! prefix; they are never listed as top-level devices and only show up as
//! targets of holder indirection (see [`crate::mapper`]).

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use crate::error::{
    ListDevicesSnafu, ListPartitionsSnafu, Result, SizeParseSnafu, SizeReadSnafu,
};
use crate::mounts::MountPoint;

/// Name prefix of device-mapper entries in the device tree.
pub const DM_PREFIX: &str = "dm";

/// One top-level block device and its partitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDevice {
    /// Kernel-assigned identifier (e.g. "sda").
    pub name: String,
    /// Raw capacity in KiB.
    pub size: u64,
    /// Partitions in listing order. Every partition name is prefixed by
    /// this device's name.
    pub partitions: Vec<Partition>,
}

/// A named sub-range of a block device.
///
/// The usage fields stay at their zero/empty defaults when the partition has
/// no mount points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    /// Kernel-assigned identifier (e.g. "sda1").
    pub name: String,
    /// Raw capacity in KiB.
    pub size: u64,
    /// Used space in KiB, derived from the first mount point.
    pub used: u64,
    /// Canonical filesystem type name resolved from the statistics probe.
    #[serde(rename = "type")]
    pub filesystem_type: String,
    /// Mount source string of the first mount point (e.g. "/dev/sda1").
    pub filesystem: String,
    /// Matching mount-table records, in table order.
    pub mount_points: Vec<MountPoint>,
}

impl Partition {
    /// Creates a partition with only name and size populated.
    pub(crate) fn unmounted(name: String, size: u64) -> Self {
        Self {
            name,
            size,
            used: 0,
            filesystem_type: String::new(),
            filesystem: String::new(),
            mount_points: Vec::new(),
        }
    }
}

/// Lists a directory and returns the entry names sorted lexicographically.
///
/// Listing order is observable output (device order, partition order, and the
/// last-holder-wins rule all derive from it), so it must not depend on the
/// filesystem's readdir order.
pub(crate) fn sorted_entry_names(dir: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}

/// Reads `<dir>/size` (decimal sector count, trailing newline) and converts
/// 512-byte sectors to KiB.
fn read_size_kib(dir: &Path, name: &str) -> Result<u64> {
    let path = dir.join("size");
    let content = fs::read_to_string(&path).context(SizeReadSnafu {
        name: name.to_string(),
        path: path.clone(),
    })?;
    let trimmed = content.trim_end();
    let sectors: u64 = trimmed.parse().context(SizeParseSnafu {
        name: name.to_string(),
        content: trimmed.to_string(),
    })?;
    Ok(sectors / 2)
}

/// Enumerates top-level block devices under `sys_block`.
///
/// Returns `(name, size_kib)` pairs in name order. Device-mapper entries are
/// skipped. Any listing or size failure aborts the snapshot.
pub fn enumerate_devices(sys_block: &Path) -> Result<Vec<(String, u64)>> {
    let names = sorted_entry_names(sys_block).context(ListDevicesSnafu {
        path: sys_block.to_path_buf(),
    })?;

    let mut devices = Vec::new();
    for name in names {
        if name.starts_with(DM_PREFIX) {
            continue;
        }
        let size = read_size_kib(&sys_block.join(&name), &name)?;
        devices.push((name, size));
    }
    Ok(devices)
}

/// Enumerates the partitions of one device.
///
/// An entry qualifies as a partition iff its name starts with the device
/// name. Only `name` and `size` are populated here; mount and usage data are
/// filled in by the assembler.
pub fn enumerate_partitions(sys_block: &Path, device: &str) -> Result<Vec<Partition>> {
    let device_dir = sys_block.join(device);
    let names = sorted_entry_names(&device_dir).context(ListPartitionsSnafu {
        device: device.to_string(),
        path: device_dir.clone(),
    })?;

    let mut partitions = Vec::new();
    for name in names {
        if !name.starts_with(device) {
            continue;
        }
        let size = read_size_kib(&device_dir.join(&name), &name)?;
        partitions.push(Partition::unmounted(name, size));
    }
    Ok(partitions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::fs;
    use tempfile::TempDir;

    /// Creates a device directory with a `size` file under `root`.
    fn add_device(root: &Path, name: &str, sectors: &str) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("size"), format!("{sectors}\n")).unwrap();
    }

    /// Creates a partition directory with a `size` file under a device.
    fn add_partition(root: &Path, device: &str, name: &str, sectors: &str) {
        let dir = root.join(device).join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("size"), format!("{sectors}\n")).unwrap();
    }

    #[test]
    fn test_enumerate_devices_skips_device_mapper() {
        let root = TempDir::new().unwrap();
        add_device(root.path(), "sda", "2048");
        add_device(root.path(), "sdb", "4096");
        add_device(root.path(), "dm-0", "1024");

        let devices = enumerate_devices(root.path()).unwrap();
        assert_eq!(
            devices,
            vec![("sda".to_string(), 1024), ("sdb".to_string(), 2048)]
        );
    }

    #[test]
    fn test_sector_count_converts_to_kib() {
        let root = TempDir::new().unwrap();
        add_device(root.path(), "sda", "2048");

        let devices = enumerate_devices(root.path()).unwrap();
        assert_eq!(devices[0].1, 1024);
    }

    #[test]
    fn test_enumerate_devices_missing_root() {
        let root = TempDir::new().unwrap();
        let err = enumerate_devices(&root.path().join("nope")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Enumeration);
    }

    #[test]
    fn test_enumerate_devices_malformed_size() {
        let root = TempDir::new().unwrap();
        add_device(root.path(), "sda", "not-a-number");

        let err = enumerate_devices(root.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_enumerate_devices_missing_size_file() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("sda")).unwrap();

        let err = enumerate_devices(root.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Enumeration);
    }

    #[test]
    fn test_enumerate_partitions_filters_by_prefix() {
        let root = TempDir::new().unwrap();
        add_device(root.path(), "sda", "8192");
        add_partition(root.path(), "sda", "sda1", "2048");
        add_partition(root.path(), "sda", "sda2", "4096");
        // Non-partition subdirectories (queue, holders, ...) must be ignored.
        fs::create_dir_all(root.path().join("sda").join("queue")).unwrap();

        let partitions = enumerate_partitions(root.path(), "sda").unwrap();
        let names: Vec<&str> = partitions.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["sda1", "sda2"]);
        assert_eq!(partitions[0].size, 1024);
        assert_eq!(partitions[1].size, 2048);
        assert!(partitions.iter().all(|p| p.name.starts_with("sda")));
    }

    #[test]
    fn test_enumerate_partitions_starts_unmounted() {
        let root = TempDir::new().unwrap();
        add_device(root.path(), "sda", "8192");
        add_partition(root.path(), "sda", "sda1", "2048");

        let partitions = enumerate_partitions(root.path(), "sda").unwrap();
        let partition = &partitions[0];
        assert_eq!(partition.used, 0);
        assert_eq!(partition.filesystem, "");
        assert_eq!(partition.filesystem_type, "");
        assert!(partition.mount_points.is_empty());
    }
}
