//! Snapshot assembly.
//!
//! One tick walks the device tree, cross-references the mount table, resolves
//! device-mapper indirection, and probes usage for every mounted partition,
//! producing the complete ordered device list or the first error. Nothing is
//! cached between ticks and no partial result is ever returned.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use snafu::{ResultExt, ensure};

use crate::block::{self, BlockDevice, Partition};
use crate::diag::{Diagnostics, NoopDiagnostics};
use crate::error::{DeadlineExceededSnafu, Result, StatfsSnafu};
use crate::mapper;
use crate::mounts;
use crate::usage::{self, StatProbe, StatfsProbe};

/// Default device-tree root.
pub const SYS_BLOCK_PATH: &str = "/sys/block";

/// Default mount-table path.
pub const PROC_MOUNTS_PATH: &str = "/proc/mounts";

/// Configuration for snapshot assembly.
///
/// Defaults read the live system; the paths exist so tests (and containers
/// exposing a host tree elsewhere) can point the engine at a different root.
#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    /// Device-tree root to enumerate.
    pub sys_block_path: PathBuf,
    /// Mount table to cross-reference.
    pub mounts_path: PathBuf,
    /// Per-tick deadline. When set, the pass aborts with a timeout error
    /// instead of blocking the calling scheduler indefinitely. Checked at
    /// device and partition boundaries, so a single stuck read still blocks
    /// until it returns.
    pub deadline: Option<Duration>,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            sys_block_path: PathBuf::from(SYS_BLOCK_PATH),
            mounts_path: PathBuf::from(PROC_MOUNTS_PATH),
            deadline: None,
        }
    }
}

impl SnapshotConfig {
    /// Creates a config reading the live system with no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the device-tree root.
    pub fn with_sys_block_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.sys_block_path = path.into();
        self
    }

    /// Sets the mount-table path.
    pub fn with_mounts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.mounts_path = path.into();
        self
    }

    /// Sets the per-tick deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Builds storage-topology snapshots.
///
/// Holds its collaborators from construction onward: the statistics probe and
/// the diagnostics sink. Ticks are independent; the snapshotter keeps no
/// state between them and is safe to drive from a periodic scheduler.
pub struct Snapshotter {
    config: SnapshotConfig,
    probe: Box<dyn StatProbe>,
    diag: Box<dyn Diagnostics>,
}

impl Snapshotter {
    /// Creates a snapshotter with the statfs-backed probe and no diagnostics.
    pub fn new(config: SnapshotConfig) -> Self {
        Self {
            config,
            probe: Box::new(StatfsProbe),
            diag: Box::new(NoopDiagnostics),
        }
    }

    /// Replaces the diagnostics sink.
    pub fn with_diagnostics(mut self, diag: Box<dyn Diagnostics>) -> Self {
        self.diag = diag;
        self
    }

    /// Replaces the filesystem-statistics probe.
    pub fn with_probe(mut self, probe: Box<dyn StatProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Produces one complete snapshot.
    ///
    /// Returns the ordered device list, or the first error encountered at
    /// any stage; there is no partial-success path. A failed tick yields no
    /// data, which callers must treat differently from a snapshot whose
    /// fields are zero.
    pub fn tick(&self) -> Result<Vec<BlockDevice>> {
        let start = Instant::now();
        self.diag.trace("parsing block devices");

        let mut snapshot = Vec::new();
        for (name, size) in block::enumerate_devices(&self.config.sys_block_path)? {
            self.check_deadline(&start)?;
            self.diag.debug(&format!("reading partitions of {name}"));

            let mut partitions =
                block::enumerate_partitions(&self.config.sys_block_path, &name)?;
            for partition in &mut partitions {
                self.check_deadline(&start)?;
                self.attach_mounts(&name, partition)?;
            }

            snapshot.push(BlockDevice {
                name,
                size,
                partitions,
            });
        }

        self.diag.trace("snapshot complete");
        Ok(snapshot)
    }

    /// Resolves the mount-table lookup name for one partition and, when it
    /// is mounted, fills in usage from the first mount point.
    fn attach_mounts(&self, device: &str, partition: &mut Partition) -> Result<()> {
        let Some(lookup) =
            mapper::resolve_lookup_name(&self.config.sys_block_path, device, &partition.name)?
        else {
            return Ok(());
        };

        let mount_points = mounts::read_mount_points(&self.config.mounts_path, &lookup)?;
        let Some(first) = mount_points.first() else {
            return Ok(());
        };

        let path = Path::new(&first.path);
        let stats = self.probe.stat(path).context(StatfsSnafu {
            partition: partition.name.clone(),
            path: path.to_path_buf(),
        })?;

        partition.used = usage::used_kib(partition.size, path, &stats)?;
        partition.filesystem_type = usage::fs_type_name(stats.fs_magic).to_string();
        partition.filesystem = first.device.clone();
        partition.mount_points = mount_points;
        Ok(())
    }

    fn check_deadline(&self, start: &Instant) -> Result<()> {
        if let Some(deadline) = self.config.deadline {
            ensure!(start.elapsed() < deadline, DeadlineExceededSnafu { deadline });
        }
        Ok(())
    }
}
