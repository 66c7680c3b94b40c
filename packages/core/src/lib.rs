//! fstopo-core: point-in-time snapshots of local storage topology.
//!
//! Each tick walks a sysfs-style device tree, cross-references the live
//! mount table, resolves device-mapper indirection, and derives space usage
//! from a filesystem-statistics probe, producing an ordered list of
//! [`BlockDevice`] values for a monitoring collector. The pass is
//! single-threaded, read-only, fail-fast, and keeps nothing between ticks.
//!
//! # Modules
//!
//! - [`block`]: device and partition enumeration
//! - [`mapper`]: device-mapper alias resolution
//! - [`mounts`]: mount-table parsing
//! - [`usage`]: usage derivation and the statistics probe
//! - [`snapshot`]: the tick driver
//! - [`diag`]: diagnostics sink
//! - [`error`]: error types
//!
//! # Example
//!
//! ```no_run
//! use fstopo_core::{SnapshotConfig, Snapshotter};
//!
//! let snapshotter = Snapshotter::new(SnapshotConfig::new());
//! match snapshotter.tick() {
//!     Ok(devices) => {
//!         for device in &devices {
//!             println!("{}: {} KiB, {} partitions",
//!                 device.name, device.size, device.partitions.len());
//!         }
//!     }
//!     // A failed tick yields no data; the scheduler retries next cycle.
//!     Err(e) => eprintln!("snapshot failed: {e}"),
//! }
//! ```

pub mod block;
pub mod diag;
pub mod error;
pub mod mapper;
pub mod mounts;
pub mod snapshot;
pub mod usage;

// Re-export commonly used types
pub use block::{BlockDevice, Partition};
pub use diag::{Diagnostics, NoopDiagnostics};
pub use error::{Error, ErrorKind, Result};
pub use mounts::{MountOption, MountPoint};
pub use snapshot::{SnapshotConfig, Snapshotter};
pub use usage::{FsStats, StatProbe, StatfsProbe};
