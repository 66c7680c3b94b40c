//! Mount-table parsing.
//!
//! The live mount table is a flat, line-oriented file (one mounted filesystem
//! per line) with four significant whitespace-separated fields: source
//! device, mount path, filesystem type, and comma-joined options. This module
//! reads it in full and filters for records whose source matches one
//! partition, preserving table order throughout.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use crate::error::{MountTableSnafu, Result};

/// Prefix under which the mount table names block devices.
pub const DEV_PREFIX: &str = "/dev/";

/// One mount option from the table's options field.
///
/// Flag-style options (no `=`) carry an empty value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountOption {
    pub key: String,
    pub value: String,
}

/// One record from the mount table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountPoint {
    /// Source device exactly as the table reports it (e.g. "/dev/sda1").
    pub device: String,
    /// Absolute mount location.
    pub path: String,
    /// Filesystem type string from the table.
    pub filesystem: String,
    /// Options in table order.
    pub options: Vec<MountOption>,
}

/// Parses one options field ("rw,relatime,subvol=/home") into key/value
/// pairs, preserving order.
fn parse_options(field: &str) -> Vec<MountOption> {
    field
        .split(',')
        .map(|option| match option.split_once('=') {
            Some((key, value)) => MountOption {
                key: key.to_string(),
                value: value.to_string(),
            },
            None => MountOption {
                key: option.to_string(),
                value: String::new(),
            },
        })
        .collect()
}

/// Filters a whole mount table for records whose source device equals
/// `source` exactly.
///
/// Lines with fewer than four fields are ignored. Matching records keep
/// table order.
pub fn mount_points_for(table: &str, source: &str) -> Vec<MountPoint> {
    let mut mount_points = Vec::new();
    for line in table.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 4 {
            continue;
        }
        if fields[0] != source {
            continue;
        }
        mount_points.push(MountPoint {
            device: fields[0].to_string(),
            path: fields[1].to_string(),
            filesystem: fields[2].to_string(),
            options: parse_options(fields[3]),
        });
    }
    mount_points
}

/// Reads the mount table at `mounts_path` and returns the records whose
/// source is `/dev/<lookup_name>`.
///
/// A read failure is fatal to the whole snapshot.
pub fn read_mount_points(mounts_path: &Path, lookup_name: &str) -> Result<Vec<MountPoint>> {
    let table = fs::read_to_string(mounts_path).context(MountTableSnafu {
        path: mounts_path.to_path_buf(),
    })?;
    Ok(mount_points_for(&table, &format!("{DEV_PREFIX}{lookup_name}")))
}
