//! Device-mapper indirection resolution.
//!
//! A partition that backs a device-mapper volume (LVM logical volume, dm-crypt
//! container, ...) is never mounted under its raw name; the mount table knows
//! it as `/dev/mapper/<dm-name>`. The kernel exposes the relation through the
//! partition's `holders/` directory: each holder is a device that sits on top
//! of the partition, and dm holders carry their user-facing alias in
//! `dm/name`.

use std::fs;
use std::path::Path;

use snafu::ResultExt;

use crate::block::{DM_PREFIX, sorted_entry_names};
use crate::error::{MapperNameSnafu, Result};

/// Determines the name under which a partition must be looked up in the
/// mount table.
///
/// - No holders (or an unreadable holders directory): the raw partition name.
/// - Holders including device-mapper entries: `mapper/<dm-name>` read from
///   the holder's alias file, trailing newline stripped. When several dm
///   holders exist the last one in name order wins; there is no defined
///   tie-break for that case.
/// - Holders without any device-mapper entry: `None` — no mount-table lookup
///   is performed and the partition is reported unmounted.
///
/// A dm holder whose alias file cannot be read is a fatal resolution error.
pub fn resolve_lookup_name(
    sys_block: &Path,
    device: &str,
    partition: &str,
) -> Result<Option<String>> {
    let holders_dir = sys_block.join(device).join(partition).join("holders");
    let holders = sorted_entry_names(&holders_dir).unwrap_or_default();

    if holders.is_empty() {
        return Ok(Some(partition.to_string()));
    }

    let mut alias = None;
    for holder in holders.iter().filter(|h| h.starts_with(DM_PREFIX)) {
        let name_path = holders_dir.join(holder).join("dm").join("name");
        let dm_name = fs::read_to_string(&name_path).context(MapperNameSnafu {
            partition: partition.to_string(),
            path: name_path.clone(),
        })?;
        alias = Some(format!("mapper/{}", dm_name.trim_end()));
    }
    Ok(alias)
}
