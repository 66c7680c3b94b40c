//! fstopo CLI - storage-topology snapshot collector.
//!
//! Two modes:
//! - `snapshot`: produce one snapshot and print it as JSON
//! - `watch`: tick on a fixed interval, printing one JSON document per
//!   successful tick; a failed tick is logged and emits nothing, and the
//!   next cycle retries from scratch

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use clap::{Parser, Subcommand};
use fstopo_core::{BlockDevice, Diagnostics, SnapshotConfig, Snapshotter};
use tracing_subscriber::EnvFilter;

/// Storage topology snapshot CLI.
#[derive(Parser)]
#[command(name = "fstopo")]
#[command(about = "Snapshot block devices, partitions, mounts, and usage", long_about = None)]
struct Cli {
    /// Device-tree root to enumerate.
    #[arg(long, default_value = fstopo_core::snapshot::SYS_BLOCK_PATH)]
    sys_block: PathBuf,

    /// Mount table to cross-reference.
    #[arg(long, default_value = fstopo_core::snapshot::PROC_MOUNTS_PATH)]
    mounts: PathBuf,

    /// Per-tick deadline in milliseconds. A tick running past it is aborted
    /// with a timeout error instead of blocking the next cycle.
    #[arg(long, value_name = "MS")]
    deadline_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Produce one snapshot and print it as JSON.
    Snapshot {
        /// Pretty-print the JSON output.
        #[arg(long)]
        pretty: bool,
    },

    /// Tick on a fixed interval, printing one JSON document per tick.
    Watch {
        /// Seconds between ticks.
        #[arg(long, default_value_t = 5)]
        interval: u64,
    },
}

/// Forwards the core's diagnostics onto the tracing subscriber.
struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn trace(&self, message: &str) {
        tracing::trace!(target: "fstopo", "{message}");
    }

    fn debug(&self, message: &str) {
        tracing::debug!(target: "fstopo", "{message}");
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = SnapshotConfig::new()
        .with_sys_block_path(&cli.sys_block)
        .with_mounts_path(&cli.mounts);
    if let Some(ms) = cli.deadline_ms {
        config = config.with_deadline(Duration::from_millis(ms));
    }

    let snapshotter = Snapshotter::new(config).with_diagnostics(Box::new(TracingDiagnostics));

    match cli.command {
        Commands::Snapshot { pretty } => match snapshotter.tick() {
            Ok(snapshot) => print_snapshot(&snapshot, pretty),
            Err(e) => {
                eprintln!("snapshot failed: {e}");
                std::process::exit(1);
            }
        },
        Commands::Watch { interval } => loop {
            match snapshotter.tick() {
                Ok(snapshot) => print_snapshot(&snapshot, false),
                // No output for a failed tick; the next cycle retries.
                Err(e) => tracing::error!(target: "fstopo", "tick failed: {e}"),
            }
            thread::sleep(Duration::from_secs(interval));
        },
    }
}

fn print_snapshot(snapshot: &[BlockDevice], pretty: bool) {
    let json = if pretty {
        serde_json::to_string_pretty(snapshot)
    } else {
        serde_json::to_string(snapshot)
    };
    match json {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("failed to serialize snapshot: {e}");
            std::process::exit(1);
        }
    }
}
