//! leafdb-backup: snapshot a leafdb store root and prune old snapshots.
//!
//! Usage:
//!   leafdb-backup                          # back up $LEAFDB_DATA_DIR (default `data`)
//!   leafdb-backup --data-dir /srv/leafdb --retention-days 14
//!   leafdb-backup --list                   # show existing snapshots

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use leafdb_backup::BackupManager;
use leafdb_core::config::{load_dotenv, Config};

// ── CLI ─────────────────────────────────────────────────────────────

/// Dated full-copy backups of a leafdb data directory.
#[derive(Parser, Debug)]
#[command(name = "leafdb-backup", version, about)]
struct Cli {
    /// Config profile; keys are looked up as `{PROFILE}_{KEY}` first.
    #[arg(long, env = "LEAFDB_PROFILE", default_value = "")]
    profile: String,

    /// Store root to back up. Overrides `LEAFDB_DATA_DIR`.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Days of snapshots to keep. Overrides `BACKUP_RETENTION_DAYS`.
    #[arg(long)]
    retention_days: Option<u32>,

    /// Where snapshots go. Defaults to `<data-dir>-backup` beside the store.
    #[arg(long)]
    backup_dir: Option<PathBuf>,

    /// List snapshots instead of taking one.
    #[arg(long)]
    list: bool,
}

// ── main ────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = Config::for_profile(&cli.profile);
    if let Some(data_dir) = cli.data_dir {
        config.store.data_dir = data_dir;
    }
    if let Some(days) = cli.retention_days {
        config.backup.retention_days = days;
    }
    config.log_summary();

    let mut manager = BackupManager::from_config(&config).with_context(|| {
        format!("cannot back up {}", config.store.data_dir.display())
    })?;
    if let Some(dir) = cli.backup_dir {
        manager = manager
            .with_backup_root(&dir)
            .with_context(|| format!("cannot write snapshots to {}", dir.display()))?;
    }

    if cli.list {
        let snapshots = manager.list_snapshots().context("failed to list snapshots")?;
        if snapshots.is_empty() {
            println!("no snapshots in {}", manager.backup_root().display());
        }
        for (name, path) in snapshots {
            println!("{name}\t{}", path.display());
        }
        return Ok(());
    }

    let report = manager.backup().with_context(|| {
        format!(
            "backup of {} into {} failed",
            manager.store_root().display(),
            manager.backup_root().display()
        )
    })?;

    info!(
        snapshot = %report.snapshot,
        directories = report.stats.directories,
        files = report.stats.files,
        symlinks = report.stats.symlinks,
        skipped = report.stats.skipped,
        pruned = report.pruned.len(),
        "done"
    );
    Ok(())
}
