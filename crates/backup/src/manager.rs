use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use leafdb_core::config::{BackupConfig, Config};
use tracing::{debug, info, warn};

use crate::copier::{CopyStats, DirectoryCopier};
use crate::error::BackupError;
use crate::snapshot::SnapshotName;

/// Outcome of one backup run.
#[derive(Debug, Clone)]
pub struct BackupReport {
    pub snapshot: SnapshotName,
    pub path: PathBuf,
    pub pruned: Vec<SnapshotName>,
    pub stats: CopyStats,
}

/// Creates dated snapshots of a whole store root and prunes old ones.
///
/// Layout, next to the store root:
/// ```text
/// <parent>/
///   data/                    <- store root
///   data-backup/
///     2025-6-14-1/           <- full copy taken on 2025-06-14
///     2025-6-14-2/
///     .2025-6-15-1.partial/  <- in-flight copy, renamed when complete
/// ```
///
/// No lock is taken against writers to the store, so a backup racing with
/// mutations may capture a partially updated view.
pub struct BackupManager {
    store_root: PathBuf,
    backup_root: PathBuf,
    retention_days: u32,
    copier: DirectoryCopier,
}

impl BackupManager {
    /// Back up `store_root` into its sibling `<name>-backup` directory.
    pub fn new(store_root: impl Into<PathBuf>, config: &BackupConfig) -> Result<Self, BackupError> {
        let store_root = store_root.into();
        let backup_root = default_backup_root(&store_root)?;
        Ok(Self {
            store_root,
            backup_root,
            retention_days: config.retention_days,
            copier: DirectoryCopier::new(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, BackupError> {
        Self::new(config.store.data_dir.clone(), &config.backup)
    }

    /// Override where snapshots are written. The backup root may not be the
    /// store root or lie inside it.
    pub fn with_backup_root(mut self, backup_root: impl Into<PathBuf>) -> Result<Self, BackupError> {
        let backup_root = backup_root.into();
        if backup_root.starts_with(&self.store_root) {
            return Err(BackupError::BackupRootInsideStore(backup_root));
        }
        self.backup_root = backup_root;
        Ok(self)
    }

    pub fn store_root(&self) -> &Path {
        &self.store_root
    }

    pub fn backup_root(&self) -> &Path {
        &self.backup_root
    }

    /// Prune expired snapshots, then snapshot the store as of today's local
    /// date.
    pub fn backup(&self) -> Result<BackupReport, BackupError> {
        self.backup_on(Local::now().date_naive())
    }

    /// Same as [`backup`](Self::backup) with an explicit calendar date.
    ///
    /// Snapshots dated strictly before `today - retention_days` are removed
    /// first. The new snapshot's sequence is one more than the number of
    /// snapshots already taken on `today`; if that name is already taken
    /// because an earlier same-day snapshot was removed, the sequence
    /// continues after the highest one present. The copy is built in a hidden
    /// staging directory and renamed into place only once complete; on
    /// failure the staging directory is removed and the error returned.
    pub fn backup_on(&self, today: NaiveDate) -> Result<BackupReport, BackupError> {
        fs::create_dir_all(&self.backup_root).map_err(BackupError::io(format!(
            "creating backup root {}",
            self.backup_root.display()
        )))?;

        let cutoff = today - chrono::Duration::days(i64::from(self.retention_days));
        let mut pruned = Vec::new();
        let mut taken_today = 0;
        let mut highest_today = 0;

        for (name, path) in self.list_snapshots()? {
            if name.date < cutoff {
                fs::remove_dir_all(&path)
                    .map_err(BackupError::io(format!("pruning snapshot {}", path.display())))?;
                info!(snapshot = %name, "pruned expired snapshot");
                pruned.push(name);
            } else if name.date == today {
                taken_today += 1;
                highest_today = highest_today.max(name.sequence);
            }
        }

        let mut snapshot = SnapshotName::new(today, taken_today + 1);
        let mut path = self.backup_root.join(snapshot.to_string());
        if path.exists() {
            // A gap left by a removed same-day snapshot; continue after the highest.
            let next = SnapshotName::new(today, highest_today + 1);
            debug!(taken = %snapshot, next = %next, "snapshot sequence collides, skipping ahead");
            snapshot = next;
            path = self.backup_root.join(snapshot.to_string());
        }
        if path.exists() {
            return Err(BackupError::SnapshotExists(snapshot.to_string()));
        }

        let staging = self.backup_root.join(format!(".{}.partial", snapshot));
        if staging.exists() {
            fs::remove_dir_all(&staging).map_err(BackupError::io(format!(
                "clearing stale staging dir {}",
                staging.display()
            )))?;
        }

        let stats = match self.copier.copy_tree(&self.store_root, &staging) {
            Ok(stats) => stats,
            Err(e) => {
                if let Err(cleanup) = fs::remove_dir_all(&staging) {
                    warn!(path = %staging.display(), error = %cleanup, "failed to remove staging dir");
                }
                return Err(e);
            }
        };

        fs::rename(&staging, &path).map_err(BackupError::io(format!(
            "publishing snapshot {}",
            path.display()
        )))?;

        info!(
            snapshot = %snapshot,
            path = %path.display(),
            files = stats.files,
            bytes = stats.bytes,
            pruned = pruned.len(),
            "backup completed"
        );

        Ok(BackupReport {
            snapshot,
            path,
            pruned,
            stats,
        })
    }

    /// Snapshot directories under the backup root, oldest first. Entries
    /// whose names do not parse as snapshots are ignored.
    pub fn list_snapshots(&self) -> Result<Vec<(SnapshotName, PathBuf)>, BackupError> {
        if !self.backup_root.exists() {
            return Ok(Vec::new());
        }

        let context = || format!("listing {}", self.backup_root.display());
        let mut snapshots = Vec::new();
        for entry in fs::read_dir(&self.backup_root).map_err(BackupError::io(context()))? {
            let entry = entry.map_err(BackupError::io(context()))?;
            if !entry.file_type().map_err(BackupError::io(context()))?.is_dir() {
                continue;
            }
            let file_name = entry.file_name();
            if let Some(name) = file_name.to_str().and_then(SnapshotName::parse) {
                snapshots.push((name, entry.path()));
            }
        }

        snapshots.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(snapshots)
    }
}

/// `<parent>/<name>-backup` for a store root `<parent>/<name>`.
fn default_backup_root(store_root: &Path) -> Result<PathBuf, BackupError> {
    let name = store_root
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| BackupError::InvalidStoreRoot(store_root.to_path_buf()))?;
    let parent = store_root
        .parent()
        .ok_or_else(|| BackupError::InvalidStoreRoot(store_root.to_path_buf()))?;
    Ok(parent.join(format!("{}-backup", name)))
}
