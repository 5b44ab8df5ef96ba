/// Integration tests for snapshotting a store root written by the
/// collection store layout, including settings files and retention.

use std::fs;
use std::path::Path;

use chrono::{Duration, NaiveDate};
use serde_json::{json, Value};

use leafdb_backup::{get_configs, BackupManager, SnapshotName};
use leafdb_core::config::BackupConfig;

fn write_store(root: &Path) {
    fs::create_dir_all(root.join("users")).unwrap();
    fs::create_dir_all(root.join("orders")).unwrap();
    fs::write(root.join("users/u1.json"), r#"{"id":"u1","name":"Ann"}"#).unwrap();
    fs::write(root.join("orders/o1.json"), r#"{"id":"o1","total":12}"#).unwrap();
    fs::write(root.join("config.json"), r#"{"theme":"dark"}"#).unwrap();
}

#[test]
fn test_snapshot_is_a_readable_store() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("data");
    write_store(&root);

    let manager = BackupManager::new(&root, &BackupConfig::default()).unwrap();
    let report = manager.backup().unwrap();

    assert_eq!(report.snapshot.sequence, 1);
    assert_eq!(report.stats.files, 3);
    assert_eq!(report.stats.directories, 2);
    assert!(report.path.starts_with(tmp.path().join("data-backup")));

    let settings: Value = get_configs(&report.path, Value::Null).unwrap();
    assert_eq!(settings, json!({ "theme": "dark" }));
    let user: Value =
        serde_json::from_str(&fs::read_to_string(report.path.join("users/u1.json")).unwrap())
            .unwrap();
    assert_eq!(user["name"], "Ann");
}

#[test]
fn test_later_changes_do_not_touch_snapshot() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("data");
    write_store(&root);

    let manager = BackupManager::new(&root, &BackupConfig::default()).unwrap();
    let report = manager.backup().unwrap();

    fs::write(root.join("users/u1.json"), r#"{"id":"u1","name":"Changed"}"#).unwrap();
    fs::remove_file(root.join("orders/o1.json")).unwrap();

    assert!(fs::read_to_string(report.path.join("users/u1.json"))
        .unwrap()
        .contains("Ann"));
    assert!(report.path.join("orders/o1.json").is_file());
}

#[test]
fn test_daily_runs_with_short_retention() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("data");
    write_store(&root);

    let manager = BackupManager::new(&root, &BackupConfig { retention_days: 2 })
        .unwrap()
        .with_backup_root(tmp.path().join("snapshots"))
        .unwrap();

    let start = NaiveDate::from_ymd_opt(2025, 1, 30).unwrap();
    for offset in 0..5 {
        manager.backup_on(start + Duration::days(offset)).unwrap();
    }

    let names: Vec<String> = manager
        .list_snapshots()
        .unwrap()
        .into_iter()
        .map(|(name, _)| name.to_string())
        .collect();
    // Run on 2025-2-3 keeps everything dated on or after 2025-2-1.
    assert_eq!(names, vec!["2025-2-1-1", "2025-2-2-1", "2025-2-3-1"]);
    assert!(SnapshotName::parse(&names[0]).is_some());
}

#[cfg(unix)]
#[test]
fn test_symlinks_survive_backup() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("data");
    write_store(&root);
    std::os::unix::fs::symlink("users", root.join("people")).unwrap();

    let manager = BackupManager::new(&root, &BackupConfig::default()).unwrap();
    let report = manager.backup().unwrap();

    let link = report.path.join("people");
    assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
    assert_eq!(fs::read_link(&link).unwrap(), Path::new("users"));
    assert_eq!(report.stats.symlinks, 1);
}
