//! Recursive directory copy that keeps symbolic links as links.

use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::BackupError;

/// What a directory entry is, judged without following links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
    Symlink,
    /// Sockets, FIFOs and device nodes.
    Other,
}

impl EntryKind {
    pub fn of(file_type: fs::FileType) -> Self {
        if file_type.is_symlink() {
            EntryKind::Symlink
        } else if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        }
    }
}

/// Counts of what a copy produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    pub directories: usize,
    pub files: usize,
    pub symlinks: usize,
    pub skipped: usize,
    pub bytes: u64,
}

/// Duplicates a directory tree.
///
/// The walk is iterative (walkdir keeps an explicit stack of open
/// directories), never follows links, and visits entries in file-name order.
/// The first I/O error aborts the copy; whatever was already written stays in
/// `dst`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryCopier;

impl DirectoryCopier {
    pub fn new() -> Self {
        Self
    }

    /// Copy the contents of `src` into `dst`, creating `dst` if needed.
    pub fn copy_tree(&self, src: &Path, dst: &Path) -> Result<CopyStats, BackupError> {
        fs::create_dir_all(dst).map_err(BackupError::io(format!("creating {}", dst.display())))?;

        let mut stats = CopyStats::default();
        let walker = WalkDir::new(src)
            .follow_links(false)
            .min_depth(1)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry.map_err(|e| BackupError::Io {
                context: format!("walking {}", src.display()),
                source: io::Error::from(e),
            })?;
            let Ok(relative) = entry.path().strip_prefix(src) else {
                continue;
            };
            let target = dst.join(relative);

            match EntryKind::of(entry.file_type()) {
                EntryKind::Directory => {
                    fs::create_dir_all(&target)
                        .map_err(BackupError::io(format!("creating {}", target.display())))?;
                    stats.directories += 1;
                }
                EntryKind::File => {
                    let bytes = fs::copy(entry.path(), &target).map_err(BackupError::io(format!(
                        "copying {} to {}",
                        entry.path().display(),
                        target.display()
                    )))?;
                    stats.files += 1;
                    stats.bytes += bytes;
                }
                EntryKind::Symlink => {
                    let link = fs::read_link(entry.path())
                        .map_err(BackupError::io(format!("reading link {}", entry.path().display())))?;
                    create_symlink(&link, entry.path(), &target)
                        .map_err(BackupError::io(format!("linking {}", target.display())))?;
                    stats.symlinks += 1;
                }
                EntryKind::Other => {
                    warn!(path = %entry.path().display(), "skipping special file");
                    stats.skipped += 1;
                }
            }
        }

        debug!(
            src = %src.display(),
            dst = %dst.display(),
            directories = stats.directories,
            files = stats.files,
            symlinks = stats.symlinks,
            bytes = stats.bytes,
            "directory tree copied"
        );
        Ok(stats)
    }
}

#[cfg(unix)]
fn create_symlink(link: &Path, _original: &Path, target: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(link, target)
}

/// Windows distinguishes file and directory links; the kind is taken from
/// what the original link points at.
#[cfg(windows)]
fn create_symlink(link: &Path, original: &Path, target: &Path) -> io::Result<()> {
    if fs::metadata(original).map(|m| m.is_dir()).unwrap_or(false) {
        std::os::windows::fs::symlink_dir(link, target)
    } else {
        std::os::windows::fs::symlink_file(link, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copies_nested_tree() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        fs::create_dir_all(src.path().join("users/archive")).unwrap();
        fs::write(src.path().join("config.json"), "{}").unwrap();
        fs::write(src.path().join("users/a.json"), r#"{"id":"a"}"#).unwrap();
        fs::write(src.path().join("users/archive/b.json"), r#"{"id":"b"}"#).unwrap();
        fs::create_dir(src.path().join("empty")).unwrap();

        let out = dst.path().join("copy");
        let stats = DirectoryCopier::new().copy_tree(src.path(), &out).unwrap();

        assert_eq!(stats.files, 3);
        assert_eq!(stats.directories, 3);
        assert_eq!(stats.symlinks, 0);
        assert_eq!(
            fs::read_to_string(out.join("users/archive/b.json")).unwrap(),
            r#"{"id":"b"}"#
        );
        assert!(out.join("empty").is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_not_dereferenced() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        fs::create_dir(src.path().join("real")).unwrap();
        fs::write(src.path().join("real/a.json"), "{}").unwrap();
        std::os::unix::fs::symlink("real", src.path().join("alias")).unwrap();
        std::os::unix::fs::symlink("real/a.json", src.path().join("a-link.json")).unwrap();

        let out = dst.path().join("copy");
        let stats = DirectoryCopier::new().copy_tree(src.path(), &out).unwrap();

        assert_eq!(stats.symlinks, 2);
        assert_eq!(stats.files, 1);
        let alias = fs::symlink_metadata(out.join("alias")).unwrap();
        assert!(alias.file_type().is_symlink());
        assert_eq!(fs::read_link(out.join("alias")).unwrap(), Path::new("real"));
        assert_eq!(
            fs::read_link(out.join("a-link.json")).unwrap(),
            Path::new("real/a.json")
        );
        // Relative links resolve inside the copy.
        assert!(out.join("alias/a.json").is_file());
    }

    #[test]
    fn test_missing_source_fails() {
        let dst = tempfile::tempdir().unwrap();
        let missing = dst.path().join("nope");
        let err = DirectoryCopier::new()
            .copy_tree(&missing, &dst.path().join("copy"))
            .unwrap_err();
        assert!(matches!(err, BackupError::Io { .. }));
    }

    #[test]
    fn test_entry_kind() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("f"), "x").unwrap();
        let kind = |p: &Path| EntryKind::of(fs::symlink_metadata(p).unwrap().file_type());
        assert_eq!(kind(tmp.path()), EntryKind::Directory);
        assert_eq!(kind(&tmp.path().join("f")), EntryKind::File);
    }
}
