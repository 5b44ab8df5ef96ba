use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("store root has no parent directory or name: {}", .0.display())]
    InvalidStoreRoot(PathBuf),

    #[error("backup root {} lies inside the store root", .0.display())]
    BackupRootInsideStore(PathBuf),

    #[error("snapshot already exists: {0}")]
    SnapshotExists(String),
}

impl BackupError {
    /// Wrap an I/O error with the operation that produced it.
    pub fn io(context: impl Into<String>) -> impl FnOnce(std::io::Error) -> Self {
        let context = context.into();
        move |source| BackupError::Io { context, source }
    }
}
