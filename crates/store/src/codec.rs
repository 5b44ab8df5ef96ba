//! Mapping between collection names, document ids and paths on disk.
//!
//! ```text
//! <data_dir>/
//!   users/
//!     3f2c...e1.json   <- one document per file, stem == id
//!     alice.json
//! ```

use std::path::{Path, PathBuf};

/// Extension of every document file.
pub const DOCUMENT_EXTENSION: &str = "json";

/// File names dropped into directories by desktop shells.
const OS_ARTIFACTS: &[&str] = &[".DS_Store", "Thumbs.db", "desktop.ini"];

/// Directory holding a collection.
pub fn collection_dir(data_dir: &Path, collection: &str) -> PathBuf {
    data_dir.join(collection)
}

/// File name for a document stem (`<stem>.json`).
pub fn document_filename(stem: &str) -> String {
    format!("{}.{}", stem, DOCUMENT_EXTENSION)
}

/// Full path of the document file with the given stem.
pub fn document_path(collection_dir: &Path, stem: &str) -> PathBuf {
    collection_dir.join(document_filename(stem))
}

/// True for OS metadata files that are never documents (`.DS_Store`,
/// AppleDouble `._*` forks and the Windows equivalents).
pub fn is_os_artifact(file_name: &str) -> bool {
    OS_ARTIFACTS.contains(&file_name) || file_name.starts_with("._")
}
