mod bulk;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use leafdb_core::config::StoreConfig;
use leafdb_core::{Document, LeafError, Result, ID_FIELD};
use serde_json::Value;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::codec;
use crate::ids::{IdGenerator, UuidGenerator};

/// A collection of documents persisted one file per record.
///
/// Manages a single collection directory:
/// ```text
/// <data_dir>/<collection>/
///   <id>.json     <- pretty-printed document including id, createdAt, updatedAt
/// ```
///
/// Single-record lookups return `None` for a missing document. `find_one`
/// additionally swallows read and parse failures (logged at `warn`), while
/// every other operation surfaces the first failure as an error. Bulk
/// operations process files one at a time in file-name order with no
/// rollback: an error on file N leaves files before N already written.
///
/// No locking is performed. Two writers targeting the same id race and the
/// last write wins.
pub struct DocumentStore {
    name: String,
    dir: PathBuf,
    production: bool,
    ids: Arc<dyn IdGenerator>,
}

impl DocumentStore {
    /// Open a collection under `config.data_dir`, creating its directory if
    /// needed.
    pub async fn open(config: &StoreConfig, collection: &str) -> Result<Self> {
        let dir = codec::collection_dir(&config.data_dir, collection);
        fs::create_dir_all(&dir)
            .await
            .map_err(LeafError::io(format!("creating collection dir {}", dir.display())))?;

        info!(
            collection,
            path = %dir.display(),
            production = config.is_production(),
            "collection opened"
        );

        Ok(Self {
            name: collection.to_string(),
            dir,
            production: config.is_production(),
            ids: Arc::new(UuidGenerator),
        })
    }

    /// Replace the identifier source used for documents inserted without an `id`.
    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Arc::new(ids);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn is_production(&self) -> bool {
        self.production
    }

    // ── Single-document operations ──────────────────────────────

    /// Insert a document, assigning `id` when absent and stamping
    /// `createdAt`/`updatedAt`.
    ///
    /// A string or numeric `id` is kept as given and its string form names
    /// the file. A null `id` counts as absent; any other kind is rejected.
    ///
    /// The file is named after the id unless `filename` (a stem, without
    /// `.json`) is given. An existing file with the same name is overwritten.
    pub async fn insert_one(&self, document: Document, filename: Option<&str>) -> Result<Document> {
        let mut doc = document;
        let id = match doc.get(ID_FIELD) {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(n)) => n.to_string(),
            None | Some(Value::Null) => {
                let id = self.ids.generate();
                doc.set(ID_FIELD, id.clone());
                id
            }
            Some(other) => {
                return Err(LeafError::InvalidDocument(format!(
                    "id must be a string or number, got {other}"
                )));
            }
        };
        doc.stamp_created();

        let path = codec::document_path(&self.dir, filename.unwrap_or(&id));
        write_document(&path, &doc).await?;

        debug!(collection = %self.name, id = %id, path = %path.display(), "document inserted");
        Ok(doc)
    }

    /// Read `<id>.json`. Any read or parse failure is logged and reported as
    /// not found.
    pub async fn find_one(&self, id: &str) -> Option<Document> {
        let path = codec::document_path(&self.dir, id);
        match read_document(&path).await {
            Ok(doc) => Some(doc),
            Err(e) if e.is_not_found() => {
                debug!(collection = %self.name, id, "document not found");
                None
            }
            Err(e) => {
                warn!(collection = %self.name, id, error = %e, "failed to load document");
                None
            }
        }
    }

    /// Shallow-merge `update` over the stored document. The stored `id` is
    /// kept and `updatedAt` refreshed. Returns `None` if the document does
    /// not exist; a file that cannot be read or parsed is an error.
    pub async fn find_by_id_and_update(&self, id: &str, update: Document) -> Result<Option<Document>> {
        let Some(existing) = self.load(id).await? else {
            return Ok(None);
        };

        let merged = apply_update(&existing, &update);
        write_document(&codec::document_path(&self.dir, id), &merged).await?;

        debug!(collection = %self.name, id, "document updated");
        Ok(Some(merged))
    }

    /// Delete a document, returning what was stored. `None` if it does not
    /// exist; a file that cannot be read or parsed is an error and is left
    /// in place.
    pub async fn find_by_id_and_delete(&self, id: &str) -> Result<Option<Document>> {
        let Some(existing) = self.load(id).await? else {
            return Ok(None);
        };

        let path = codec::document_path(&self.dir, id);
        fs::remove_file(&path)
            .await
            .map_err(LeafError::io(format!("deleting {}", path.display())))?;

        debug!(collection = %self.name, id, "document deleted");
        Ok(Some(existing))
    }

    // ── Collection-level operations ─────────────────────────────

    /// Number of entries in the collection directory. OS artifacts are
    /// counted too.
    pub async fn count_documents(&self) -> Result<usize> {
        let mut entries = fs::read_dir(&self.dir)
            .await
            .map_err(LeafError::io(format!("listing {}", self.dir.display())))?;

        let mut count = 0;
        while entries
            .next_entry()
            .await
            .map_err(LeafError::io(format!("listing {}", self.dir.display())))?
            .is_some()
        {
            count += 1;
        }
        Ok(count)
    }

    /// Delete every document file in the collection, returning how many were
    /// removed. Refused in production before any file is touched.
    pub async fn drop_collection(&self) -> Result<usize> {
        if self.production {
            warn!(collection = %self.name, "refusing to drop collection in production");
            return Err(LeafError::PolicyViolation(format!(
                "cannot drop collection '{}' in production",
                self.name
            )));
        }

        let files = self.list_files().await?;
        for path in &files {
            fs::remove_file(path)
                .await
                .map_err(LeafError::io(format!("deleting {}", path.display())))?;
        }

        info!(collection = %self.name, removed = files.len(), "collection dropped");
        Ok(files.len())
    }

    /// Read `<id>.json`, mapping only a missing file to `None`.
    async fn load(&self, id: &str) -> Result<Option<Document>> {
        match read_document(&codec::document_path(&self.dir, id)).await {
            Ok(doc) => Ok(Some(doc)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Document files in file-name order, skipping subdirectories and OS
    /// artifacts.
    async fn list_files(&self) -> Result<Vec<PathBuf>> {
        let context = || format!("listing {}", self.dir.display());
        let mut entries = fs::read_dir(&self.dir).await.map_err(LeafError::io(context()))?;

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(LeafError::io(context()))? {
            let file_type = entry.file_type().await.map_err(LeafError::io(context()))?;
            if file_type.is_dir() {
                continue;
            }
            let name = entry.file_name();
            if codec::is_os_artifact(&name.to_string_lossy()) {
                continue;
            }
            files.push(entry.path());
        }

        files.sort();
        Ok(files)
    }
}

/// Merge `update` over `existing`, keep the existing `id` and refresh
/// `updatedAt`.
fn apply_update(existing: &Document, update: &Document) -> Document {
    let mut merged = existing.clone();
    merged.merge(update);
    match existing.get(ID_FIELD).cloned() {
        Some(id) => merged.set(ID_FIELD, id),
        None => {
            merged.remove(ID_FIELD);
        }
    }
    merged.stamp_updated();
    merged
}

async fn read_document(path: &Path) -> Result<Document> {
    let text = fs::read_to_string(path)
        .await
        .map_err(LeafError::io(format!("reading {}", path.display())))?;
    let value: Value = serde_json::from_str(&text)
        .map_err(LeafError::json(format!("parsing {}", path.display())))?;
    Document::from_value(value)
}

async fn write_document(path: &Path, doc: &Document) -> Result<()> {
    let json = serde_json::to_string_pretty(doc)
        .map_err(LeafError::json(format!("encoding {}", path.display())))?;
    fs::write(path, json)
        .await
        .map_err(LeafError::io(format!("writing {}", path.display())))
}
