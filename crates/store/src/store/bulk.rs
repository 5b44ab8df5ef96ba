use leafdb_core::{Document, LeafError, Result};
use tokio::fs;
use tracing::{debug, info};

use super::{apply_update, read_document, write_document, DocumentStore};
use crate::filter::Filter;

impl DocumentStore {
    // ── Bulk operations ─────────────────────────────────────────

    /// Insert documents one after another. The first failure aborts the
    /// rest; documents already written stay on disk.
    pub async fn insert_many(&self, documents: Vec<Document>) -> Result<Vec<Document>> {
        let mut stored = Vec::with_capacity(documents.len());
        for doc in documents {
            stored.push(self.insert_one(doc, None).await?);
        }

        info!(collection = %self.name, count = stored.len(), "documents inserted");
        Ok(stored)
    }

    /// Read every document, keeping those that match `filter` (all of them
    /// when `None`). A file that cannot be read or parsed fails the whole
    /// scan.
    pub async fn find_many(&self, filter: Option<&Filter>) -> Result<Vec<Document>> {
        let files = self.list_files().await?;
        let scanned = files.len();

        let mut results = Vec::new();
        for path in files {
            let doc = read_document(&path).await?;
            if filter.map_or(true, |f| f.matches(&doc)) {
                results.push(doc);
            }
        }

        debug!(
            collection = %self.name,
            scanned,
            results = results.len(),
            "scan completed"
        );
        Ok(results)
    }

    /// Shallow-merge `update` into every document matching `filter`.
    ///
    /// Returns the documents as they were *before* the update, for every
    /// scanned file whether or not it matched.
    pub async fn find_many_and_update(&self, filter: &Filter, update: Document) -> Result<Vec<Document>> {
        let files = self.list_files().await?;

        let mut scanned = Vec::with_capacity(files.len());
        let mut updated = 0;
        for path in files {
            let doc = read_document(&path).await?;
            if filter.matches(&doc) {
                let merged = apply_update(&doc, &update);
                write_document(&path, &merged).await?;
                updated += 1;
            }
            scanned.push(doc);
        }

        info!(collection = %self.name, scanned = scanned.len(), updated, "documents updated");
        Ok(scanned)
    }

    /// Delete every document matching `filter`, returning the deleted
    /// documents. Deletions made before a failure are not undone.
    pub async fn find_many_and_delete(&self, filter: &Filter) -> Result<Vec<Document>> {
        let files = self.list_files().await?;

        let mut deleted = Vec::new();
        for path in files {
            let doc = read_document(&path).await?;
            if filter.matches(&doc) {
                fs::remove_file(&path)
                    .await
                    .map_err(LeafError::io(format!("deleting {}", path.display())))?;
                deleted.push(doc);
            }
        }

        info!(collection = %self.name, deleted = deleted.len(), "documents deleted");
        Ok(deleted)
    }
}
