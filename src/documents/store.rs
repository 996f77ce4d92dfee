/*!
 * In-memory document store.
 *
 * Documents are read on first use and edited in memory. Edits to the same
 * document are serialized by that document's own lock; different documents
 * never contend. `flush` writes every edited document back once.
 */

use log::{debug, info, warn};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::DocumentError;
use crate::file_utils::FileManager;
use crate::translation::TranslationTask;

use super::{Locator, ResultSink};

/// A loaded document
#[derive(Debug)]
struct Document {
    root: Value,
    dirty: bool,
}

/// Lazily loaded set of JSON documents
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: Mutex<HashMap<PathBuf, Arc<Mutex<Option<Document>>>>>,
}

/// Parse a document from disk
pub fn read_document(path: &Path) -> Result<Value, DocumentError> {
    let content = FileManager::read_to_string(path).map_err(|e| DocumentError::Io {
        path: path.to_path_buf(),
        message: format!("{:#}", e),
    })?;
    serde_json::from_str(&content).map_err(|e| DocumentError::InvalidJson {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, path: &Path) -> Arc<Mutex<Option<Document>>> {
        self.documents
            .lock()
            .entry(path.to_path_buf())
            .or_default()
            .clone()
    }

    /// Replace the string at `locator` in the document at `path`
    ///
    /// Only an existing string value is replaced; anything else is
    /// `LocatorNotFound` and leaves the document untouched.
    pub fn set_text(&self, path: &Path, locator: &Locator, text: &str) -> Result<(), DocumentError> {
        let entry = self.entry(path);
        let mut slot = entry.lock();
        if slot.is_none() {
            debug!("Loading document {}", path.display());
            *slot = Some(Document {
                root: read_document(path)?,
                dirty: false,
            });
        }
        let Some(document) = slot.as_mut() else {
            return Err(DocumentError::Io {
                path: path.to_path_buf(),
                message: "Document not loaded".to_string(),
            });
        };

        match locator.resolve_mut(&mut document.root) {
            Some(Value::String(existing)) => {
                *existing = text.to_string();
                document.dirty = true;
                Ok(())
            }
            _ => Err(DocumentError::LocatorNotFound {
                path: path.to_path_buf(),
                locator: locator.to_string(),
            }),
        }
    }

    /// Current in-memory value at `locator`, if the document is loaded
    pub fn get_text(&self, path: &Path, locator: &Locator) -> Option<String> {
        let entry = self.documents.lock().get(path)?.clone();
        let slot = entry.lock();
        locator.resolve(&slot.as_ref()?.root)?.as_str().map(str::to_string)
    }

    /// Documents with unsaved edits
    pub fn dirty_documents(&self) -> Vec<PathBuf> {
        let documents = self.documents.lock();
        let mut paths: Vec<_> = documents
            .iter()
            .filter(|(_, doc)| doc.lock().as_ref().is_some_and(|d| d.dirty))
            .map(|(path, _)| path.clone())
            .collect();
        paths.sort();
        paths
    }

    /// Write every edited document and forget all loaded ones
    ///
    /// Every document is attempted; the first failure is returned.
    pub fn flush_all(&self) -> Result<usize, DocumentError> {
        let documents = std::mem::take(&mut *self.documents.lock());
        let mut written = 0;
        let mut first_error = None;

        for (path, entry) in documents {
            let slot = entry.lock();
            let Some(document) = slot.as_ref().filter(|d| d.dirty) else {
                continue;
            };

            let result = serde_json::to_string_pretty(&document.root)
                .map_err(|e| DocumentError::InvalidJson {
                    path: path.clone(),
                    message: e.to_string(),
                })
                .and_then(|json| {
                    FileManager::write_atomic(&path, &json).map_err(|e| DocumentError::Io {
                        path: path.clone(),
                        message: format!("{:#}", e),
                    })
                });

            match result {
                Ok(()) => {
                    debug!("Wrote {}", path.display());
                    written += 1;
                }
                Err(e) => {
                    warn!("{}", e);
                    first_error.get_or_insert(e);
                }
            }
        }

        info!("Saved {} document(s)", written);
        match first_error {
            Some(e) => Err(e),
            None => Ok(written),
        }
    }
}

impl ResultSink for DocumentStore {
    fn apply(&self, task: &TranslationTask, translated: &str) -> Result<(), DocumentError> {
        if translated.trim().is_empty() {
            warn!(
                "Empty translation for {} in {}, keeping the original",
                task.locator,
                task.source_file.display()
            );
            return Ok(());
        }
        self.set_text(&task.source_file, &task.locator, translated)
    }

    fn flush(&self) -> Result<(), DocumentError> {
        self.flush_all().map(|_| ())
    }
}
