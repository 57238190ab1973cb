//! File-backed settings store.
//!
//! [`JsonFileSettingsStore`] keeps every record in one JSON file inside a
//! directory. The file is read once on open; each mutation writes the full
//! record set to a temp file in the same directory and renames it over the
//! old one, so a crash mid-write leaves the previous file intact.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use folio_types::{DocumentKey, DocumentSettings};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::{select_documents, SettingsStore};

/// Name of the store file inside the store directory.
pub const STORE_FILE_NAME: &str = "documents.json";

const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct StoreFileOut<'a> {
    version: u32,
    documents: Vec<&'a DocumentSettings>,
}

#[derive(Deserialize)]
struct StoreFileIn {
    version: u32,
    #[serde(default)]
    documents: Vec<DocumentSettings>,
}

/// A [`SettingsStore`] persisted as a single JSON file.
#[derive(Debug)]
pub struct JsonFileSettingsStore {
    path: PathBuf,
    documents: RwLock<BTreeMap<DocumentKey, DocumentSettings>>,
}

impl JsonFileSettingsStore {
    /// Open (or create) the store in `dir`.
    ///
    /// The directory is created if needed. A missing store file is an empty
    /// store; a file that cannot be decoded is an error.
    pub fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(STORE_FILE_NAME);

        let documents = if path.exists() {
            load(&path)?
        } else {
            BTreeMap::new()
        };
        debug!(path = %path.display(), count = documents.len(), "settings store opened");

        Ok(Self {
            path,
            documents: RwLock::new(documents),
        })
    }

    /// Location of the store file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `change` to a copy of the records, persist the copy, then
    /// install it. The in-memory view only changes if the write succeeded.
    fn mutate<F>(&self, change: F) -> StoreResult<()>
    where
        F: FnOnce(&mut BTreeMap<DocumentKey, DocumentSettings>),
    {
        let mut docs = self
            .documents
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        let mut next = docs.clone();
        change(&mut next);
        self.write_file(&next)?;
        *docs = next;
        Ok(())
    }

    fn write_file(&self, docs: &BTreeMap<DocumentKey, DocumentSettings>) -> StoreResult<()> {
        let file = StoreFileOut {
            version: FORMAT_VERSION,
            documents: docs.values().collect(),
        };
        let bytes = serde_json::to_vec_pretty(&file)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;

        debug!(path = %self.path.display(), count = docs.len(), "settings store written");
        Ok(())
    }
}

fn load(path: &Path) -> StoreResult<BTreeMap<DocumentKey, DocumentSettings>> {
    let bytes = fs::read(path)?;
    let file: StoreFileIn = serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    if file.version != FORMAT_VERSION {
        return Err(StoreError::Corrupt {
            path: path.to_path_buf(),
            reason: format!("unsupported format version {}", file.version),
        });
    }
    Ok(file
        .documents
        .into_iter()
        .map(|doc| (doc.key.clone(), doc))
        .collect())
}

impl SettingsStore for JsonFileSettingsStore {
    fn get_document(&self, key: &DocumentKey) -> StoreResult<Option<DocumentSettings>> {
        let docs = self
            .documents
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        Ok(docs.get(key).cloned())
    }

    fn all_documents(&self, include_all: bool) -> StoreResult<BTreeMap<DocumentKey, DocumentSettings>> {
        let docs = self
            .documents
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        Ok(select_documents(docs.values(), include_all))
    }

    fn store_document(&self, doc: &DocumentSettings) -> StoreResult<()> {
        self.mutate(|docs| {
            docs.insert(doc.key.clone(), doc.clone());
        })
    }

    fn delete_all(&self) -> StoreResult<()> {
        self.mutate(BTreeMap::clear)
    }
}
