//! In-memory settings store for tests and ephemeral use.
//!
//! [`InMemorySettingsStore`] keeps all records in a `HashMap` protected by a
//! `RwLock`. Data is lost when the store is dropped.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use folio_types::{DocumentKey, DocumentSettings};

use crate::error::{StoreError, StoreResult};
use crate::traits::{select_documents, SettingsStore};

/// An in-memory implementation of [`SettingsStore`].
///
/// Records are cloned on read and write. The store also counts
/// `store_document` calls so callers can observe write-through behavior.
#[derive(Debug, Default)]
pub struct InMemorySettingsStore {
    documents: RwLock<HashMap<DocumentKey, DocumentSettings>>,
    writes: AtomicUsize,
}

impl InMemorySettingsStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently stored.
    pub fn len(&self) -> usize {
        self.documents.read().map(|docs| docs.len()).unwrap_or(0)
    }

    /// Returns `true` if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `store_document` calls since creation.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::LockPoisoned(e.to_string())
}

impl SettingsStore for InMemorySettingsStore {
    fn get_document(&self, key: &DocumentKey) -> StoreResult<Option<DocumentSettings>> {
        let docs = self.documents.read().map_err(poisoned)?;
        Ok(docs.get(key).cloned())
    }

    fn all_documents(&self, include_all: bool) -> StoreResult<BTreeMap<DocumentKey, DocumentSettings>> {
        let docs = self.documents.read().map_err(poisoned)?;
        Ok(select_documents(docs.values(), include_all))
    }

    fn store_document(&self, doc: &DocumentSettings) -> StoreResult<()> {
        let mut docs = self.documents.write().map_err(poisoned)?;
        docs.insert(doc.key.clone(), doc.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn delete_all(&self) -> StoreResult<()> {
        let mut docs = self.documents.write().map_err(poisoned)?;
        docs.clear();
        Ok(())
    }
}
