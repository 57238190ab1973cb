//! Registry state guarded by the registry's read-write lock.
//!
//! Invariants maintained by every method here:
//! - If `current` is set, `cache[current.key]` is the same `Arc`.
//! - At most one cached snapshot exists per key.
//! - `app.generation()` increases by one for every installed snapshot.

use std::collections::HashMap;
use std::sync::Arc;

use folio_store::SettingsStore;
use folio_types::{ApplicationSettings, DocumentKey, DocumentSettings, EffectiveSettings};
use tracing::debug;

use crate::error::RegistryResult;

pub(crate) struct RegistryState {
    pub(crate) app: Arc<ApplicationSettings>,
    /// Staged or selected document layered over `app` for effective reads.
    pub(crate) overlay: Option<Arc<DocumentSettings>>,
    pub(crate) cache: HashMap<DocumentKey, Arc<DocumentSettings>>,
    pub(crate) current: Option<Arc<DocumentSettings>>,
    generation: u64,
}

impl RegistryState {
    pub(crate) fn new(app: ApplicationSettings) -> Self {
        Self {
            app: Arc::new(app.with_generation(1)),
            overlay: None,
            cache: HashMap::new(),
            current: None,
            generation: 1,
        }
    }

    /// Make `app` the live snapshot under the next generation and return the
    /// one it replaces.
    pub(crate) fn install_app(&mut self, app: ApplicationSettings) -> Arc<ApplicationSettings> {
        self.generation += 1;
        let next = Arc::new(app.with_generation(self.generation));
        std::mem::replace(&mut self.app, next)
    }

    /// Cached snapshot for `key`, falling back to the store, creating and
    /// persisting a fresh one seeded from the live defaults if the store has
    /// none either.
    ///
    /// Callers must hold the write lock, which is what keeps two threads from
    /// creating the same key twice.
    pub(crate) fn resolve(
        &mut self,
        key: &DocumentKey,
        store: &dyn SettingsStore,
    ) -> RegistryResult<Arc<DocumentSettings>> {
        if let Some(doc) = self.lookup(key, store)? {
            return Ok(doc);
        }
        let doc = Arc::new(DocumentSettings::new(key.clone(), self.app.clone()));
        store.store_document(&doc)?;
        debug!(%key, "created document settings");
        self.cache.insert(key.clone(), doc.clone());
        Ok(doc)
    }

    /// Cached snapshot for `key`, falling back to the store. Never creates.
    pub(crate) fn lookup(
        &mut self,
        key: &DocumentKey,
        store: &dyn SettingsStore,
    ) -> RegistryResult<Option<Arc<DocumentSettings>>> {
        if let Some(doc) = self.cache.get(key) {
            return Ok(Some(doc.clone()));
        }
        Ok(store.get_document(key)?.map(|record| self.admit(record)))
    }

    /// Bind a stored record to the live snapshot and cache it.
    pub(crate) fn admit(&mut self, record: DocumentSettings) -> Arc<DocumentSettings> {
        let doc = Arc::new(record.bind(self.app.clone()));
        self.cache.insert(doc.key.clone(), doc.clone());
        doc
    }

    /// Supersede the current document.
    ///
    /// The old current's cache entry is dropped before the new one is
    /// inserted, so replacing a document with a newer snapshot of itself
    /// leaves exactly one entry, and replacing with `None` closes it.
    pub(crate) fn replace_current(&mut self, next: Option<Arc<DocumentSettings>>) {
        if let Some(old) = self.current.take() {
            self.cache.remove(&old.key);
        }
        if let Some(doc) = &next {
            self.cache.insert(doc.key.clone(), doc.clone());
        }
        self.current = next;
    }

    /// Point the overlay at `next` if it currently shows exactly `old`.
    ///
    /// An overlay staged by an editor is a different snapshot, even for the
    /// same key, and stays in place.
    pub(crate) fn follow_overlay(
        &mut self,
        old: &Arc<DocumentSettings>,
        next: Option<&Arc<DocumentSettings>>,
    ) {
        if self.overlay_is(old) {
            self.overlay = next.cloned();
        }
    }

    /// Returns `true` if the overlay is the snapshot `doc` itself.
    pub(crate) fn overlay_is(&self, doc: &Arc<DocumentSettings>) -> bool {
        self.overlay.as_ref().is_some_and(|o| Arc::ptr_eq(o, doc))
    }

    pub(crate) fn effective(&self) -> EffectiveSettings {
        EffectiveSettings::new(self.app.clone(), self.overlay.clone())
    }
}
