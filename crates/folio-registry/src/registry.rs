//! The settings registry: single source of truth for application settings
//! and the settings of the open document.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread::{self, ThreadId};

use folio_store::SettingsStore;
use folio_types::{
    ApplicationSettings, DocumentKey, DocumentSettings, EffectiveSettings, PageIndex,
};
use tracing::{debug, info};

use crate::editor::{SettingsEditor, StagedEdit};
use crate::error::{RegistryError, RegistryResult};
use crate::listener::{ListenerSet, SettingsListener};
use crate::source::SettingsSource;
use crate::state::RegistryState;

/// Mediates all access to application and document settings.
///
/// One registry is built at startup and shared (usually through an `Arc`)
/// with every thread that reads or changes settings. All cache and
/// current-document state sits behind a single read-write lock: queries take
/// the read lock, everything that changes state takes the write lock. The
/// listener set has its own lock.
///
/// Listener notifications are delivered synchronously on the calling thread
/// before the triggering call returns, but after the state lock has been
/// released. Settings changes are serialized end to end, so listeners see
/// generations strictly in order.
pub struct SettingsRegistry {
    source: Arc<dyn SettingsSource>,
    store: Arc<dyn SettingsStore>,
    state: RwLock<RegistryState>,
    listeners: ListenerSet,
    /// Held from loading new settings until the last listener returns.
    propagation: Mutex<()>,
    /// Thread currently holding `propagation`.
    propagating: Mutex<Option<ThreadId>>,
}

/// Releases the propagation order lock, forgetting its owner first.
struct PropagationGuard<'a> {
    _order: MutexGuard<'a, ()>,
    owner: &'a Mutex<Option<ThreadId>>,
}

impl Drop for PropagationGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut owner) = self.owner.lock() {
            *owner = None;
        }
    }
}

/// Notifications collected under the state lock and delivered after it is
/// released.
struct PendingChanges {
    app: (Arc<ApplicationSettings>, Arc<ApplicationSettings>),
    document: Option<(Arc<DocumentSettings>, Arc<DocumentSettings>)>,
}

impl SettingsRegistry {
    /// Build a registry, loading the initial application settings from
    /// `source`.
    pub fn new(
        source: Arc<dyn SettingsSource>,
        store: Arc<dyn SettingsStore>,
    ) -> RegistryResult<Self> {
        let app = load_settings(source.as_ref())?;
        info!("settings registry initialized");
        Ok(Self {
            source,
            store,
            state: RwLock::new(RegistryState::new(app)),
            listeners: ListenerSet::new(),
            propagation: Mutex::new(()),
            propagating: Mutex::new(None),
        })
    }

    fn read_state(&self) -> RegistryResult<RwLockReadGuard<'_, RegistryState>> {
        self.state
            .read()
            .map_err(|e| RegistryError::LockPoisoned(e.to_string()))
    }

    fn write_state(&self) -> RegistryResult<RwLockWriteGuard<'_, RegistryState>> {
        self.state
            .write()
            .map_err(|e| RegistryError::LockPoisoned(e.to_string()))
    }

    /// The persistence backend this registry writes through.
    pub fn store(&self) -> &Arc<dyn SettingsStore> {
        &self.store
    }

    // ---- Queries ----

    /// The live application settings snapshot.
    pub fn application_settings(&self) -> RegistryResult<Arc<ApplicationSettings>> {
        Ok(self.read_state()?.app.clone())
    }

    /// The current document, if one is open.
    pub fn current_document(&self) -> RegistryResult<Option<Arc<DocumentSettings>>> {
        Ok(self.read_state()?.current.clone())
    }

    /// Application settings with the selected or staged document layered on top.
    pub fn effective_settings(&self) -> RegistryResult<EffectiveSettings> {
        Ok(self.read_state()?.effective())
    }

    /// Returns `true` if settings for `key` are held in the cache.
    pub fn is_cached(&self, key: &DocumentKey) -> RegistryResult<bool> {
        Ok(self.read_state()?.cache.contains_key(key))
    }

    /// Number of cached documents.
    pub fn cached_len(&self) -> RegistryResult<usize> {
        Ok(self.read_state()?.cache.len())
    }

    // ---- Document lifecycle ----

    /// Open `key`: resolve its settings (creating and persisting them on
    /// first sight), make them current, and layer them over the application
    /// settings.
    pub fn select_document(&self, key: &DocumentKey) -> RegistryResult<Arc<DocumentSettings>> {
        let mut state = self.write_state()?;
        let doc = state.resolve(key, self.store.as_ref())?;
        state.current = Some(doc.clone());
        state.overlay = Some(doc.clone());
        debug!(%key, page = %doc.current_page, "document selected");
        Ok(doc)
    }

    /// Settings for `key` from the cache or the store, without creating a
    /// record and without changing the current document.
    pub fn lookup_document(&self, key: &DocumentKey) -> RegistryResult<Option<Arc<DocumentSettings>>> {
        let mut state = self.write_state()?;
        state.lookup(key, self.store.as_ref())
    }

    /// The current document, or else the most recently updated stored one.
    pub fn recent_document(&self) -> RegistryResult<Option<Arc<DocumentSettings>>> {
        let mut state = self.write_state()?;
        if let Some(current) = &state.current {
            return Ok(Some(current.clone()));
        }
        let recent = self.store.all_documents(false)?;
        Ok(recent.into_values().next().map(|record| state.admit(record)))
    }

    /// Reload every stored record into the cache and return them all.
    ///
    /// The current document is re-pointed at the reloaded record with the
    /// same key, or closed if the store no longer has it.
    pub fn all_documents(&self) -> RegistryResult<BTreeMap<DocumentKey, Arc<DocumentSettings>>> {
        let mut state = self.write_state()?;
        let records = self.store.all_documents(true)?;
        let old_current = state.current.clone();

        state.cache.clear();
        let docs: BTreeMap<DocumentKey, Arc<DocumentSettings>> = records
            .into_values()
            .map(|record| {
                let doc = state.admit(record);
                (doc.key.clone(), doc)
            })
            .collect();

        let reloaded = old_current
            .as_ref()
            .and_then(|old| docs.get(&old.key).cloned());
        if let Some(old) = &old_current {
            state.follow_overlay(old, reloaded.as_ref());
        }
        state.replace_current(reloaded);
        debug!(count = docs.len(), "document settings reloaded");
        Ok(docs)
    }

    /// Supersede the current document with `next` (or close it with `None`).
    pub fn replace_current(&self, next: Option<Arc<DocumentSettings>>) -> RegistryResult<()> {
        let mut state = self.write_state()?;
        state.replace_current(next);
        Ok(())
    }

    /// Close the current document and drop the overlay.
    pub fn clear_current(&self) -> RegistryResult<()> {
        let mut state = self.write_state()?;
        state.overlay = None;
        state.replace_current(None);
        debug!("current document cleared");
        Ok(())
    }

    /// Erase all stored document settings and empty the cache.
    ///
    /// An open document stays open: it is rebuilt from its key against the
    /// live application settings, so its reading history is lost but the
    /// application keeps a current document.
    pub fn delete_all(&self) -> RegistryResult<()> {
        let mut state = self.write_state()?;
        self.store.delete_all()?;
        state.cache.clear();
        state.overlay = None;

        if let Some(old) = state.current.take() {
            let fresh = Arc::new(DocumentSettings::new(old.key.clone(), state.app.clone()));
            state.overlay = Some(fresh.clone());
            state.replace_current(Some(fresh));
        }
        info!("all document settings deleted");
        Ok(())
    }

    // ---- Change propagation ----

    /// Rebuild the application settings from the source and propagate the
    /// change.
    ///
    /// Listeners receive the application change first. If a document is
    /// open it is then migrated to the new settings, persisted, and
    /// listeners receive the document change. An uncommitted edit is not
    /// part of the change and keeps its overlay.
    ///
    /// Returns [`RegistryError::ReentrantChange`] when called from inside a
    /// change notification on the same thread.
    pub fn on_application_settings_changed(&self) -> RegistryResult<()> {
        self.propagate(None)
    }

    /// Shared pipeline for settings changes and editor commits.
    pub(crate) fn propagate(&self, edit: Option<StagedEdit>) -> RegistryResult<()> {
        let _order = self.begin_propagation()?;
        let app = load_settings(self.source.as_ref())?;

        let (pending, persisted) = {
            let mut state = self.write_state()?;
            let old_app = state.install_app(app);
            let new_app = state.app.clone();
            let edit_overlay = edit.as_ref().is_some_and(|e| state.overlay_is(&e.staged));

            let mut persisted = Ok(());
            let document = match state.current.clone() {
                Some(old_doc) => {
                    let edited = match &edit {
                        Some(e) if e.staged.key == old_doc.key => {
                            old_doc.merge_edit(e.base.as_deref(), &e.staged)
                        }
                        _ => old_doc.as_ref().clone(),
                    };
                    let migrated = Arc::new(edited.migrate(new_app.clone()));
                    if edit_overlay || state.overlay.is_none() || state.overlay_is(&old_doc) {
                        state.overlay = Some(migrated.clone());
                    }
                    state.replace_current(Some(migrated.clone()));
                    persisted = self.store.store_document(&migrated);
                    Some((old_doc, migrated))
                }
                None => {
                    state.overlay = None;
                    None
                }
            };

            // An editor commit for a document that is not open goes straight
            // to the store.
            let committed_elsewhere = edit.filter(|e| {
                document.as_ref().map_or(true, |(old, _)| old.key != e.staged.key)
            });
            if let Some(edit) = committed_elsewhere {
                let migrated = Arc::new(edit.staged.migrate(new_app.clone()));
                if persisted.is_ok() {
                    persisted = self.store.store_document(&migrated);
                }
                state.cache.insert(migrated.key.clone(), migrated);
            }

            (
                PendingChanges {
                    app: (old_app, new_app),
                    document,
                },
                persisted,
            )
        };

        info!(generation = pending.app.1.generation(), "application settings updated");
        let (old_app, new_app) = &pending.app;
        self.listeners.notify_application(old_app, new_app)?;
        persisted?;
        if let Some((old_doc, new_doc)) = &pending.document {
            self.listeners.notify_document(old_doc, new_doc)?;
        }
        Ok(())
    }

    /// Take the propagation order lock, refusing a nested change from a
    /// listener running on this thread.
    fn begin_propagation(&self) -> RegistryResult<PropagationGuard<'_>> {
        let me = thread::current().id();
        if *self.propagating.lock().map_err(poisoned)? == Some(me) {
            return Err(RegistryError::ReentrantChange);
        }
        let order = self.propagation.lock().map_err(poisoned)?;
        *self.propagating.lock().map_err(poisoned)? = Some(me);
        Ok(PropagationGuard {
            _order: order,
            owner: &self.propagating,
        })
    }

    // ---- Hot-path field updates ----

    /// Record a page turn on the current document and persist it.
    ///
    /// No-op when no document is open.
    pub fn on_current_page_changed(&self, old: PageIndex, new: PageIndex) -> RegistryResult<()> {
        self.update_current(|doc| {
            if doc.current_page != old {
                debug!(key = %doc.key, expected = %old, actual = %doc.current_page, "page change from unexpected position");
            }
            doc.with_current_page(new)
        })
    }

    /// Record a zoom change on the current document and persist it.
    ///
    /// No-op when no document is open.
    pub fn on_zoom_changed(&self, zoom: f32) -> RegistryResult<()> {
        self.update_current(|doc| doc.with_zoom(zoom))
    }

    /// Swap in an updated copy of the current document and persist it.
    ///
    /// Runs under the write lock so a concurrent structural change can never
    /// observe or lose a half-applied update.
    fn update_current<F>(&self, update: F) -> RegistryResult<()>
    where
        F: FnOnce(&DocumentSettings) -> DocumentSettings,
    {
        let mut state = self.write_state()?;
        let Some(current) = state.current.clone() else {
            return Ok(());
        };
        let next = Arc::new(update(&current));
        state.replace_current(Some(next.clone()));
        state.follow_overlay(&current, Some(&next));
        self.store.store_document(&next)?;
        Ok(())
    }

    // ---- Editing ----

    /// Stage an edited copy of a document's settings.
    ///
    /// The copy becomes the overlay immediately. The returned editor must
    /// be committed or rolled back; dropping it rolls back.
    ///
    /// On commit, values of `doc` that differ from the registry's snapshot
    /// of the same document at this point are applied.
    pub fn edit(&self, doc: DocumentSettings) -> RegistryResult<SettingsEditor<'_>> {
        let base = self.lookup_document(&doc.key)?;
        SettingsEditor::begin(self, Some(doc), base)
    }

    /// Stage an edit of the current document. With no document open the
    /// editor holds nothing and both commit and rollback do nothing.
    pub fn edit_current(&self) -> RegistryResult<SettingsEditor<'_>> {
        let current = self.current_document()?;
        let staged = current.as_ref().map(|doc| doc.as_ref().clone());
        SettingsEditor::begin(self, staged, current)
    }

    /// Replace the overlay and return the previous one.
    pub(crate) fn swap_overlay(
        &self,
        overlay: Option<Arc<DocumentSettings>>,
    ) -> RegistryResult<Option<Arc<DocumentSettings>>> {
        let mut state = self.write_state()?;
        Ok(std::mem::replace(&mut state.overlay, overlay))
    }

    /// End an edit: if the overlay is still `staged`, put back `previous`.
    /// A previous overlay showing the open document is refreshed to the
    /// live snapshot, which may have moved on during the edit.
    pub(crate) fn restore_overlay(
        &self,
        staged: &Arc<DocumentSettings>,
        previous: Option<Arc<DocumentSettings>>,
    ) -> RegistryResult<bool> {
        let mut state = self.write_state()?;
        if !state.overlay_is(staged) {
            return Ok(false);
        }
        let restored = match (previous, &state.current) {
            (Some(prev), Some(current)) if prev.key == current.key => Some(current.clone()),
            (previous, _) => previous,
        };
        state.overlay = restored;
        Ok(true)
    }

    /// Replace the overlay only if it is still `expected`.
    pub(crate) fn swap_overlay_if(
        &self,
        expected: &Arc<DocumentSettings>,
        overlay: Option<Arc<DocumentSettings>>,
    ) -> RegistryResult<bool> {
        let mut state = self.write_state()?;
        if state.overlay.as_ref().is_some_and(|o| Arc::ptr_eq(o, expected)) {
            state.overlay = overlay;
            return Ok(true);
        }
        Ok(false)
    }

    // ---- Listeners ----

    pub fn add_listener(&self, listener: Arc<dyn SettingsListener>) -> RegistryResult<()> {
        self.listeners.add(listener)
    }

    /// Remove a listener by identity. Returns `true` if it was registered.
    pub fn remove_listener(&self, listener: &Arc<dyn SettingsListener>) -> RegistryResult<bool> {
        self.listeners.remove(listener)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl std::fmt::Debug for SettingsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("SettingsRegistry");
        if let Ok(state) = self.state.read() {
            s.field("generation", &state.app.generation())
                .field("cached", &state.cache.len())
                .field("current", &state.current.as_ref().map(|d| d.key.clone()));
        }
        s.field("listeners", &self.listeners).finish()
    }
}

fn poisoned<T>(e: PoisonError<T>) -> RegistryError {
    RegistryError::LockPoisoned(e.to_string())
}

fn load_settings(source: &dyn SettingsSource) -> RegistryResult<ApplicationSettings> {
    let app = source.load()?;
    app.validate()?;
    Ok(app)
}
