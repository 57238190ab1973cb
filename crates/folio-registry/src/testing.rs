//! Shared fixtures for registry tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use folio_diff::SettingsDiff;
use folio_store::{InMemorySettingsStore, SettingsStore, StoreError, StoreResult};
use folio_types::{ApplicationSettings, DocumentKey, DocumentSettings};

use crate::listener::SettingsListener;
use crate::registry::SettingsRegistry;
use crate::source::StaticSource;

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Event {
    App { listener: &'static str, fields: Vec<String> },
    Doc { listener: &'static str, key: String, fields: Vec<String> },
}

impl Event {
    pub(crate) fn is_app(&self) -> bool {
        matches!(self, Event::App { .. })
    }
}

/// Records every notification into a log shared between recorders, so the
/// relative order across listeners is visible.
pub(crate) struct Recorder {
    name: &'static str,
    log: Arc<Mutex<Vec<Event>>>,
}

impl Recorder {
    pub(crate) fn new(name: &'static str, log: &Arc<Mutex<Vec<Event>>>) -> Arc<Self> {
        Arc::new(Self {
            name,
            log: log.clone(),
        })
    }
}

fn fields(diff: &SettingsDiff) -> Vec<String> {
    diff.changed_fields().map(str::to_string).collect()
}

impl SettingsListener for Recorder {
    fn on_application_settings_changed(
        &self,
        _old: &ApplicationSettings,
        _new: &ApplicationSettings,
        diff: &SettingsDiff,
    ) {
        self.log.lock().unwrap().push(Event::App {
            listener: self.name,
            fields: fields(diff),
        });
    }

    fn on_document_settings_changed(
        &self,
        _old: &DocumentSettings,
        new: &DocumentSettings,
        diff: &SettingsDiff,
    ) {
        self.log.lock().unwrap().push(Event::Doc {
            listener: self.name,
            key: new.key.to_string(),
            fields: fields(diff),
        });
    }
}

/// A store that can be switched into failing writes.
#[derive(Default)]
pub(crate) struct FlakyStore {
    pub(crate) inner: InMemorySettingsStore,
    pub(crate) fail_writes: AtomicBool,
}

impl FlakyStore {
    pub(crate) fn fail(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::other("disk full")));
        }
        Ok(())
    }
}

impl SettingsStore for FlakyStore {
    fn get_document(&self, key: &DocumentKey) -> StoreResult<Option<DocumentSettings>> {
        self.inner.get_document(key)
    }

    fn all_documents(&self, include_all: bool) -> StoreResult<BTreeMap<DocumentKey, DocumentSettings>> {
        self.inner.all_documents(include_all)
    }

    fn store_document(&self, doc: &DocumentSettings) -> StoreResult<()> {
        self.check()?;
        self.inner.store_document(doc)
    }

    fn delete_all(&self) -> StoreResult<()> {
        self.check()?;
        self.inner.delete_all()
    }
}

pub(crate) struct Fixture {
    pub(crate) source: Arc<StaticSource>,
    pub(crate) store: Arc<InMemorySettingsStore>,
    pub(crate) registry: SettingsRegistry,
    pub(crate) log: Arc<Mutex<Vec<Event>>>,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        let source = Arc::new(StaticSource::default());
        let store = Arc::new(InMemorySettingsStore::new());
        let registry = SettingsRegistry::new(source.clone(), store.clone()).unwrap();
        Self {
            source,
            store,
            registry,
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Register a recorder writing into the fixture's log.
    pub(crate) fn listen(&self, name: &'static str) {
        self.registry
            .add_listener(Recorder::new(name, &self.log))
            .unwrap();
    }

    pub(crate) fn events(&self) -> Vec<Event> {
        self.log.lock().unwrap().clone()
    }
}

pub(crate) fn key(s: &str) -> DocumentKey {
    DocumentKey::new(s).unwrap()
}
