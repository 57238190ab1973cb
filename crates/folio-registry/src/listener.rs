//! Change listeners and their registration set.

use std::sync::{Arc, RwLock};

use folio_diff::{diff_application, diff_document, SettingsDiff};
use folio_types::{ApplicationSettings, DocumentSettings};
use tracing::{debug, info};

use crate::error::{RegistryError, RegistryResult};

/// Receives settings change notifications.
///
/// Callbacks run synchronously on the thread that triggered the change,
/// after the registry has released its state lock, so a listener may query
/// and update the registry. Starting another settings change (an editor
/// commit or `on_application_settings_changed`) from a callback fails with
/// `RegistryError::ReentrantChange`. Both methods default to doing nothing.
pub trait SettingsListener: Send + Sync {
    fn on_application_settings_changed(
        &self,
        _old: &ApplicationSettings,
        _new: &ApplicationSettings,
        _diff: &SettingsDiff,
    ) {
    }

    fn on_document_settings_changed(
        &self,
        _old: &DocumentSettings,
        _new: &DocumentSettings,
        _diff: &SettingsDiff,
    ) {
    }
}

/// Ordered set of registered listeners.
///
/// Guarded by its own lock, independent of the registry state. Fan-out
/// iterates over a snapshot, so listeners added or removed during a
/// notification take effect from the next one.
#[derive(Default)]
pub struct ListenerSet {
    listeners: RwLock<Vec<Arc<dyn SettingsListener>>>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listener. Registering the same listener twice delivers
    /// every notification to it twice.
    pub fn add(&self, listener: Arc<dyn SettingsListener>) -> RegistryResult<()> {
        let mut listeners = self
            .listeners
            .write()
            .map_err(|e| RegistryError::LockPoisoned(e.to_string()))?;
        listeners.push(listener);
        Ok(())
    }

    /// Remove the first registration of `listener`, compared by identity.
    ///
    /// Returns `true` if a registration was removed.
    pub fn remove(&self, listener: &Arc<dyn SettingsListener>) -> RegistryResult<bool> {
        let mut listeners = self
            .listeners
            .write()
            .map_err(|e| RegistryError::LockPoisoned(e.to_string()))?;
        let position = listeners
            .iter()
            .position(|l| std::ptr::addr_eq(Arc::as_ptr(l), Arc::as_ptr(listener)));
        Ok(match position {
            Some(index) => {
                listeners.remove(index);
                true
            }
            None => false,
        })
    }

    pub fn len(&self) -> usize {
        self.listeners.read().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self) -> RegistryResult<Vec<Arc<dyn SettingsListener>>> {
        let listeners = self
            .listeners
            .read()
            .map_err(|e| RegistryError::LockPoisoned(e.to_string()))?;
        Ok(listeners.clone())
    }

    /// Diff two application snapshots and deliver the change to every
    /// listener in registration order.
    pub fn notify_application(
        &self,
        old: &ApplicationSettings,
        new: &ApplicationSettings,
    ) -> RegistryResult<()> {
        let listeners = self.snapshot()?;
        let diff = diff_application(old, new)?;
        debug!(
            generation = new.generation(),
            changed = diff.len(),
            listeners = listeners.len(),
            "application settings changed"
        );
        for listener in &listeners {
            listener.on_application_settings_changed(old, new, &diff);
        }
        Ok(())
    }

    /// Diff two document snapshots and deliver the change to every listener
    /// in registration order.
    pub fn notify_document(&self, old: &DocumentSettings, new: &DocumentSettings) -> RegistryResult<()> {
        let listeners = self.snapshot()?;
        let diff = diff_document(old, new)?;
        debug!(
            key = %new.key,
            changed = diff.len(),
            listeners = listeners.len(),
            "document settings changed"
        );
        for listener in &listeners {
            listener.on_document_settings_changed(old, new, &diff);
        }
        Ok(())
    }
}

impl std::fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerSet")
            .field("listener_count", &self.len())
            .finish()
    }
}

/// A listener that logs every notification at `info` level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingListener;

impl SettingsListener for LoggingListener {
    fn on_application_settings_changed(
        &self,
        _old: &ApplicationSettings,
        new: &ApplicationSettings,
        diff: &SettingsDiff,
    ) {
        let fields: Vec<&str> = diff.changed_fields().collect();
        info!(generation = new.generation(), ?fields, "application settings changed");
    }

    fn on_document_settings_changed(
        &self,
        _old: &DocumentSettings,
        new: &DocumentSettings,
        diff: &SettingsDiff,
    ) {
        let fields: Vec<&str> = diff.changed_fields().collect();
        info!(key = %new.key, ?fields, "document settings changed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use folio_types::DocumentKey;

    struct Tally {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl SettingsListener for Tally {
        fn on_application_settings_changed(
            &self,
            _old: &ApplicationSettings,
            _new: &ApplicationSettings,
            diff: &SettingsDiff,
        ) {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}:app:{}", self.name, diff.len()));
        }

        fn on_document_settings_changed(
            &self,
            _old: &DocumentSettings,
            new: &DocumentSettings,
            _diff: &SettingsDiff,
        ) {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}:doc:{}", self.name, new.key));
        }
    }

    fn tally(name: &'static str, log: &Arc<Mutex<Vec<String>>>) -> Arc<dyn SettingsListener> {
        Arc::new(Tally {
            name,
            log: log.clone(),
        })
    }

    #[test]
    fn notifies_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let set = ListenerSet::new();
        set.add(tally("first", &log)).unwrap();
        set.add(tally("second", &log)).unwrap();

        let old = ApplicationSettings::default();
        let mut new = ApplicationSettings::default();
        new.night_mode = true;
        set.notify_application(&old, &new).unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["first:app:1", "second:app:1"]);
    }

    #[test]
    fn document_notification_carries_new_snapshot() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let set = ListenerSet::new();
        set.add(tally("l", &log)).unwrap();

        let old = DocumentSettings::new(
            DocumentKey::new("a.pdf").unwrap(),
            Arc::new(ApplicationSettings::default()),
        );
        let new = old.with_zoom(2.0);
        set.notify_document(&old, &new).unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["l:doc:a.pdf"]);
    }

    #[test]
    fn remove_by_identity() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let set = ListenerSet::new();
        let a = tally("a", &log);
        let b = tally("b", &log);
        set.add(a.clone()).unwrap();
        set.add(b.clone()).unwrap();
        set.add(a.clone()).unwrap();

        assert!(set.remove(&a).unwrap());
        assert_eq!(set.len(), 2);

        let app = ApplicationSettings::default();
        set.notify_application(&app, &app).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["b:app:0", "a:app:0"]);

        assert!(set.remove(&a).unwrap());
        assert!(!set.remove(&a).unwrap());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn empty_set_still_accepts_notifications() {
        let set = ListenerSet::new();
        let app = ApplicationSettings::default();
        assert!(set.is_empty());
        set.notify_application(&app, &app).unwrap();
    }
}
