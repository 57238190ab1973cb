//! Scoped staging of document settings edits.

use std::sync::Arc;

use folio_types::DocumentSettings;
use tracing::{debug, warn};

use crate::error::RegistryResult;
use crate::registry::SettingsRegistry;

/// A committed edit: the staged copy and the snapshot it was made against.
pub(crate) struct StagedEdit {
    pub(crate) base: Option<Arc<DocumentSettings>>,
    pub(crate) staged: Arc<DocumentSettings>,
}

/// An in-progress edit of one document's settings.
///
/// Created by [`SettingsRegistry::edit`]. While the editor is alive its
/// staged copy is the registry's overlay, so effective settings reflect the
/// edit before it is committed. Exactly one of [`commit`](Self::commit) or
/// [`rollback`](Self::rollback) ends the edit; both consume the editor.
/// Dropping an editor without either rolls it back.
#[must_use = "an editor rolls back when dropped; call commit() to keep the edit"]
pub struct SettingsEditor<'a> {
    registry: &'a SettingsRegistry,
    staged: Option<Arc<DocumentSettings>>,
    /// The registry's snapshot of the document when the edit began.
    base: Option<Arc<DocumentSettings>>,
    /// Overlay in effect before the edit began, restored on rollback.
    previous: Option<Arc<DocumentSettings>>,
    finished: bool,
}

impl<'a> SettingsEditor<'a> {
    pub(crate) fn begin(
        registry: &'a SettingsRegistry,
        doc: Option<DocumentSettings>,
        base: Option<Arc<DocumentSettings>>,
    ) -> RegistryResult<Self> {
        let staged = doc.map(Arc::new);
        let previous = match &staged {
            Some(doc) => {
                debug!(key = %doc.key, "edit started");
                registry.swap_overlay(Some(doc.clone()))?
            }
            None => None,
        };
        Ok(Self {
            registry,
            staged,
            base,
            previous,
            finished: false,
        })
    }

    /// The staged copy, if the editor holds one.
    pub fn staged(&self) -> Option<&DocumentSettings> {
        self.staged.as_deref()
    }

    /// Modify the staged copy and refresh the overlay with the result.
    pub fn update<F>(&mut self, f: F) -> RegistryResult<()>
    where
        F: FnOnce(&mut DocumentSettings),
    {
        let Some(staged) = &self.staged else {
            return Ok(());
        };
        let mut next = staged.as_ref().clone();
        f(&mut next);
        let next = Arc::new(next);
        self.registry.swap_overlay_if(staged, Some(next.clone()))?;
        self.staged = Some(next);
        Ok(())
    }

    /// Commit the edit through the full settings-change pipeline.
    ///
    /// Every value the edit changed relative to the snapshot it started from
    /// is applied; values it left alone keep their live state. Listeners see
    /// one application change followed by one document change when the
    /// edited document is open. An editor holding nothing commits nothing.
    pub fn commit(mut self) -> RegistryResult<()> {
        self.finished = true;
        match self.staged.take() {
            Some(staged) => {
                debug!(key = %staged.key, "edit committed");
                self.registry.propagate(Some(StagedEdit {
                    base: self.base.take(),
                    staged,
                }))
            }
            None => Ok(()),
        }
    }

    /// Discard the edit and restore the overlay in effect before it began.
    /// Nothing is persisted and no listener is notified.
    pub fn rollback(mut self) -> RegistryResult<()> {
        self.finished = true;
        self.restore()
    }

    fn restore(&mut self) -> RegistryResult<()> {
        if let Some(staged) = self.staged.take() {
            // No-op when another overlay has replaced ours since.
            self.registry.restore_overlay(&staged, self.previous.take())?;
        }
        Ok(())
    }
}

impl Drop for SettingsEditor<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        match self.restore() {
            Ok(()) => debug!("editor dropped without commit, rolled back"),
            Err(e) => warn!(error = %e, "editor rollback on drop failed"),
        }
    }
}

impl std::fmt::Debug for SettingsEditor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsEditor")
            .field("staged", &self.staged.as_ref().map(|d| d.key.clone()))
            .field("finished", &self.finished)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use folio_store::SettingsStore;
    use folio_types::{PageAlign, PageAnimation, PageIndex};

    use crate::testing::{key, Event, Fixture};

    #[test]
    fn edit_layers_staged_copy_immediately() {
        let fx = Fixture::new();
        let doc = fx.registry.select_document(&key("a.pdf")).unwrap();
        let mut edited = doc.as_ref().clone();
        edited.layout.single_page = true;

        let editor = fx.registry.edit(edited).unwrap();
        assert!(fx.registry.effective_settings().unwrap().single_page());
        assert!(!fx.registry.current_document().unwrap().unwrap().layout.single_page);
        editor.rollback().unwrap();
    }

    #[test]
    fn rollback_restores_previous_overlay() {
        let fx = Fixture::new();
        fx.listen("l");
        let doc = fx.registry.select_document(&key("a.pdf")).unwrap();
        let writes = fx.store.write_count();

        let mut edited = doc.as_ref().clone();
        edited.layout.page_align = PageAlign::Auto;
        let editor = fx.registry.edit(edited).unwrap();
        editor.rollback().unwrap();

        let effective = fx.registry.effective_settings().unwrap();
        assert_eq!(effective.overlay(), Some(doc.as_ref()));
        assert_eq!(effective.page_align(), PageAlign::Width);
        assert_eq!(fx.store.write_count(), writes);
        assert!(fx.events().is_empty());
    }

    #[test]
    fn rollback_without_prior_overlay_clears_it() {
        let fx = Fixture::new();
        let app = fx.registry.application_settings().unwrap();
        let doc = folio_types::DocumentSettings::new(key("a.pdf"), app);

        let editor = fx.registry.edit(doc).unwrap();
        assert!(fx.registry.effective_settings().unwrap().has_overlay());
        editor.rollback().unwrap();
        assert!(!fx.registry.effective_settings().unwrap().has_overlay());
    }

    #[test]
    fn commit_runs_one_notification_cycle() {
        let fx = Fixture::new();
        fx.listen("l");
        let doc = fx.registry.select_document(&key("a.pdf")).unwrap();

        let mut edited = doc.as_ref().clone();
        edited.layout.animation = PageAnimation::Slider;
        fx.registry.edit(edited).unwrap().commit().unwrap();

        let events = fx.events();
        assert_eq!(events.len(), 2);
        assert!(events[0].is_app());
        match &events[1] {
            Event::Doc { key, fields, .. } => {
                assert_eq!(key, "a.pdf");
                assert_eq!(fields, &vec!["layout.animation".to_string()]);
            }
            other => panic!("expected document event, got {:?}", other),
        }

        let current = fx.registry.current_document().unwrap().unwrap();
        assert_eq!(current.layout.animation, PageAnimation::Slider);
        let stored = fx.store.get_document(&current.key).unwrap().unwrap();
        assert_eq!(stored.layout.animation, PageAnimation::Slider);
        assert_eq!(fx.registry.effective_settings().unwrap().animation(), PageAnimation::Slider);
    }

    #[test]
    fn commit_keeps_page_turns_made_during_edit() {
        let fx = Fixture::new();
        let doc = fx.registry.select_document(&key("a.pdf")).unwrap();
        let mut edited = doc.as_ref().clone();
        edited.layout.split_pages = true;

        let editor = fx.registry.edit(edited).unwrap();
        fx.registry
            .on_current_page_changed(PageIndex::FIRST, PageIndex::new(8, 8))
            .unwrap();
        editor.commit().unwrap();

        let current = fx.registry.current_document().unwrap().unwrap();
        assert!(current.layout.split_pages);
        assert_eq!(current.current_page, PageIndex::new(8, 8));
    }

    #[test]
    fn update_refreshes_overlay() {
        let fx = Fixture::new();
        fx.registry.select_document(&key("a.pdf")).unwrap();

        let mut editor = fx.registry.edit_current().unwrap();
        editor.update(|doc| doc.layout.single_page = true).unwrap();
        assert!(editor.staged().unwrap().layout.single_page);
        assert!(fx.registry.effective_settings().unwrap().single_page());

        editor.update(|doc| doc.layout.single_page = false).unwrap();
        assert!(!fx.registry.effective_settings().unwrap().single_page());
        editor.commit().unwrap();
    }

    #[test]
    fn dropping_editor_rolls_back() {
        let fx = Fixture::new();
        fx.listen("l");
        let doc = fx.registry.select_document(&key("a.pdf")).unwrap();

        {
            let mut editor = fx.registry.edit_current().unwrap();
            editor.update(|d| d.layout.split_pages = true).unwrap();
            assert!(fx.registry.effective_settings().unwrap().split_pages());
        }

        let effective = fx.registry.effective_settings().unwrap();
        assert_eq!(effective.overlay(), Some(doc.as_ref()));
        assert!(fx.events().is_empty());
    }

    #[test]
    fn empty_editor_does_nothing() {
        let fx = Fixture::new();
        fx.listen("l");

        let editor = fx.registry.edit_current().unwrap();
        assert!(editor.staged().is_none());
        editor.commit().unwrap();

        fx.registry.edit_current().unwrap().rollback().unwrap();
        assert!(fx.events().is_empty());
        assert_eq!(fx.registry.application_settings().unwrap().generation(), 1);
    }

    #[test]
    fn commit_for_unopened_document_goes_to_store() {
        let fx = Fixture::new();
        fx.listen("l");
        fx.registry.select_document(&key("open.pdf")).unwrap();

        let app = fx.registry.application_settings().unwrap();
        let mut other = folio_types::DocumentSettings::new(key("closed.pdf"), app);
        other.layout.page_align = PageAlign::Height;
        fx.registry.edit(other).unwrap().commit().unwrap();

        let stored = fx.store.get_document(&key("closed.pdf")).unwrap().unwrap();
        assert_eq!(stored.layout.page_align, PageAlign::Height);
        let current = fx.registry.current_document().unwrap().unwrap();
        assert_eq!(current.key, key("open.pdf"));
        assert_eq!(current.layout.page_align, PageAlign::Width);

        let events = fx.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[1], Event::Doc { key, .. } if key == "open.pdf"));
    }

    #[test]
    fn page_turn_keeps_edit_in_progress_visible() {
        let fx = Fixture::new();
        fx.registry.select_document(&key("a.pdf")).unwrap();

        let mut editor = fx.registry.edit_current().unwrap();
        editor.update(|doc| doc.layout.single_page = true).unwrap();
        fx.registry
            .on_current_page_changed(PageIndex::FIRST, PageIndex::new(3, 3))
            .unwrap();
        fx.registry.on_zoom_changed(2.0).unwrap();
        assert!(fx.registry.effective_settings().unwrap().single_page());

        editor.update(|doc| doc.layout.page_align = PageAlign::Auto).unwrap();
        let effective = fx.registry.effective_settings().unwrap();
        assert!(effective.single_page());
        assert_eq!(effective.page_align(), PageAlign::Auto);

        editor.commit().unwrap();
        let current = fx.registry.current_document().unwrap().unwrap();
        assert!(current.layout.single_page);
        assert_eq!(current.layout.page_align, PageAlign::Auto);
        assert_eq!(current.current_page, PageIndex::new(3, 3));
        assert_eq!(current.zoom, 2.0);
    }

    #[test]
    fn reload_keeps_edit_in_progress_visible() {
        let fx = Fixture::new();
        fx.registry.select_document(&key("a.pdf")).unwrap();

        let mut editor = fx.registry.edit_current().unwrap();
        editor.update(|doc| doc.layout.split_pages = true).unwrap();
        fx.registry.all_documents().unwrap();
        assert!(fx.registry.effective_settings().unwrap().split_pages());
        editor.rollback().unwrap();
    }

    #[test]
    fn commit_applies_position_and_zoom_of_open_document() {
        let fx = Fixture::new();
        fx.registry.select_document(&key("a.pdf")).unwrap();

        let mut editor = fx.registry.edit_current().unwrap();
        editor
            .update(|doc| {
                doc.zoom = 3.0;
                doc.current_page = PageIndex::new(5, 5);
            })
            .unwrap();
        editor.commit().unwrap();

        let current = fx.registry.current_document().unwrap().unwrap();
        assert_eq!((current.zoom, current.current_page), (3.0, PageIndex::new(5, 5)));
        let stored = fx.store.get_document(&current.key).unwrap().unwrap();
        assert_eq!((stored.zoom, stored.current_page), (3.0, PageIndex::new(5, 5)));
    }

    #[test]
    fn settings_change_leaves_open_edit_uncommitted() {
        let fx = Fixture::new();
        fx.registry.select_document(&key("a.pdf")).unwrap();

        let mut editor = fx.registry.edit_current().unwrap();
        editor.update(|doc| doc.layout.single_page = true).unwrap();
        fx.registry.on_application_settings_changed().unwrap();

        assert!(!fx.registry.current_document().unwrap().unwrap().layout.single_page);
        assert!(fx.registry.effective_settings().unwrap().single_page());

        editor.rollback().unwrap();
        let effective = fx.registry.effective_settings().unwrap();
        let current = fx.registry.current_document().unwrap().unwrap();
        assert!(!effective.single_page());
        assert_eq!(effective.overlay(), Some(current.as_ref()));
    }
}
