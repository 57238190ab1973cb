use std::sync::Arc;

use crate::app::{ApplicationSettings, MIN_ZOOM};
use crate::document::DocumentSettings;
use crate::layout::{DocumentLayout, PageAlign, PageAnimation};

/// Application settings as seen through an optional document overlay.
///
/// The overlay is the document currently selected or being edited. While it
/// is present, document-scoped values come from it instead of the
/// application defaults. Global values always come from the application
/// snapshot.
#[derive(Clone, Debug)]
pub struct EffectiveSettings {
    app: Arc<ApplicationSettings>,
    overlay: Option<Arc<DocumentSettings>>,
}

impl EffectiveSettings {
    pub fn new(app: Arc<ApplicationSettings>, overlay: Option<Arc<DocumentSettings>>) -> Self {
        Self { app, overlay }
    }

    pub fn app(&self) -> &ApplicationSettings {
        &self.app
    }

    pub fn overlay(&self) -> Option<&DocumentSettings> {
        self.overlay.as_deref()
    }

    pub fn has_overlay(&self) -> bool {
        self.overlay.is_some()
    }

    pub fn layout(&self) -> DocumentLayout {
        match &self.overlay {
            Some(doc) => doc.layout,
            None => self.app.document_defaults,
        }
    }

    pub fn split_pages(&self) -> bool {
        self.layout().split_pages
    }

    pub fn single_page(&self) -> bool {
        self.layout().single_page
    }

    pub fn page_align(&self) -> PageAlign {
        self.layout().page_align
    }

    pub fn animation(&self) -> PageAnimation {
        self.layout().animation
    }

    /// Zoom of the overlay document, clamped to the live limits.
    pub fn zoom(&self) -> f32 {
        self.overlay
            .as_ref()
            .map_or(MIN_ZOOM, |doc| self.app.clamp_zoom(doc.zoom))
    }
}
