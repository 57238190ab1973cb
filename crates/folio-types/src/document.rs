use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::app::{ApplicationSettings, MIN_ZOOM};
use crate::key::DocumentKey;
use crate::layout::DocumentLayout;
use crate::page::PageIndex;

/// Immutable snapshot of the settings of one document.
///
/// Every snapshot holds the [`ApplicationSettings`] it was resolved against.
/// That reference is not persisted: records loaded from a store are attached
/// to the live application settings with [`bind`](Self::bind).
///
/// Updates never happen in place. The `with_*` methods and
/// [`migrate`](Self::migrate) return new snapshots, which the registry swaps
/// in as a whole.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DocumentSettings {
    pub key: DocumentKey,
    /// Unix timestamp in milliseconds of the last user-visible change.
    pub last_updated: i64,
    pub current_page: PageIndex,
    pub zoom: f32,
    #[serde(default)]
    pub layout: DocumentLayout,
    #[serde(skip)]
    app: Arc<ApplicationSettings>,
}

impl DocumentSettings {
    /// Settings for a document seen for the first time, seeded from the
    /// application defaults.
    pub fn new(key: DocumentKey, app: Arc<ApplicationSettings>) -> Self {
        Self {
            key,
            last_updated: now_millis(),
            current_page: PageIndex::FIRST,
            zoom: MIN_ZOOM,
            layout: app.document_defaults,
            app,
        }
    }

    /// Re-derive this document under new application settings.
    ///
    /// Position and layout carry over unchanged. Values bounded by the
    /// application settings (zoom) are re-clamped.
    pub fn migrate(&self, app: Arc<ApplicationSettings>) -> Self {
        Self {
            key: self.key.clone(),
            last_updated: self.last_updated,
            current_page: self.current_page,
            zoom: app.clamp_zoom(self.zoom),
            layout: self.layout,
            app,
        }
    }

    /// Apply an edit of this document made against `base`.
    ///
    /// Every value `edited` changed relative to `base` wins; values the edit
    /// left alone keep whatever this snapshot holds, so changes made to the
    /// document while the edit was open survive. Without a base the edit
    /// wins for every value.
    pub fn merge_edit(&self, base: Option<&DocumentSettings>, edited: &DocumentSettings) -> Self {
        fn pick<T: PartialEq + Copy>(ours: T, base: Option<T>, edited: T) -> T {
            match base {
                Some(base) if base == edited => ours,
                _ => edited,
            }
        }
        Self {
            key: self.key.clone(),
            last_updated: self.last_updated.max(edited.last_updated),
            current_page: pick(self.current_page, base.map(|b| b.current_page), edited.current_page),
            zoom: pick(self.zoom, base.map(|b| b.zoom), edited.zoom),
            layout: pick(self.layout, base.map(|b| b.layout), edited.layout),
            app: self.app.clone(),
        }
    }

    /// Attach a loaded record to an application settings snapshot without
    /// re-resolving any value.
    pub fn bind(mut self, app: Arc<ApplicationSettings>) -> Self {
        self.app = app;
        self
    }

    /// The application settings this snapshot was resolved against.
    pub fn app(&self) -> &Arc<ApplicationSettings> {
        &self.app
    }

    /// Returns `true` if this snapshot was resolved against a different
    /// generation than `app`.
    pub fn is_stale(&self, app: &ApplicationSettings) -> bool {
        self.app.generation() != app.generation()
    }

    /// Copy with a new reading position.
    pub fn with_current_page(&self, page: PageIndex) -> Self {
        let mut next = self.clone();
        next.current_page = page;
        next.touch();
        next
    }

    /// Copy with a new zoom factor, clamped to the bound application limits.
    pub fn with_zoom(&self, zoom: f32) -> Self {
        let mut next = self.clone();
        next.zoom = self.app.clamp_zoom(zoom);
        next.touch();
        next
    }

    /// Copy with a new layout.
    pub fn with_layout(&self, layout: DocumentLayout) -> Self {
        let mut next = self.clone();
        next.layout = layout;
        next.touch();
        next
    }

    /// `last_updated` as a UTC timestamp.
    pub fn last_updated_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.last_updated)
    }

    fn touch(&mut self) {
        // Keep the timestamp monotonic for callers that sort by recency.
        self.last_updated = now_millis().max(self.last_updated + 1);
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
