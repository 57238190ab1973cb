use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::layout::DocumentLayout;

/// Smallest zoom factor a document can be shown at.
pub const MIN_ZOOM: f32 = 1.0;

/// Default upper bound for document zoom.
pub const DEFAULT_MAX_ZOOM: f32 = 8.0;

/// Immutable snapshot of the global application settings.
///
/// A snapshot is built once from a settings source and never mutated
/// afterwards; a settings change installs a whole new snapshot. The
/// `generation` counter is assigned by the registry when a snapshot becomes
/// live and lets a [`DocumentSettings`](crate::DocumentSettings) tell whether
/// it was resolved against the live snapshot. It is not serialized.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationSettings {
    #[serde(skip)]
    generation: u64,
    /// Render pages with inverted colors.
    pub night_mode: bool,
    pub keep_screen_on: bool,
    pub full_screen: bool,
    pub show_title: bool,
    /// Append the current page number to the window title.
    pub page_in_title: bool,
    /// Screen brightness in percent.
    pub brightness: u8,
    pub max_zoom: f32,
    /// Layout new documents are seeded with.
    pub document_defaults: DocumentLayout,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            generation: 0,
            night_mode: false,
            keep_screen_on: true,
            full_screen: false,
            show_title: true,
            page_in_title: true,
            brightness: 100,
            max_zoom: DEFAULT_MAX_ZOOM,
            document_defaults: DocumentLayout::default(),
        }
    }
}

impl ApplicationSettings {
    /// The generation this snapshot was installed under (0 if never installed).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Return this snapshot stamped with the given generation.
    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), TypeError> {
        if self.brightness > 100 {
            return Err(TypeError::InvalidBrightness(self.brightness));
        }
        if self.max_zoom.is_nan() || self.max_zoom < MIN_ZOOM {
            return Err(TypeError::InvalidMaxZoom(self.max_zoom));
        }
        Ok(())
    }

    /// Clamp a zoom factor into `[MIN_ZOOM, max_zoom]`. NaN maps to `MIN_ZOOM`.
    pub fn clamp_zoom(&self, zoom: f32) -> f32 {
        if zoom.is_nan() {
            return MIN_ZOOM;
        }
        zoom.clamp(MIN_ZOOM, self.max_zoom.max(MIN_ZOOM))
    }
}
