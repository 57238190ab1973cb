use std::fmt;

use serde::{Deserialize, Serialize};

/// How a page is fitted into the viewport.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageAlign {
    /// Fit page width.
    #[default]
    Width,
    /// Fit page height.
    Height,
    /// Pick width or height per page from its aspect ratio.
    Auto,
}

impl fmt::Display for PageAlign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Width => "width",
            Self::Height => "height",
            Self::Auto => "auto",
        };
        f.write_str(s)
    }
}

/// Transition used when turning pages in single-page mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageAnimation {
    #[default]
    None,
    Curler,
    Slider,
    Fader,
    Squeezer,
}

impl fmt::Display for PageAnimation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Curler => "curler",
            Self::Slider => "slider",
            Self::Fader => "fader",
            Self::Squeezer => "squeezer",
        };
        f.write_str(s)
    }
}

/// Layout values that a document may override.
///
/// [`ApplicationSettings`](crate::ApplicationSettings) carries the defaults
/// new documents are seeded with; each
/// [`DocumentSettings`](crate::DocumentSettings) carries its own copy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentLayout {
    /// Show landscape scans as two separate pages.
    pub split_pages: bool,
    /// Show one page at a time instead of a continuous scroll.
    pub single_page: bool,
    pub page_align: PageAlign,
    pub animation: PageAnimation,
}
