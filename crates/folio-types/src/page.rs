use std::fmt;

use serde::{Deserialize, Serialize};

/// Position within a document.
///
/// `doc_index` is the page number in the source document; `view_index` is
/// the page as shown, which differs from `doc_index` when pages are split.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageIndex {
    pub doc_index: u32,
    pub view_index: u32,
}

impl PageIndex {
    /// The first page of any document.
    pub const FIRST: PageIndex = PageIndex {
        doc_index: 0,
        view_index: 0,
    };

    pub const fn new(doc_index: u32, view_index: u32) -> Self {
        Self {
            doc_index,
            view_index,
        }
    }
}

impl fmt::Display for PageIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.doc_index, self.view_index)
    }
}
