//! Diff engine for folio.
//!
//! Compares two snapshots of the same settings kind and reports which
//! logical fields changed. Snapshots are compared through their serialized
//! form, so nested structs show up as dotted field paths
//! (`document_defaults.page_align`, `current_page.view_index`).
//!
//! Diffs are notification payloads only: the registry never branches on them.
//!
//! # Key Types
//!
//! - [`SettingsDiff`] / [`FieldChange`] -- Field-level diff of two snapshots

pub mod error;
pub mod settings_diff;

pub use error::{DiffError, DiffResult};
pub use settings_diff::{
    diff_application, diff_document, diff_fields, diff_settings, flatten, FieldChange,
    SettingsDiff,
};
