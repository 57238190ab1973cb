//! Foundation types for folio.
//!
//! This crate provides the settings snapshots shared by every other folio
//! crate: the global [`ApplicationSettings`], the per-document
//! [`DocumentSettings`] keyed by [`DocumentKey`], and the
//! [`EffectiveSettings`] view that layers a staged document over the global
//! defaults.
//!
//! # Key Types
//!
//! - [`DocumentKey`]: Identity of a document (usually its path)
//! - [`PageIndex`]: Position within a document
//! - [`DocumentLayout`]: Page layout values a document may override
//! - [`ApplicationSettings`]: Immutable global settings snapshot
//! - [`DocumentSettings`]: Immutable per-document settings snapshot
//! - [`EffectiveSettings`]: Application settings plus an optional document overlay

pub mod app;
pub mod document;
pub mod effective;
pub mod error;
pub mod key;
pub mod layout;
pub mod page;

pub use app::ApplicationSettings;
pub use document::DocumentSettings;
pub use effective::EffectiveSettings;
pub use error::TypeError;
pub use key::DocumentKey;
pub use layout::{DocumentLayout, PageAlign, PageAnimation};
pub use page::PageIndex;
