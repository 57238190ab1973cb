//! Settings registry for folio.
//!
//! The registry is the single source of truth for the live application
//! settings and for the settings of the document that is currently open. It
//! keeps loaded document settings in a lookaside cache, writes them through
//! a [`folio_store::SettingsStore`], and tells registered listeners about
//! every change together with a field-level diff.
//!
//! # Architecture
//!
//! - All cache and current-document state sits behind one read-write lock.
//!   Queries take the read lock; every change takes the write lock.
//! - Settings snapshots are immutable and shared through `Arc`. Changes swap
//!   in new snapshots; nothing is mutated in place.
//! - An application settings change is propagated in a fixed order: listeners
//!   hear about the application change first, then about the migrated
//!   current document.
//! - A document edit is staged in a [`SettingsEditor`] and committed through
//!   the same pipeline as an application settings change.
//!
//! # Modules
//!
//! - [`registry`]: [`SettingsRegistry`] and its operations
//! - [`editor`]: [`SettingsEditor`] scoped edits
//! - [`listener`]: [`SettingsListener`] and the [`ListenerSet`]
//! - [`source`]: [`SettingsSource`] implementations
//! - [`config`]: [`RegistryConfig`]
//! - [`bootstrap`]: [`RegistryCell`] for one registry per run

pub mod bootstrap;
pub mod config;
pub mod editor;
pub mod error;
pub mod listener;
pub mod registry;
pub mod source;
mod state;

#[cfg(test)]
mod testing;

pub use bootstrap::RegistryCell;
pub use config::RegistryConfig;
pub use editor::SettingsEditor;
pub use error::{RegistryError, RegistryResult};
pub use listener::{ListenerSet, LoggingListener, SettingsListener};
pub use registry::SettingsRegistry;
pub use source::{SettingsSource, StaticSource, TomlFileSource};
