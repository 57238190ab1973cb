//! Persistence for folio document settings.
//!
//! The registry keeps document settings in memory and writes them through a
//! [`SettingsStore`]. Stores persist plain records; binding a record to the
//! live application settings is the registry's job.
//!
//! # Storage Backends
//!
//! All backends implement the [`SettingsStore`] trait:
//!
//! - [`InMemorySettingsStore`] -- `HashMap`-based store for tests and embedding
//! - [`JsonFileSettingsStore`] -- single JSON file, rewritten atomically on every change
//!
//! # Design Rules
//!
//! 1. Every call is atomic on its own; there are no multi-call transactions.
//! 2. Stores never interpret settings values beyond ordering by `last_updated`.
//! 3. All I/O errors are propagated, never silently ignored or retried.

pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use file::JsonFileSettingsStore;
pub use memory::InMemorySettingsStore;
pub use traits::SettingsStore;
