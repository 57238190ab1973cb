//! One registry per application run.

use std::sync::{Arc, OnceLock};

use crate::config::RegistryConfig;
use crate::error::RegistryResult;
use crate::registry::SettingsRegistry;

/// Holds the application's registry once it has been built.
///
/// The application owns the cell (in its top-level context or a `static`) and
/// hands out the registry from it. The first successful `initialize` builds
/// the registry; later calls return the same instance and ignore their
/// arguments. A failed build leaves the cell empty.
#[derive(Debug, Default)]
pub struct RegistryCell {
    cell: OnceLock<Arc<SettingsRegistry>>,
}

impl RegistryCell {
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// Build the registry from `config` on first call.
    pub fn initialize(&self, config: &RegistryConfig) -> RegistryResult<Arc<SettingsRegistry>> {
        self.initialize_with(|| SettingsRegistry::from_config(config))
    }

    /// Build the registry with `build` on first call.
    pub fn initialize_with<F>(&self, build: F) -> RegistryResult<Arc<SettingsRegistry>>
    where
        F: FnOnce() -> RegistryResult<SettingsRegistry>,
    {
        if let Some(registry) = self.cell.get() {
            return Ok(registry.clone());
        }
        let registry = Arc::new(build()?);
        Ok(self.cell.get_or_init(|| registry).clone())
    }

    /// The registry, if initialized.
    pub fn get(&self) -> Option<Arc<SettingsRegistry>> {
        self.cell.get().cloned()
    }
}
