//! Registry configuration: where settings and document records live.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use folio_store::{InMemorySettingsStore, JsonFileSettingsStore, SettingsStore};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RegistryError, RegistryResult};
use crate::registry::SettingsRegistry;
use crate::source::{SettingsSource, StaticSource, TomlFileSource};

/// File name of the application settings inside a data directory.
pub const SETTINGS_FILE_NAME: &str = "settings.toml";

/// Where a registry reads application settings and stores document records.
///
/// Unset locations fall back to in-memory implementations, which is what
/// tests and short-lived tools usually want.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// TOML file holding the application settings.
    pub settings_file: Option<PathBuf>,
    /// Directory holding the document settings store.
    pub store_dir: Option<PathBuf>,
}

impl RegistryConfig {
    /// Keep both the settings file and the document store under `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            settings_file: Some(dir.join(SETTINGS_FILE_NAME)),
            store_dir: Some(dir.to_path_buf()),
        }
    }

    /// Read a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> RegistryResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| RegistryError::Source {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn source(&self) -> Arc<dyn SettingsSource> {
        match &self.settings_file {
            Some(path) => Arc::new(TomlFileSource::new(path)),
            None => Arc::new(StaticSource::default()),
        }
    }

    fn store(&self) -> RegistryResult<Arc<dyn SettingsStore>> {
        Ok(match &self.store_dir {
            Some(dir) => Arc::new(JsonFileSettingsStore::open(dir)?),
            None => Arc::new(InMemorySettingsStore::new()),
        })
    }
}

impl SettingsRegistry {
    /// Build a registry from a configuration.
    pub fn from_config(config: &RegistryConfig) -> RegistryResult<Self> {
        debug!(?config, "building settings registry");
        Self::new(config.source(), config.store()?)
    }
}
