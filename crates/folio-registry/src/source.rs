//! Where application settings come from.
//!
//! The registry rebuilds its [`ApplicationSettings`] snapshot from a
//! [`SettingsSource`] at startup and on every settings change.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use folio_types::ApplicationSettings;
use tracing::debug;

use crate::error::{RegistryError, RegistryResult};

/// Produces fresh application settings snapshots.
pub trait SettingsSource: Send + Sync {
    /// Build a new snapshot from the current state of the source.
    fn load(&self) -> RegistryResult<ApplicationSettings>;
}

/// A source holding settings in memory.
///
/// Useful for embedding and tests: change the held value with
/// [`set`](Self::set) or [`update`](Self::update), then tell the registry
/// that settings changed.
#[derive(Debug, Default)]
pub struct StaticSource {
    settings: RwLock<ApplicationSettings>,
}

impl StaticSource {
    pub fn new(settings: ApplicationSettings) -> Self {
        Self {
            settings: RwLock::new(settings),
        }
    }

    /// Replace the held settings.
    pub fn set(&self, settings: ApplicationSettings) -> RegistryResult<()> {
        let mut held = self
            .settings
            .write()
            .map_err(|e| RegistryError::LockPoisoned(e.to_string()))?;
        *held = settings;
        Ok(())
    }

    /// Modify the held settings in place.
    pub fn update<F>(&self, f: F) -> RegistryResult<()>
    where
        F: FnOnce(&mut ApplicationSettings),
    {
        let mut held = self
            .settings
            .write()
            .map_err(|e| RegistryError::LockPoisoned(e.to_string()))?;
        f(&mut held);
        Ok(())
    }
}

impl SettingsSource for StaticSource {
    fn load(&self) -> RegistryResult<ApplicationSettings> {
        let held = self
            .settings
            .read()
            .map_err(|e| RegistryError::LockPoisoned(e.to_string()))?;
        Ok(held.clone())
    }
}

/// A source reading settings from a TOML file.
///
/// A missing file yields default settings. Missing keys take their default
/// values.
#[derive(Clone, Debug)]
pub struct TomlFileSource {
    path: PathBuf,
}

impl TomlFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `settings` to the file, creating parent directories.
    pub fn save(&self, settings: &ApplicationSettings) -> RegistryResult<()> {
        settings.validate()?;
        let text = toml::to_string_pretty(settings).map_err(|e| self.source_error(e))?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, text)?;
        Ok(())
    }

    fn source_error(&self, e: impl std::fmt::Display) -> RegistryError {
        RegistryError::Source {
            path: self.path.clone(),
            reason: e.to_string(),
        }
    }
}

impl SettingsSource for TomlFileSource {
    fn load(&self) -> RegistryResult<ApplicationSettings> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "settings file missing, using defaults");
                return Ok(ApplicationSettings::default());
            }
            Err(e) => return Err(e.into()),
        };
        let settings: ApplicationSettings = toml::from_str(&text).map_err(|e| self.source_error(e))?;
        settings.validate()?;
        Ok(settings)
    }
}
