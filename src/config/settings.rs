//! User settings for MyBrain
//!
//! Holds the automatic backup schedule. The file is rewritten atomically on
//! every change.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::paths::MyBrainPaths;
use crate::error::{BackupError, BackupResult};
use crate::scheduler::{BackupConfiguration, ConfigStore};
use crate::storage::file_io::{read_json, write_json_atomic};

/// User settings for MyBrain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Automatic backup schedule, if one is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup: Option<BackupConfiguration>,
}

fn default_schema_version() -> u32 {
    1
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            backup: None,
        }
    }
}

impl Settings {
    /// Load settings from disk, or defaults if the file doesn't exist yet
    pub fn load_or_default(paths: &MyBrainPaths) -> BackupResult<Self> {
        read_json(paths.settings_file())
            .map_err(|e| BackupError::Config(format!("Failed to load settings: {}", e)))
    }

    /// Save settings to disk
    pub fn save(&self, paths: &MyBrainPaths) -> BackupResult<()> {
        write_json_atomic(paths.settings_file(), self)
            .map_err(|e| BackupError::Config(format!("Failed to save settings: {}", e)))
    }
}

/// [`ConfigStore`] backed by the settings file
pub struct SettingsStore {
    paths: MyBrainPaths,
    // Serializes read-modify-write cycles on the file
    write_lock: Mutex<()>,
}

impl SettingsStore {
    pub fn new(paths: MyBrainPaths) -> Self {
        Self {
            paths,
            write_lock: Mutex::new(()),
        }
    }

    fn update(&self, backup: Option<BackupConfiguration>) -> BackupResult<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| BackupError::Config(format!("Failed to acquire lock: {}", e)))?;

        let mut settings = Settings::load_or_default(&self.paths)?;
        settings.backup = backup;
        settings.save(&self.paths)
    }
}

impl ConfigStore for SettingsStore {
    fn load(&self) -> BackupResult<Option<BackupConfiguration>> {
        Ok(Settings::load_or_default(&self.paths)?.backup)
    }

    fn save(&self, config: &BackupConfiguration) -> BackupResult<()> {
        self.update(Some(config.clone()))
    }

    fn clear(&self) -> BackupResult<()> {
        self.update(None)
    }
}
