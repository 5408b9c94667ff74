//! Path management for MyBrain
//!
//! ## Path Resolution Order
//!
//! 1. `MYBRAIN_DATA_DIR` environment variable (if set)
//! 2. The platform data directory from `directories`
//!    (e.g. `~/.local/share/mybrain` on Linux)

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::BackupError;

/// Manages all paths used by MyBrain
#[derive(Debug, Clone)]
pub struct MyBrainPaths {
    /// Base directory for all MyBrain data
    base_dir: PathBuf,
}

impl MyBrainPaths {
    /// Create a new MyBrainPaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn new() -> Result<Self, BackupError> {
        let base_dir = if let Ok(custom) = std::env::var("MYBRAIN_DATA_DIR") {
            PathBuf::from(custom)
        } else {
            ProjectDirs::from("", "", "mybrain")
                .map(|dirs| dirs.data_dir().to_path_buf())
                .ok_or_else(|| {
                    BackupError::Config("Could not determine a data directory".into())
                })?
        };

        Ok(Self { base_dir })
    }

    /// Create MyBrainPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the data directory holding the domain stores
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Get the default backup directory
    pub fn backup_dir(&self) -> PathBuf {
        self.base_dir.join("backups")
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("settings.json")
    }

    pub fn notes_file(&self) -> PathBuf {
        self.data_dir().join("notes.json")
    }

    pub fn folders_file(&self) -> PathBuf {
        self.data_dir().join("note_folders.json")
    }

    pub fn tasks_file(&self) -> PathBuf {
        self.data_dir().join("tasks.json")
    }

    pub fn diary_file(&self) -> PathBuf {
        self.data_dir().join("diary.json")
    }

    pub fn bookmarks_file(&self) -> PathBuf {
        self.data_dir().join("bookmarks.json")
    }

    /// Ensure the base, data and backup directories exist
    pub fn ensure_directories(&self) -> Result<(), BackupError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| BackupError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.data_dir())
            .map_err(|e| BackupError::Io(format!("Failed to create data directory: {}", e)))?;

        std::fs::create_dir_all(self.backup_dir())
            .map_err(|e| BackupError::Io(format!("Failed to create backup directory: {}", e)))?;

        Ok(())
    }
}
