//! Backup destinations
//!
//! A destination is an opaque location string handed over by the caller. The
//! engines read and write whole byte buffers through [`BackupStorage`]; how a
//! location maps onto real storage is the implementation's business.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::{BackupError, BackupResult};

use super::file_io::write_bytes_atomic;

/// Where backups are read from and written to
#[async_trait]
pub trait BackupStorage: Send + Sync {
    /// Read the whole content at `location`
    async fn read(&self, location: &str) -> BackupResult<Vec<u8>>;

    /// Replace the content at `location` so that a crash never leaves a
    /// half-written file behind
    async fn write_atomic(&self, location: &str, bytes: Vec<u8>) -> BackupResult<()>;

    /// Location of a file named `name` inside the directory `dir`
    fn join(&self, dir: &str, name: &str) -> String {
        format!("{}/{}", dir.trim_end_matches('/'), name)
    }
}

/// Destinations on the local filesystem; locations are paths
#[derive(Debug, Clone, Default)]
pub struct FileSystemStorage;

impl FileSystemStorage {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BackupStorage for FileSystemStorage {
    async fn read(&self, location: &str) -> BackupResult<Vec<u8>> {
        tokio::fs::read(location)
            .await
            .map_err(|e| BackupError::Io(format!("Failed to read {}: {}", location, e)))
    }

    async fn write_atomic(&self, location: &str, bytes: Vec<u8>) -> BackupResult<()> {
        let path = PathBuf::from(location);
        tokio::task::spawn_blocking(move || write_bytes_atomic(&path, &bytes))
            .await?
            .map_err(|e| BackupError::Io(format!("Failed to write {}: {}", location, e)))
    }

    fn join(&self, dir: &str, name: &str) -> String {
        PathBuf::from(dir).join(name).to_string_lossy().to_string()
    }
}
