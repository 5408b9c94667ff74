//! JSON-file repository for any record type
//!
//! Manages loading and saving one domain's records to a JSON file. Mutations
//! stay in memory until [`JsonRepository::save`] is called, or until the
//! file is staged with [`JsonRepository::stage`] and committed together with
//! other files.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{BackupError, BackupResult};
use crate::models::{Record, RecordId};

use super::file_io::{read_json, stage_bytes, write_json_atomic, StagedFile};
use super::repository::RecordRepository;

/// Serializable file layout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "R: Record")]
struct RecordFile<R> {
    records: Vec<R>,
}

impl<R> Default for RecordFile<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

/// Repository for record persistence
pub struct JsonRepository<R> {
    path: PathBuf,
    data: RwLock<BTreeMap<RecordId, R>>,
}

impl<R: Record> JsonRepository<R> {
    /// Create a new repository backed by `path`
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(BTreeMap::new()),
        }
    }

    /// Load records from disk
    pub fn load(&self) -> BackupResult<()> {
        let file_data: RecordFile<R> = read_json(&self.path)?;

        let mut data = self.data.write().map_err(|e| {
            BackupError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        data.clear();
        for record in file_data.records {
            data.insert(record.id().clone(), record);
        }

        Ok(())
    }

    /// Save records to disk
    pub fn save(&self) -> BackupResult<()> {
        let data = self.data.read().map_err(|e| {
            BackupError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let file_data = RecordFile {
            records: data.values().cloned().collect(),
        };

        write_json_atomic(&self.path, &file_data)
    }

    /// Write the records to a temp file next to the data file without
    /// replacing it
    pub fn stage(&self) -> BackupResult<StagedFile> {
        let data = self.data.read().map_err(|e| {
            BackupError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let file_data = RecordFile {
            records: data.values().cloned().collect(),
        };
        let bytes = serde_json::to_vec_pretty(&file_data)
            .map_err(|e| BackupError::Storage(format!("Failed to serialize data: {}", e)))?;

        stage_bytes(&self.path, &bytes).map_err(|e| {
            BackupError::Storage(format!("Failed to write {}: {}", self.path.display(), e))
        })
    }

    /// Copy of the records currently held in memory
    pub fn snapshot(&self) -> BackupResult<BTreeMap<RecordId, R>> {
        let data = self.data.read().map_err(|e| {
            BackupError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.clone())
    }

    /// Replace the in-memory records with an earlier snapshot
    pub fn restore(&self, snapshot: BTreeMap<RecordId, R>) -> BackupResult<()> {
        let mut data = self.data.write().map_err(|e| {
            BackupError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        *data = snapshot;
        Ok(())
    }

    /// Get a record by ID
    pub fn get(&self, id: &RecordId) -> BackupResult<Option<R>> {
        let data = self.data.read().map_err(|e| {
            BackupError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.get(id).cloned())
    }

    /// Count records
    pub fn count(&self) -> BackupResult<usize> {
        let data = self.data.read().map_err(|e| {
            BackupError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.len())
    }
}

#[async_trait]
impl<R: Record> RecordRepository<R> for JsonRepository<R> {
    async fn list_all(&self) -> BackupResult<Vec<R>> {
        let data = self.data.read().map_err(|e| {
            BackupError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.values().cloned().collect())
    }

    async fn upsert(&self, record: R) -> BackupResult<RecordId> {
        let mut data = self.data.write().map_err(|e| {
            BackupError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        let id = record.id().clone();
        data.insert(id.clone(), record);
        Ok(id)
    }

    /// Re-read the data file, dropping unsaved changes
    async fn refresh(&self) -> BackupResult<()> {
        self.load()
    }
}
