//! Storage layer for MyBrain backups
//!
//! Defines the contracts the backup engines consume (domain repositories
//! and backup destinations) and ships JSON-file implementations of both,
//! with atomic writes and automatic directory creation. [`Storage::save_all`]
//! commits every domain file together or leaves all of them as they were.

pub mod destination;
pub mod file_io;
pub mod records;
pub mod repository;

pub use destination::{BackupStorage, FileSystemStorage};
pub use file_io::{commit_all, read_json, stage_bytes, write_bytes_atomic, write_json_atomic, StagedFile};
pub use records::JsonRepository;
pub use repository::{InMemoryRepository, RecordRepository, Repositories};

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::paths::MyBrainPaths;
use crate::error::{BackupError, BackupResult};
use crate::models::{Bookmark, DiaryEntry, Note, NoteFolder, RecordId, Task};

/// In-memory copy of every domain, taken with [`Storage::snapshot`]
pub struct StorageSnapshot {
    notes: BTreeMap<RecordId, Note>,
    folders: BTreeMap<RecordId, NoteFolder>,
    tasks: BTreeMap<RecordId, Task>,
    diary: BTreeMap<RecordId, DiaryEntry>,
    bookmarks: BTreeMap<RecordId, Bookmark>,
}

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: MyBrainPaths,
    pub notes: Arc<JsonRepository<Note>>,
    pub folders: Arc<JsonRepository<NoteFolder>>,
    pub tasks: Arc<JsonRepository<Task>>,
    pub diary: Arc<JsonRepository<DiaryEntry>>,
    pub bookmarks: Arc<JsonRepository<Bookmark>>,
    repositories: Repositories,
}

impl Storage {
    /// Create a new Storage instance
    pub fn new(paths: MyBrainPaths) -> BackupResult<Self> {
        paths.ensure_directories()?;

        let notes = Arc::new(JsonRepository::new(paths.notes_file()));
        let folders = Arc::new(JsonRepository::new(paths.folders_file()));
        let tasks = Arc::new(JsonRepository::new(paths.tasks_file()));
        let diary = Arc::new(JsonRepository::new(paths.diary_file()));
        let bookmarks = Arc::new(JsonRepository::new(paths.bookmarks_file()));

        let repositories = Repositories::new(
            notes.clone(),
            folders.clone(),
            tasks.clone(),
            diary.clone(),
            bookmarks.clone(),
        );

        Ok(Self {
            paths,
            notes,
            folders,
            tasks,
            diary,
            bookmarks,
            repositories,
        })
    }

    /// Get the paths configuration
    pub fn paths(&self) -> &MyBrainPaths {
        &self.paths
    }

    /// Load all data from disk
    pub fn load_all(&self) -> BackupResult<()> {
        self.notes.load()?;
        self.folders.load()?;
        self.tasks.load()?;
        self.diary.load()?;
        self.bookmarks.load()?;
        Ok(())
    }

    /// Save all data to disk.
    ///
    /// Every domain file is staged before any is replaced; on failure none
    /// of them changes.
    pub fn save_all(&self) -> BackupResult<()> {
        let staged = vec![
            self.folders.stage()?,
            self.notes.stage()?,
            self.tasks.stage()?,
            self.diary.stage()?,
            self.bookmarks.stage()?,
        ];

        commit_all(staged)
            .map_err(|e| BackupError::Storage(format!("Failed to save data: {}", e)))
    }

    /// Copy the in-memory state of every domain
    pub fn snapshot(&self) -> BackupResult<StorageSnapshot> {
        Ok(StorageSnapshot {
            notes: self.notes.snapshot()?,
            folders: self.folders.snapshot()?,
            tasks: self.tasks.snapshot()?,
            diary: self.diary.snapshot()?,
            bookmarks: self.bookmarks.snapshot()?,
        })
    }

    /// Put every domain back to a snapshot
    pub fn restore(&self, snapshot: StorageSnapshot) -> BackupResult<()> {
        self.notes.restore(snapshot.notes)?;
        self.folders.restore(snapshot.folders)?;
        self.tasks.restore(snapshot.tasks)?;
        self.diary.restore(snapshot.diary)?;
        self.bookmarks.restore(snapshot.bookmarks)?;
        Ok(())
    }

    /// The repositories as the backup engines see them
    pub fn repositories(&self) -> Repositories {
        self.repositories.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_storage_creation() {
        let temp_dir = TempDir::new().unwrap();
        let paths = MyBrainPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();

        assert!(temp_dir.path().join("data").exists());
        assert!(temp_dir.path().join("backups").exists());
        assert_eq!(storage.notes.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_repositories_share_state() {
        let temp_dir = TempDir::new().unwrap();
        let paths = MyBrainPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();

        let repos = storage.repositories();
        repos.tasks.upsert(Task::new("shared")).await.unwrap();

        assert_eq!(storage.tasks.count().unwrap(), 1);
        storage.save_all().unwrap();
        assert!(storage.paths().tasks_file().exists());
    }

    #[tokio::test]
    async fn test_failed_save_changes_no_file() {
        let temp_dir = TempDir::new().unwrap();
        let paths = MyBrainPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        // tasks.json cannot be replaced
        std::fs::create_dir_all(storage.paths().tasks_file().join("locked")).unwrap();

        let before = storage.snapshot().unwrap();
        storage.notes.upsert(Note::new("imported", "")).await.unwrap();
        storage.tasks.upsert(Task::new("imported")).await.unwrap();

        assert!(storage.save_all().is_err());
        assert!(!storage.paths().notes_file().exists());
        assert!(!storage.paths().folders_file().exists());

        storage.restore(before).unwrap();
        assert_eq!(storage.notes.count().unwrap(), 0);
        assert_eq!(storage.tasks.count().unwrap(), 0);
    }
}
