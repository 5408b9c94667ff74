//! Domain repository contract
//!
//! The backup engines only ever read everything a domain holds and upsert
//! records back by id. They never delete.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::backup::lock::{DestinationLocks, RepositoryGate};
use crate::error::{BackupError, BackupResult};
use crate::models::{Bookmark, DiaryEntry, Note, NoteFolder, Record, RecordId, Task};

/// Read/write contract a domain store exposes to the backup subsystem
#[async_trait]
pub trait RecordRepository<R: Record>: Send + Sync {
    /// Every record currently held
    async fn list_all(&self) -> BackupResult<Vec<R>>;

    /// Insert the record, or overwrite the one with the same id
    async fn upsert(&self, record: R) -> BackupResult<RecordId>;

    /// Pick up changes persisted by other writers. Stores with nothing
    /// behind them have nothing to do.
    async fn refresh(&self) -> BackupResult<()> {
        Ok(())
    }
}

/// One repository per domain taking part in a backup.
///
/// Clones share the same gate and destination locks, so every engine built
/// from clones of one `Repositories` value excludes the others correctly.
#[derive(Clone)]
pub struct Repositories {
    pub notes: Arc<dyn RecordRepository<Note>>,
    pub folders: Arc<dyn RecordRepository<NoteFolder>>,
    pub tasks: Arc<dyn RecordRepository<Task>>,
    pub diary: Arc<dyn RecordRepository<DiaryEntry>>,
    pub bookmarks: Arc<dyn RecordRepository<Bookmark>>,
    gate: RepositoryGate,
    destinations: DestinationLocks,
}

impl Repositories {
    pub fn new(
        notes: Arc<dyn RecordRepository<Note>>,
        folders: Arc<dyn RecordRepository<NoteFolder>>,
        tasks: Arc<dyn RecordRepository<Task>>,
        diary: Arc<dyn RecordRepository<DiaryEntry>>,
        bookmarks: Arc<dyn RecordRepository<Bookmark>>,
    ) -> Self {
        Self {
            notes,
            folders,
            tasks,
            diary,
            bookmarks,
            gate: RepositoryGate::new(),
            destinations: DestinationLocks::new(),
        }
    }

    /// Fresh, empty in-memory repositories
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryRepository::<Note>::new()),
            Arc::new(InMemoryRepository::<NoteFolder>::new()),
            Arc::new(InMemoryRepository::<Task>::new()),
            Arc::new(InMemoryRepository::<DiaryEntry>::new()),
            Arc::new(InMemoryRepository::<Bookmark>::new()),
        )
    }

    /// Gate guarding this set of repositories
    pub fn gate(&self) -> &RepositoryGate {
        &self.gate
    }

    /// Destinations with an export from these repositories in flight
    pub fn destinations(&self) -> &DestinationLocks {
        &self.destinations
    }

    /// Refresh every domain from its persisted state
    pub async fn refresh(&self) -> BackupResult<()> {
        self.notes.refresh().await?;
        self.folders.refresh().await?;
        self.tasks.refresh().await?;
        self.diary.refresh().await?;
        self.bookmarks.refresh().await?;
        Ok(())
    }
}

/// Repository that keeps records in memory, ordered by id
pub struct InMemoryRepository<R> {
    data: Mutex<BTreeMap<RecordId, R>>,
}

impl<R: Record> InMemoryRepository<R> {
    pub fn new() -> Self {
        Self {
            data: Mutex::new(BTreeMap::new()),
        }
    }

    /// Create a repository pre-filled with records
    pub fn with_records(records: impl IntoIterator<Item = R>) -> Self {
        let data = records
            .into_iter()
            .map(|r| (r.id().clone(), r))
            .collect();
        Self {
            data: Mutex::new(data),
        }
    }

    fn lock(&self) -> BackupResult<std::sync::MutexGuard<'_, BTreeMap<RecordId, R>>> {
        self.data
            .lock()
            .map_err(|e| BackupError::Storage(format!("Failed to acquire lock: {}", e)))
    }
}

impl<R: Record> Default for InMemoryRepository<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: Record> RecordRepository<R> for InMemoryRepository<R> {
    async fn list_all(&self) -> BackupResult<Vec<R>> {
        Ok(self.lock()?.values().cloned().collect())
    }

    async fn upsert(&self, record: R) -> BackupResult<RecordId> {
        let id = record.id().clone();
        self.lock()?.insert(id.clone(), record);
        Ok(id)
    }
}
