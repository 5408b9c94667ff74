//! Import engine
//!
//! Reads a backup, opens it if it is sealed, decodes and validates the whole
//! document, and only then upserts its records. A failure at any step before
//! the apply phase leaves the repositories exactly as they were.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::crypto::{self, Password};
use crate::error::{BackupError, BackupResult};
use crate::models::{Record, RecordId};
use crate::storage::{BackupStorage, RecordRepository, Repositories};

use super::codec;
use super::document::BackupDocument;

/// Inserted/updated counts for one category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportTally {
    pub inserted: usize,
    pub updated: usize,
}

impl ImportTally {
    pub fn total(&self) -> usize {
        self.inserted + self.updated
    }
}

/// Result of an import or a dry run
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    /// Where the backup was read from
    pub source: String,
    /// Format version the document was written with
    pub format_version: u32,
    pub notes: ImportTally,
    pub note_folders: ImportTally,
    pub tasks: ImportTally,
    pub diary: ImportTally,
    pub bookmarks: ImportTally,
    /// Nothing was written
    pub dry_run: bool,
}

impl ImportReport {
    /// Records inserted or updated across all categories
    pub fn total(&self) -> usize {
        self.tallies().iter().map(|(_, t)| t.total()).sum()
    }

    /// Get a summary of what was imported
    pub fn summary(&self) -> String {
        let parts: Vec<String> = self
            .tallies()
            .iter()
            .filter(|(_, tally)| tally.total() > 0)
            .map(|(name, tally)| {
                format!("{} {} ({} new, {} updated)", tally.total(), name, tally.inserted, tally.updated)
            })
            .collect();

        let verb = if self.dry_run { "Would import" } else { "Imported" };
        if parts.is_empty() {
            format!("{}: nothing", verb)
        } else {
            format!("{}: {}", verb, parts.join(", "))
        }
    }

    fn tallies(&self) -> [(&'static str, ImportTally); 5] {
        [
            ("notes", self.notes),
            ("folders", self.note_folders),
            ("tasks", self.tasks),
            ("diary entries", self.diary),
            ("bookmarks", self.bookmarks),
        ]
    }
}

/// A backup read into memory, not yet opened or decoded
#[derive(Debug, Clone)]
pub struct LoadedBackup {
    source: String,
    bytes: Vec<u8>,
}

impl LoadedBackup {
    pub fn new(source: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            source: source.into(),
            bytes,
        }
    }

    /// Where the bytes came from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether a password is needed to open it
    pub fn is_sealed(&self) -> bool {
        crypto::is_sealed(&self.bytes)
    }
}

/// Restores backups into the domain repositories
pub struct ImportEngine {
    repos: Repositories,
    storage: Arc<dyn BackupStorage>,
}

impl ImportEngine {
    /// Create a new ImportEngine
    pub fn new(repos: Repositories, storage: Arc<dyn BackupStorage>) -> Self {
        Self { repos, storage }
    }

    /// Read the backup at `source` without opening it
    pub async fn read(&self, source: &str) -> BackupResult<LoadedBackup> {
        if source.trim().is_empty() {
            return Err(BackupError::Precondition(
                "Backup source must not be blank".to_string(),
            ));
        }

        let bytes = self.storage.read(source).await?;
        Ok(LoadedBackup::new(source, bytes))
    }

    /// Import the backup at `source`.
    ///
    /// Every record is upserted by id: existing records are overwritten and
    /// records absent from the backup are left alone.
    pub async fn import(
        &self,
        source: &str,
        password: Option<&Password>,
    ) -> BackupResult<ImportReport> {
        let backup = self.read(source).await?;
        self.import_loaded(backup, password).await
    }

    /// Import a backup that was already read
    pub async fn import_loaded(
        &self,
        backup: LoadedBackup,
        password: Option<&Password>,
    ) -> BackupResult<ImportReport> {
        let _exclusive = self.repos.gate().try_exclusive()?;

        let source = backup.source.clone();
        let document = self.open(backup, password).await?;
        let report = self.plan(&source, &document, false).await?;
        self.apply(document).await?;

        info!(
            source = %source,
            records = report.total(),
            format_version = report.format_version,
            "Backup imported"
        );
        Ok(report)
    }

    /// Decode and validate the backup at `source` and report what an
    /// import would do, without writing anything
    pub async fn inspect(
        &self,
        source: &str,
        password: Option<&Password>,
    ) -> BackupResult<ImportReport> {
        let backup = self.read(source).await?;
        self.inspect_loaded(backup, password).await
    }

    /// Dry run of [`ImportEngine::import_loaded`]
    pub async fn inspect_loaded(
        &self,
        backup: LoadedBackup,
        password: Option<&Password>,
    ) -> BackupResult<ImportReport> {
        let _shared = self.repos.gate().try_shared()?;

        let source = backup.source.clone();
        let document = self.open(backup, password).await?;
        self.plan(&source, &document, true).await
    }

    async fn open(
        &self,
        backup: LoadedBackup,
        password: Option<&Password>,
    ) -> BackupResult<BackupDocument> {
        let LoadedBackup { source, mut bytes } = backup;

        if crypto::is_sealed(&bytes) {
            let password = match password {
                Some(password) if !password.is_empty() => password.clone(),
                _ => {
                    return Err(BackupError::Precondition(
                        "This backup is encrypted; a password is required".to_string(),
                    ))
                }
            };
            bytes = tokio::task::spawn_blocking(move || crypto::open(&bytes, &password)).await??;
        }

        let document = codec::decode(&bytes)?;
        debug!(source = %source, counts = ?document.counts(), "Decoded backup document");
        Ok(document)
    }

    async fn plan(
        &self,
        source: &str,
        document: &BackupDocument,
        dry_run: bool,
    ) -> BackupResult<ImportReport> {
        let persisted_folders = existing_ids(self.repos.folders.as_ref()).await?;
        document.validate(&persisted_folders)?;

        Ok(ImportReport {
            source: source.to_string(),
            format_version: document.format_version,
            notes: tally(self.repos.notes.as_ref(), &document.notes).await?,
            note_folders: tally_against(&persisted_folders, &document.note_folders),
            tasks: tally(self.repos.tasks.as_ref(), &document.tasks).await?,
            diary: tally(self.repos.diary.as_ref(), &document.diary_entries).await?,
            bookmarks: tally(self.repos.bookmarks.as_ref(), &document.bookmarks).await?,
            dry_run,
        })
    }

    async fn apply(&self, document: BackupDocument) -> BackupResult<()> {
        // Folders first so notes never point at a folder that is not there yet
        upsert_all(self.repos.folders.as_ref(), document.note_folders).await?;
        upsert_all(self.repos.notes.as_ref(), document.notes).await?;
        upsert_all(self.repos.tasks.as_ref(), document.tasks).await?;
        upsert_all(self.repos.diary.as_ref(), document.diary_entries).await?;
        upsert_all(self.repos.bookmarks.as_ref(), document.bookmarks).await?;
        Ok(())
    }
}

async fn existing_ids<R: Record>(repo: &dyn RecordRepository<R>) -> BackupResult<HashSet<RecordId>> {
    Ok(repo
        .list_all()
        .await?
        .into_iter()
        .map(|record| record.id().clone())
        .collect())
}

async fn tally<R: Record>(repo: &dyn RecordRepository<R>, incoming: &[R]) -> BackupResult<ImportTally> {
    if incoming.is_empty() {
        return Ok(ImportTally::default());
    }
    Ok(tally_against(&existing_ids(repo).await?, incoming))
}

fn tally_against<R: Record>(existing: &HashSet<RecordId>, incoming: &[R]) -> ImportTally {
    let updated = incoming.iter().filter(|r| existing.contains(r.id())).count();
    ImportTally {
        inserted: incoming.len() - updated,
        updated,
    }
}

async fn upsert_all<R: Record>(repo: &dyn RecordRepository<R>, records: Vec<R>) -> BackupResult<()> {
    for record in records {
        repo.upsert(record).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::document::CategorySelection;
    use crate::backup::export::{ExportEngine, ExportOptions};
    use crate::error::ErrorKind;
    use crate::models::{Bookmark, DiaryEntry, Note, NoteFolder, Task};
    use crate::storage::{FileSystemStorage, InMemoryRepository};
    use serde_json::json;
    use tempfile::TempDir;

    fn storage() -> Arc<dyn BackupStorage> {
        Arc::new(FileSystemStorage::new())
    }

    fn location(temp: &TempDir, name: &str) -> String {
        temp.path().join(name).to_string_lossy().to_string()
    }

    fn write_json(temp: &TempDir, name: &str, value: serde_json::Value) -> String {
        let path = location(temp, name);
        std::fs::write(&path, value.to_string()).unwrap();
        path
    }

    fn note(id: &str, title: &str) -> Note {
        let mut note = Note::new(title, "");
        note.id = RecordId::from(id);
        note
    }

    async fn snapshot(repos: &Repositories) -> (Vec<Note>, Vec<NoteFolder>, Vec<Task>) {
        (
            repos.notes.list_all().await.unwrap(),
            repos.folders.list_all().await.unwrap(),
            repos.tasks.list_all().await.unwrap(),
        )
    }

    #[tokio::test]
    async fn test_export_then_import_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let source = Repositories::new(
            Arc::new(InMemoryRepository::with_records(vec![note("a", "A"), note("b", "B")])),
            Arc::new(InMemoryRepository::<NoteFolder>::new()),
            Arc::new(InMemoryRepository::with_records(vec![Task::new("t")])),
            Arc::new(InMemoryRepository::<DiaryEntry>::new()),
            Arc::new(InMemoryRepository::<Bookmark>::new()),
        );
        let dest = location(&temp, "backup.json");
        ExportEngine::new(source.clone(), storage())
            .export(&dest, &ExportOptions::default())
            .await
            .unwrap();

        let target = Repositories::in_memory();
        let engine = ImportEngine::new(target.clone(), storage());

        let first = engine.import(&dest, None).await.unwrap();
        assert_eq!(first.notes.inserted, 2);
        let after_first = snapshot(&target).await;

        let second = engine.import(&dest, None).await.unwrap();
        assert_eq!(second.notes.inserted, 0);
        assert_eq!(second.notes.updated, 2);
        assert_eq!(snapshot(&target).await, after_first);
    }

    #[tokio::test]
    async fn test_selective_backup_leaves_other_categories_untouched() {
        let temp = TempDir::new().unwrap();
        let source = Repositories::new(
            Arc::new(InMemoryRepository::with_records(vec![note("a", "A")])),
            Arc::new(InMemoryRepository::<NoteFolder>::new()),
            Arc::new(InMemoryRepository::with_records(vec![Task::new("from backup")])),
            Arc::new(InMemoryRepository::<DiaryEntry>::new()),
            Arc::new(InMemoryRepository::<Bookmark>::new()),
        );
        let include = CategorySelection {
            tasks: false,
            ..CategorySelection::all()
        };
        let dest = location(&temp, "notes-only.json");
        ExportEngine::new(source, storage())
            .export(&dest, &ExportOptions::plain(include))
            .await
            .unwrap();

        let local_task = Task::new("local only");
        let target = Repositories::new(
            Arc::new(InMemoryRepository::<Note>::new()),
            Arc::new(InMemoryRepository::<NoteFolder>::new()),
            Arc::new(InMemoryRepository::with_records(vec![local_task.clone()])),
            Arc::new(InMemoryRepository::<DiaryEntry>::new()),
            Arc::new(InMemoryRepository::<Bookmark>::new()),
        );

        ImportEngine::new(target.clone(), storage())
            .import(&dest, None)
            .await
            .unwrap();

        assert_eq!(target.notes.list_all().await.unwrap().len(), 1);
        assert_eq!(target.tasks.list_all().await.unwrap(), vec![local_task]);
    }

    #[tokio::test]
    async fn test_legacy_integer_id_overwrites_existing() {
        let temp = TempDir::new().unwrap();
        let target = Repositories::new(
            Arc::new(InMemoryRepository::with_records(vec![note("42", "stale")])),
            Arc::new(InMemoryRepository::<NoteFolder>::new()),
            Arc::new(InMemoryRepository::<Task>::new()),
            Arc::new(InMemoryRepository::<DiaryEntry>::new()),
            Arc::new(InMemoryRepository::<Bookmark>::new()),
        );
        let path = write_json(
            &temp,
            "v1.json",
            json!({
                "formatVersion": 1,
                "notes": [{"id": 42, "title": "fresh", "content": "", "createdDate": 1,
                           "updatedDate": 2, "pinned": false}],
                "noteFolders": [], "tasks": [], "diary": [], "bookmarks": []
            }),
        );

        let report = ImportEngine::new(target.clone(), storage())
            .import(&path, None)
            .await
            .unwrap();

        assert_eq!(report.format_version, 1);
        assert_eq!(report.notes, ImportTally { inserted: 0, updated: 1 });
        let notes = target.notes.list_all().await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id.as_str(), "42");
        assert_eq!(notes[0].title, "fresh");
    }

    #[tokio::test]
    async fn test_malformed_document_changes_nothing() {
        let temp = TempDir::new().unwrap();
        let target = Repositories::new(
            Arc::new(InMemoryRepository::with_records(vec![note("keep", "me")])),
            Arc::new(InMemoryRepository::<NoteFolder>::new()),
            Arc::new(InMemoryRepository::<Task>::new()),
            Arc::new(InMemoryRepository::<DiaryEntry>::new()),
            Arc::new(InMemoryRepository::<Bookmark>::new()),
        );
        let before = snapshot(&target).await;

        // The first note is fine, the second one breaks the document
        let path = write_json(
            &temp,
            "broken.json",
            json!({
                "formatVersion": 2,
                "notes": [
                    {"id": "new", "title": "n", "content": "", "createdDate": 1,
                     "updatedDate": 1, "pinned": false},
                    {"id": {"nested": 1}, "title": "bad", "content": "", "createdDate": 1,
                     "updatedDate": 1, "pinned": false}
                ],
                "noteFolders": [], "tasks": [], "diary": [], "bookmarks": []
            }),
        );

        let err = ImportEngine::new(target.clone(), storage())
            .import(&path, None)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MalformedIdentifier);
        assert_eq!(snapshot(&target).await, before);
    }

    #[tokio::test]
    async fn test_dangling_folder_reference_changes_nothing() {
        let temp = TempDir::new().unwrap();
        let target = Repositories::in_memory();
        let path = write_json(
            &temp,
            "dangling.json",
            json!({
                "formatVersion": 2,
                "notes": [{"id": "n", "title": "n", "content": "", "createdDate": 1,
                           "updatedDate": 1, "pinned": false, "folderId": "ghost"}],
                "noteFolders": [], "tasks": [{"id": "t", "title": "t", "completed": false}],
                "diary": [], "bookmarks": []
            }),
        );

        let err = ImportEngine::new(target.clone(), storage())
            .import(&path, None)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(target.notes.list_all().await.unwrap().is_empty());
        assert!(target.tasks.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_folder_already_persisted_is_accepted() {
        let temp = TempDir::new().unwrap();
        let mut folder = NoteFolder::new("Existing");
        folder.id = RecordId::from("f");
        let target = Repositories::new(
            Arc::new(InMemoryRepository::<Note>::new()),
            Arc::new(InMemoryRepository::with_records(vec![folder])),
            Arc::new(InMemoryRepository::<Task>::new()),
            Arc::new(InMemoryRepository::<DiaryEntry>::new()),
            Arc::new(InMemoryRepository::<Bookmark>::new()),
        );
        let path = write_json(
            &temp,
            "ok.json",
            json!({
                "formatVersion": 2,
                "notes": [{"id": "n", "title": "n", "content": "", "createdDate": 1,
                           "updatedDate": 1, "pinned": false, "folderId": "f"}],
                "noteFolders": [], "tasks": [], "diary": [], "bookmarks": []
            }),
        );

        let report = ImportEngine::new(target.clone(), storage())
            .import(&path, None)
            .await
            .unwrap();
        assert_eq!(report.notes.inserted, 1);
    }

    #[tokio::test]
    async fn test_sealed_backup_passwords() {
        let temp = TempDir::new().unwrap();
        let source = Repositories::new(
            Arc::new(InMemoryRepository::with_records(vec![note("a", "secret")])),
            Arc::new(InMemoryRepository::<NoteFolder>::new()),
            Arc::new(InMemoryRepository::<Task>::new()),
            Arc::new(InMemoryRepository::<DiaryEntry>::new()),
            Arc::new(InMemoryRepository::<Bookmark>::new()),
        );
        let dest = location(&temp, "sealed.mbbk");
        ExportEngine::new(source, storage())
            .export(
                &dest,
                &ExportOptions::encrypted(CategorySelection::all(), Password::from("right")),
            )
            .await
            .unwrap();

        let target = Repositories::in_memory();
        let engine = ImportEngine::new(target.clone(), storage());

        let missing = engine.import(&dest, None).await.unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::Precondition);

        let wrong = engine
            .import(&dest, Some(&Password::from("wrong")))
            .await
            .unwrap_err();
        assert_eq!(wrong.kind(), ErrorKind::AuthFailure);
        assert!(target.notes.list_all().await.unwrap().is_empty());

        engine
            .import(&dest, Some(&Password::from("right")))
            .await
            .unwrap();
        assert_eq!(target.notes.list_all().await.unwrap()[0].title, "secret");
    }

    #[tokio::test]
    async fn test_inspect_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let target = Repositories::in_memory();
        let path = write_json(
            &temp,
            "peek.json",
            json!({
                "formatVersion": 2, "notes": [], "noteFolders": [],
                "tasks": [{"id": "t", "title": "t", "completed": true}],
                "diary": [], "bookmarks": []
            }),
        );

        let report = ImportEngine::new(target.clone(), storage())
            .inspect(&path, None)
            .await
            .unwrap();

        assert!(report.dry_run);
        assert_eq!(report.tasks.inserted, 1);
        assert!(report.summary().starts_with("Would import"));
        assert!(target.tasks.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_source_is_io() {
        let temp = TempDir::new().unwrap();
        let err = ImportEngine::new(Repositories::in_memory(), storage())
            .import(&location(&temp, "nope.json"), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[tokio::test]
    async fn test_import_rejected_while_export_holds_gate() {
        let temp = TempDir::new().unwrap();
        let repos = Repositories::in_memory();
        let path = write_json(
            &temp,
            "any.json",
            json!({
                "formatVersion": 2, "notes": [], "noteFolders": [],
                "tasks": [], "diary": [], "bookmarks": []
            }),
        );
        let _export = repos.gate().try_shared().unwrap();

        let err = ImportEngine::new(repos.clone(), storage())
            .import(&path, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Busy);
    }

    #[tokio::test]
    async fn test_read_once_then_import_loaded() {
        let temp = TempDir::new().unwrap();
        let source = Repositories::in_memory();
        source.notes.upsert(note("n1", "sealed")).await.unwrap();
        let dest = location(&temp, "b.mbbk");
        ExportEngine::new(source, storage())
            .export(
                &dest,
                &ExportOptions::encrypted(CategorySelection::all(), Password::from("pw")),
            )
            .await
            .unwrap();

        let target = Repositories::in_memory();
        let engine = ImportEngine::new(target.clone(), storage());
        let backup = engine.read(&dest).await.unwrap();
        assert!(backup.is_sealed());
        assert_eq!(backup.source(), dest);

        let report = engine
            .import_loaded(backup, Some(&Password::from("pw")))
            .await
            .unwrap();
        assert_eq!(report.source, dest);
        assert_eq!(report.notes.inserted, 1);
    }

    #[test]
    fn test_report_summary() {
        let report = ImportReport {
            notes: ImportTally { inserted: 2, updated: 1 },
            ..Default::default()
        };
        assert_eq!(report.total(), 3);
        assert_eq!(report.summary(), "Imported: 3 notes (2 new, 1 updated)");
        assert_eq!(ImportReport::default().summary(), "Imported: nothing");
    }
}
