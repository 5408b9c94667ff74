//! The backup document
//!
//! A snapshot of every domain taking part in a backup. Built fresh for each
//! export and consumed once by an import.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::{BackupError, BackupResult};
use crate::models::{Bookmark, DiaryEntry, Note, NoteFolder, Record, RecordId, Task};

/// Format version written by this build.
///
/// Version 1 documents stored integer identifiers; version 2 writes strings.
pub const CURRENT_FORMAT_VERSION: u32 = 2;

/// Which categories an export pulls from the repositories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategorySelection {
    /// Notes and their folders
    pub notes: bool,
    pub tasks: bool,
    pub diary: bool,
    pub bookmarks: bool,
}

impl CategorySelection {
    /// Every category
    pub fn all() -> Self {
        Self {
            notes: true,
            tasks: true,
            diary: true,
            bookmarks: true,
        }
    }

    /// No category at all
    pub fn none() -> Self {
        Self {
            notes: false,
            tasks: false,
            diary: false,
            bookmarks: false,
        }
    }
}

impl Default for CategorySelection {
    fn default() -> Self {
        Self::all()
    }
}

/// Full snapshot across all domains
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    /// Governs which migration rules apply on import
    pub format_version: u32,

    pub notes: Vec<Note>,

    pub note_folders: Vec<NoteFolder>,

    pub tasks: Vec<Task>,

    #[serde(rename = "diary")]
    pub diary_entries: Vec<DiaryEntry>,

    pub bookmarks: Vec<Bookmark>,
}

/// Number of records per category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordCounts {
    pub notes: usize,
    pub note_folders: usize,
    pub tasks: usize,
    pub diary: usize,
    pub bookmarks: usize,
}

impl RecordCounts {
    /// Total number of records
    pub fn total(&self) -> usize {
        self.notes + self.note_folders + self.tasks + self.diary + self.bookmarks
    }
}

impl Default for BackupDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl BackupDocument {
    /// An empty document at the current format version
    pub fn new() -> Self {
        Self {
            format_version: CURRENT_FORMAT_VERSION,
            notes: Vec::new(),
            note_folders: Vec::new(),
            tasks: Vec::new(),
            diary_entries: Vec::new(),
            bookmarks: Vec::new(),
        }
    }

    /// Count records per category
    pub fn counts(&self) -> RecordCounts {
        RecordCounts {
            notes: self.notes.len(),
            note_folders: self.note_folders.len(),
            tasks: self.tasks.len(),
            diary: self.diary_entries.len(),
            bookmarks: self.bookmarks.len(),
        }
    }

    /// Check internal consistency before anything is written.
    ///
    /// Ids must be unique within each collection, and every note folder
    /// reference must resolve to a folder in this document or one of
    /// `persisted_folders`.
    pub fn validate(&self, persisted_folders: &HashSet<RecordId>) -> BackupResult<()> {
        ensure_unique_ids(&self.notes)?;
        ensure_unique_ids(&self.note_folders)?;
        ensure_unique_ids(&self.tasks)?;
        ensure_unique_ids(&self.diary_entries)?;
        ensure_unique_ids(&self.bookmarks)?;

        let folder_ids: HashSet<&RecordId> = self.note_folders.iter().map(|f| &f.id).collect();

        for note in &self.notes {
            if let Some(folder_id) = &note.folder_id {
                if !folder_ids.contains(folder_id) && !persisted_folders.contains(folder_id) {
                    return Err(BackupError::Validation(format!(
                        "Note {} references unknown folder {}",
                        note.id, folder_id
                    )));
                }
            }
        }

        Ok(())
    }
}

fn ensure_unique_ids<R: Record>(records: &[R]) -> BackupResult<()> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.id()) {
            return Err(BackupError::Validation(format!(
                "Duplicate {} id {}",
                R::KIND,
                record.id()
            )));
        }
    }
    Ok(())
}
