//! Note and note folder models

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::RecordId;
use super::{now_millis, Record};

/// A free-form note, optionally filed in a folder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Unique identifier
    pub id: RecordId,

    pub title: String,

    pub content: String,

    /// Creation time (epoch milliseconds)
    pub created_date: i64,

    /// Last modification time (epoch milliseconds)
    pub updated_date: i64,

    /// Pinned notes sort first in the note list
    pub pinned: bool,

    /// Folder this note lives in, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<RecordId>,
}

impl Note {
    /// Create a new unfiled note
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = now_millis();
        Self {
            id: RecordId::generate(),
            title: title.into(),
            content: content.into(),
            created_date: now,
            updated_date: now,
            pinned: false,
            folder_id: None,
        }
    }

    /// Builder-style helper to file the note in a folder
    pub fn in_folder(mut self, folder_id: RecordId) -> Self {
        self.folder_id = Some(folder_id);
        self
    }
}

impl Record for Note {
    const KIND: &'static str = "Note";
    const ID_FIELDS: &'static [&'static str] = &["id", "folderId"];

    fn id(&self) -> &RecordId {
        &self.id
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

/// A named folder that groups notes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteFolder {
    /// Unique identifier
    pub id: RecordId,

    /// Folder name
    pub name: String,
}

impl NoteFolder {
    /// Create a new folder
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: RecordId::generate(),
            name: name.into(),
        }
    }
}

impl Record for NoteFolder {
    const KIND: &'static str = "NoteFolder";

    fn id(&self) -> &RecordId {
        &self.id
    }
}
