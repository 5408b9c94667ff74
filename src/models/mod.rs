//! Core data models for MyBrain backups
//!
//! This module contains the record types of every domain that takes part in
//! a backup (notes, folders, tasks, diary, bookmarks) and the canonical
//! identifier they share.

pub mod bookmark;
pub mod diary;
pub mod ids;
pub mod note;
pub mod task;

pub use bookmark::Bookmark;
pub use diary::{DiaryEntry, Mood};
pub use ids::{normalize, RecordId};
pub use note::{Note, NoteFolder};
pub use task::{Priority, Task, TaskFrequency};

use serde::{de::DeserializeOwned, Serialize};

/// Behaviour shared by every record that can be backed up
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Record type name used in error messages
    const KIND: &'static str;

    /// Wire names of every identifier field, normalized before decoding
    const ID_FIELDS: &'static [&'static str] = &["id"];

    /// The record's canonical identifier
    fn id(&self) -> &RecordId;
}

/// Current time as epoch milliseconds
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
