//! Diary entry model

use serde::{Deserialize, Serialize};

use super::ids::RecordId;
use super::{now_millis, Record};

/// How the day felt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Awesome,
    Good,
    #[default]
    Okay,
    Bad,
    Terrible,
}

/// A single diary entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiaryEntry {
    /// Unique identifier
    pub id: RecordId,

    pub title: String,

    pub content: String,

    pub created_date: i64,

    #[serde(default)]
    pub updated_date: i64,

    #[serde(default)]
    pub mood: Mood,
}

impl DiaryEntry {
    /// Create a new entry for today
    pub fn new(title: impl Into<String>, content: impl Into<String>, mood: Mood) -> Self {
        let now = now_millis();
        Self {
            id: RecordId::generate(),
            title: title.into(),
            content: content.into(),
            created_date: now,
            updated_date: now,
            mood,
        }
    }
}

impl Record for DiaryEntry {
    const KIND: &'static str = "DiaryEntry";

    fn id(&self) -> &RecordId {
        &self.id
    }
}
