//! Bookmark model

use serde::{Deserialize, Serialize};

use super::ids::RecordId;
use super::{now_millis, Record};

/// A saved link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    /// Unique identifier
    pub id: RecordId,

    pub url: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub created_date: i64,

    #[serde(default)]
    pub updated_date: i64,
}

impl Bookmark {
    /// Create a new bookmark
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        let now = now_millis();
        Self {
            id: RecordId::generate(),
            url: url.into(),
            title: title.into(),
            description: String::new(),
            created_date: now,
            updated_date: now,
        }
    }
}

impl Record for Bookmark {
    const KIND: &'static str = "Bookmark";

    fn id(&self) -> &RecordId {
        &self.id
    }
}
