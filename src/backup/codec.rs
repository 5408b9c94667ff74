//! Textual encoding of backup documents
//!
//! Documents are UTF-8 JSON objects with the keys `formatVersion`, `notes`,
//! `noteFolders`, `tasks`, `diary` and `bookmarks`. Every category key is
//! always written, empty or not. Decoding is strict about the known keys
//! and ignores anything else at the top level.

use serde_json::{Map, Value};

use crate::error::{BackupError, BackupResult};
use crate::models::ids::normalize_fields;
use crate::models::Record;

use super::document::{BackupDocument, CURRENT_FORMAT_VERSION};

const DOCUMENT: &str = "BackupDocument";

const KEY_FORMAT_VERSION: &str = "formatVersion";
const KEY_NOTES: &str = "notes";
const KEY_NOTE_FOLDERS: &str = "noteFolders";
const KEY_TASKS: &str = "tasks";
const KEY_DIARY: &str = "diary";
const KEY_BOOKMARKS: &str = "bookmarks";

/// Encode a document as pretty-printed JSON
pub fn encode(document: &BackupDocument) -> BackupResult<Vec<u8>> {
    serde_json::to_vec_pretty(document)
        .map_err(|e| BackupError::schema(DOCUMENT, format!("Failed to serialize: {}", e)))
}

/// Decode a document, normalizing every identifier on the way
pub fn decode(bytes: &[u8]) -> BackupResult<BackupDocument> {
    let root: Value = serde_json::from_slice(bytes)
        .map_err(|e| BackupError::schema(DOCUMENT, format!("not valid JSON: {}", e)))?;

    let Value::Object(mut root) = root else {
        return Err(BackupError::schema(DOCUMENT, "top level must be a JSON object"));
    };

    let format_version = decode_format_version(&root)?;

    Ok(BackupDocument {
        format_version,
        notes: decode_records(&mut root, KEY_NOTES)?,
        note_folders: decode_records(&mut root, KEY_NOTE_FOLDERS)?,
        tasks: decode_records(&mut root, KEY_TASKS)?,
        diary_entries: decode_records(&mut root, KEY_DIARY)?,
        bookmarks: decode_records(&mut root, KEY_BOOKMARKS)?,
    })
}

fn decode_format_version(root: &Map<String, Value>) -> BackupResult<u32> {
    let raw = root
        .get(KEY_FORMAT_VERSION)
        .ok_or_else(|| BackupError::schema(DOCUMENT, format!("missing field `{}`", KEY_FORMAT_VERSION)))?;

    let version = raw
        .as_u64()
        .and_then(|v| u32::try_from(v).ok())
        .filter(|v| *v >= 1)
        .ok_or_else(|| {
            BackupError::schema(
                DOCUMENT,
                format!("`{}` must be a positive integer, found {}", KEY_FORMAT_VERSION, raw),
            )
        })?;

    if version > CURRENT_FORMAT_VERSION {
        return Err(BackupError::schema(
            DOCUMENT,
            format!(
                "format version {} is newer than the supported version {}",
                version, CURRENT_FORMAT_VERSION
            ),
        ));
    }

    Ok(version)
}

fn decode_records<R: Record>(root: &mut Map<String, Value>, key: &'static str) -> BackupResult<Vec<R>> {
    let value = root
        .remove(key)
        .ok_or_else(|| BackupError::schema(DOCUMENT, format!("missing field `{}`", key)))?;

    let Value::Array(items) = value else {
        return Err(BackupError::schema(DOCUMENT, format!("`{}` must be an array", key)));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, mut item)| {
            if !item.is_object() {
                return Err(BackupError::schema(
                    R::KIND,
                    format!("entry {} is not an object", index),
                ));
            }

            normalize_fields(&mut item, R::KIND, R::ID_FIELDS)?;

            serde_json::from_value(item)
                .map_err(|e| BackupError::schema(R::KIND, format!("entry {}: {}", index, e)))
        })
        .collect()
}
