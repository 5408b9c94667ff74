//! Canonical record identifiers
//!
//! Older backups stored record ids as JSON integers, current ones use opaque
//! strings. Everything that reads an id goes through [`normalize`] so both
//! shapes end up as the same canonical string. New legacy shapes belong
//! here, not in the record types.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

use crate::error::{BackupError, BackupResult};

/// Canonical string identifier shared by every record type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Create a new random ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an existing canonical string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the canonical string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        Self(n.to_string())
    }
}

/// Name of a JSON value's kind, for error messages
fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "non-integer number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Normalize a raw identifier value into its canonical form.
///
/// Strings pass through unchanged; integers become their decimal string.
/// `record` and `field` only feed the error message.
pub fn normalize(raw: &Value, record: &'static str, field: &'static str) -> BackupResult<RecordId> {
    match raw {
        Value::String(s) => Ok(RecordId(s.clone())),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(RecordId(i.to_string()))
            } else if let Some(u) = n.as_u64() {
                Ok(RecordId(u.to_string()))
            } else {
                Err(BackupError::MalformedIdentifier {
                    record,
                    field,
                    found: json_kind(raw),
                })
            }
        }
        other => Err(BackupError::MalformedIdentifier {
            record,
            field,
            found: json_kind(other),
        }),
    }
}

/// Rewrite the named id fields of a JSON record in place.
///
/// Optional fields may be absent or `null`; `id` itself is left for the
/// record decoder to report as missing.
pub fn normalize_fields(
    record_value: &mut Value,
    record: &'static str,
    fields: &[&'static str],
) -> BackupResult<()> {
    let Some(object) = record_value.as_object_mut() else {
        return Ok(());
    };

    for &field in fields {
        let canonical = match object.get(field) {
            None | Some(Value::Null) => continue,
            Some(raw) => normalize(raw, record, field)?,
        };
        object.insert(field.to_string(), Value::String(canonical.0));
    }

    Ok(())
}

// Direct serde use accepts both shapes as well, so records parsed outside
// the codec (repository files) stay compatible with legacy data.
impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RecordIdVisitor;

        impl<'de> Visitor<'de> for RecordIdVisitor {
            type Value = RecordId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string or integer identifier")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<RecordId, E> {
                Ok(RecordId(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<RecordId, E> {
                Ok(RecordId(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<RecordId, E> {
                Ok(RecordId(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<RecordId, E> {
                Ok(RecordId(v.to_string()))
            }
        }

        deserializer.deserialize_any(RecordIdVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_integer_becomes_decimal_string() {
        let id = normalize(&json!(42), "Note", "id").unwrap();
        assert_eq!(id.as_str(), "42");

        let id = normalize(&json!(-7), "Note", "id").unwrap();
        assert_eq!(id.as_str(), "-7");

        let id = normalize(&json!(u64::MAX), "Note", "id").unwrap();
        assert_eq!(id.as_str(), u64::MAX.to_string());
    }

    #[test]
    fn test_string_passes_through() {
        let id = normalize(&json!("a1b2"), "Task", "id").unwrap();
        assert_eq!(id.as_str(), "a1b2");

        // Numeric-looking strings stay as they are
        let id = normalize(&json!("007"), "Task", "id").unwrap();
        assert_eq!(id.as_str(), "007");
    }

    #[test]
    fn test_other_kinds_rejected() {
        for raw in [json!(1.5), json!(true), json!(null), json!([1]), json!({"id": 1})] {
            let err = normalize(&raw, "Bookmark", "id").unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MalformedIdentifier);
        }
    }

    #[test]
    fn test_normalize_fields_skips_absent_optionals() {
        let mut value = json!({"id": 3, "folderId": null, "title": "t"});
        normalize_fields(&mut value, "Note", &["id", "folderId"]).unwrap();
        assert_eq!(value["id"], json!("3"));
        assert_eq!(value["folderId"], Value::Null);

        let mut value = json!({"id": "x", "folderId": 9});
        normalize_fields(&mut value, "Note", &["id", "folderId"]).unwrap();
        assert_eq!(value["folderId"], json!("9"));
    }

    #[test]
    fn test_serialize_always_string() {
        let id = RecordId::from(42i64);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"42\"");
    }

    #[test]
    fn test_deserialize_accepts_both_shapes() {
        let a: RecordId = serde_json::from_str("17").unwrap();
        let b: RecordId = serde_json::from_str("\"17\"").unwrap();
        assert_eq!(a, b);
        assert!(serde_json::from_str::<RecordId>("false").is_err());
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(RecordId::generate(), RecordId::generate());
    }
}
