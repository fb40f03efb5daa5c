//! Record domain types
//!
//! A stored record is kept as its JSON document; `RecordItem` wraps that
//! document and exposes the handful of fields the services and serializers
//! need to look at.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use strum::{Display, EnumString};

use crate::services::ServiceError;

static NULL: Value = Value::Null;

/// Persistent identifier of a record, e.g. `a1b2c-3d4e5`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn value(&self) -> &str {
        &self.0
    }

    /// Random id of the form `xxxxx-xxxxx` over a lower-case base32 alphabet
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut id = String::with_capacity(11);
        for i in 0..10 {
            if i == 5 {
                id.push('-');
            }
            let index = rng.gen_range(0..ID_ALPHABET.len());
            id.push(char::from(ID_ALPHABET[index]));
        }
        Self(id)
    }
}

/// Crockford base32 alphabet, lower case
const ID_ALPHABET: &[u8] = b"0123456789abcdefghjkmnpqrstvwxyz";

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Kind of learning resource a record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Course,
    Unit,
    File,
    Link,
    Upload,
}

/// Visibility of a record or of its files
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, Default,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    #[default]
    Public,
    Restricted,
}

/// Who performs an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// Internal identity allowed to do everything (CLI, indexing)
    System,
    /// Authenticated user
    User(String),
    Anonymous,
}

impl Identity {
    pub fn system() -> Self {
        Self::System
    }

    pub fn user(id: impl Into<String>) -> Self {
        Self::User(id.into())
    }

    pub fn is_system(&self) -> bool {
        matches!(self, Self::System)
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::User(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User(id) => write!(f, "user:{}", id),
            Self::Anonymous => write!(f, "anonymous"),
        }
    }
}

/// One entry of a record's file manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFile {
    pub key: String,
    pub size: u64,
    pub mimetype: String,
    pub checksum: String,
}

/// Files attached to a record or draft
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FileList {
    pub enabled: bool,
    pub entries: Vec<RecordFile>,
}

impl FileList {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(|f| f.size).sum()
    }
}

/// A record or draft as returned by a read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordItem {
    id: RecordId,
    data: Value,
}

impl RecordItem {
    /// Wrap a record document; it must be a mapping with a string `id`
    pub fn from_json(data: Value) -> Result<Self, ServiceError> {
        let id = data
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| ServiceError::InvalidRecord("record has no 'id'".to_string()))?;
        Ok(Self {
            id: RecordId::new(id),
            data,
        })
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn into_data(self) -> Value {
        self.data
    }

    /// The LOM metadata tree, `null` when absent
    pub fn metadata(&self) -> &Value {
        self.data.get("metadata").unwrap_or(&NULL)
    }

    pub fn doi(&self) -> Option<&str> {
        self.data
            .pointer("/pids/doi/identifier")
            .and_then(Value::as_str)
            .filter(|doi| !doi.is_empty())
    }

    pub fn resource_type(&self) -> Option<ResourceType> {
        self.data
            .get("resource_type")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
    }

    pub fn is_draft(&self) -> bool {
        self.data
            .get("is_draft")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn set_draft(&mut self, is_draft: bool) {
        if let Some(map) = self.data.as_object_mut() {
            map.insert("is_draft".to_string(), json!(is_draft));
        }
    }

    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.datetime_field("created")
    }

    pub fn updated(&self) -> Option<DateTime<Utc>> {
        self.datetime_field("updated")
    }

    fn datetime_field(&self, field: &str) -> Option<DateTime<Utc>> {
        self.data
            .get(field)
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn record_access(&self) -> AccessLevel {
        self.access_field("record")
    }

    pub fn files_access(&self) -> AccessLevel {
        self.access_field("files")
    }

    fn access_field(&self, field: &str) -> AccessLevel {
        self.data
            .get("access")
            .and_then(|access| access.get(field))
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    pub fn owners(&self) -> Vec<&str> {
        self.data
            .pointer("/access/owned_by")
            .and_then(Value::as_array)
            .map(|owners| owners.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// File manifest stored under `files`
    pub fn files(&self) -> FileList {
        let Some(files) = self.data.get("files") else {
            return FileList::default();
        };
        let enabled = files
            .get("enabled")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let entries = files
            .get("entries")
            .and_then(Value::as_object)
            .map(|entries| {
                entries
                    .values()
                    .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
                    .collect()
            })
            .unwrap_or_default();
        FileList { enabled, entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> RecordItem {
        RecordItem::from_json(json!({
            "id": "abcde-12345",
            "resource_type": "course",
            "pids": {"doi": {"identifier": "10.1234/abcde-12345", "provider": "datacite"}},
            "access": {"record": "public", "files": "restricted", "owned_by": ["7"]},
            "files": {
                "enabled": true,
                "entries": {
                    "slides.pdf": {"key": "slides.pdf", "size": 1024, "mimetype": "application/pdf", "checksum": "md5:abc"},
                    "notes.txt": {"key": "notes.txt", "size": 10, "mimetype": "text/plain", "checksum": "md5:def"}
                }
            },
            "created": "2024-01-05T10:00:00+00:00",
            "metadata": {"general": {}}
        }))
        .unwrap()
    }

    #[test]
    fn test_generated_ids_are_seed_stable() {
        use rand::SeedableRng;
        use rand::rngs::StdRng;

        let first = RecordId::generate(&mut StdRng::seed_from_u64(7));
        let second = RecordId::generate(&mut StdRng::seed_from_u64(7));
        assert_eq!(first, second);
        assert_eq!(first.value().len(), 11);
        assert_eq!(first.value().chars().nth(5), Some('-'));
    }

    #[test]
    fn test_record_without_id_is_invalid() {
        let result = RecordItem::from_json(json!({"metadata": {}}));
        assert!(matches!(result, Err(ServiceError::InvalidRecord(_))));
    }

    #[test]
    fn test_record_accessors() {
        let record = record();
        assert_eq!(record.id().value(), "abcde-12345");
        assert_eq!(record.doi(), Some("10.1234/abcde-12345"));
        assert_eq!(record.resource_type(), Some(ResourceType::Course));
        assert_eq!(record.record_access(), AccessLevel::Public);
        assert_eq!(record.files_access(), AccessLevel::Restricted);
        assert_eq!(record.owners(), vec!["7"]);
        assert!(!record.is_draft());
        assert_eq!(
            record.created().map(|d| d.to_rfc3339()),
            Some("2024-01-05T10:00:00+00:00".to_string())
        );
    }

    #[test]
    fn test_files_manifest_keeps_order() {
        let files = record().files();
        assert!(files.enabled);
        assert_eq!(files.len(), 2);
        assert_eq!(files.entries[0].key, "slides.pdf");
        assert_eq!(files.total_size(), 1034);
    }

    #[test]
    fn test_missing_metadata_is_null() {
        let record = RecordItem::from_json(json!({"id": "x"})).unwrap();
        assert!(record.metadata().is_null());
        assert_eq!(record.doi(), None);
        assert!(record.files().is_empty());
    }
}
