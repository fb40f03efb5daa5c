//! JSON-file record storage
//!
//! Layout below the data directory:
//!
//! ```text
//! records/<id>.json   published records
//! drafts/<id>.json    drafts
//! ```

use serde_json::Value;
use std::path::{Path, PathBuf};

use super::ServiceError;
use crate::types::{RecordId, RecordItem};

/// Which collection a document lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Records,
    Drafts,
}

impl Collection {
    fn dir_name(&self) -> &'static str {
        match self {
            Collection::Records => "records",
            Collection::Drafts => "drafts",
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Collection::Records => "Record",
            Collection::Drafts => "Draft",
        }
    }
}

/// File-backed store of record and draft documents
#[derive(Debug, Clone)]
pub struct RecordStore {
    data_dir: PathBuf,
}

impl RecordStore {
    /// Open a store, creating its directories when missing
    pub fn new(data_dir: PathBuf) -> Result<Self, ServiceError> {
        let store = Self { data_dir };
        for collection in [Collection::Records, Collection::Drafts] {
            std::fs::create_dir_all(store.collection_dir(collection))
                .map_err(|e| ServiceError::IoError(e.to_string()))?;
        }
        Ok(store)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn collection_dir(&self, collection: Collection) -> PathBuf {
        self.data_dir.join(collection.dir_name())
    }

    fn document_path(&self, collection: Collection, id: &RecordId) -> PathBuf {
        self.collection_dir(collection)
            .join(format!("{}.json", id.value()))
    }

    pub fn exists(&self, collection: Collection, id: &RecordId) -> bool {
        self.document_path(collection, id).exists()
    }

    /// Load one document, `None` when it does not exist
    pub fn load(
        &self,
        collection: Collection,
        id: &RecordId,
    ) -> Result<Option<Value>, ServiceError> {
        validate_id(id)?;
        let path = self.document_path(collection, id);
        if !path.exists() {
            return Ok(None);
        }
        read_document(&path).map(Some)
    }

    /// Load a document and wrap it as a record item
    pub fn load_item(
        &self,
        collection: Collection,
        id: &RecordId,
    ) -> Result<RecordItem, ServiceError> {
        let data = self.load(collection, id)?.ok_or_else(|| ServiceError::NotFound {
            kind: collection.kind(),
            id: id.to_string(),
        })?;
        RecordItem::from_json(data)
    }

    pub fn save(&self, collection: Collection, item: &RecordItem) -> Result<(), ServiceError> {
        validate_id(item.id())?;
        let content = serde_json::to_string_pretty(item.data())
            .map_err(|e| ServiceError::SerializationError(e.to_string()))?;
        std::fs::write(self.document_path(collection, item.id()), content)
            .map_err(|e| ServiceError::IoError(e.to_string()))
    }

    pub fn delete(&self, collection: Collection, id: &RecordId) -> Result<(), ServiceError> {
        validate_id(id)?;
        let path = self.document_path(collection, id);
        if path.exists() {
            std::fs::remove_file(path).map_err(|e| ServiceError::IoError(e.to_string()))?;
        }
        Ok(())
    }

    /// All documents of a collection, ordered by file name
    pub fn documents(&self, collection: Collection) -> Result<Vec<Value>, ServiceError> {
        let dir = self.collection_dir(collection);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        let entries = std::fs::read_dir(&dir).map_err(|e| ServiceError::IoError(e.to_string()))?;
        for entry in entries {
            let entry = entry.map_err(|e| ServiceError::IoError(e.to_string()))?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            match read_document(&path) {
                Ok(document) => documents.push(document),
                Err(e) => tracing::warn!("Skipping unreadable document {}: {}", path.display(), e),
            }
        }
        Ok(documents)
    }
}

fn read_document(path: &Path) -> Result<Value, ServiceError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| ServiceError::IoError(e.to_string()))?;
    serde_json::from_str(&content).map_err(|e| ServiceError::SerializationError(e.to_string()))
}

/// Reject ids that would escape the collection directory
fn validate_id(id: &RecordId) -> Result<(), ServiceError> {
    let value = id.value();
    if value.is_empty()
        || value.len() > 100
        || value.contains(['/', '\\', ':', '*', '?', '"', '<', '>', '|'])
        || value.starts_with('.')
    {
        return Err(ServiceError::InvalidRecord(format!(
            "invalid record id '{}'",
            value
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let store = RecordStore::new(temp_dir.path().to_path_buf()).unwrap();
        let item = RecordItem::from_json(json!({"id": "abcde-12345", "metadata": {}})).unwrap();

        store.save(Collection::Drafts, &item).unwrap();

        assert!(store.exists(Collection::Drafts, item.id()));
        assert!(!store.exists(Collection::Records, item.id()));
        let loaded = store.load_item(Collection::Drafts, item.id()).unwrap();
        assert_eq!(loaded, item);
    }

    #[test]
    fn test_load_missing_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let store = RecordStore::new(temp_dir.path().to_path_buf()).unwrap();
        let err = store
            .load_item(Collection::Records, &RecordId::from("nope"))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_rejects_path_like_ids() {
        let temp_dir = TempDir::new().unwrap();
        let store = RecordStore::new(temp_dir.path().to_path_buf()).unwrap();
        let result = store.load(Collection::Records, &RecordId::from("../secret"));
        assert!(matches!(result, Err(ServiceError::InvalidRecord(_))));
    }

    #[test]
    fn test_documents_are_sorted_and_skip_garbage() {
        let temp_dir = TempDir::new().unwrap();
        let store = RecordStore::new(temp_dir.path().to_path_buf()).unwrap();
        for id in ["b", "a", "c"] {
            let item = RecordItem::from_json(json!({"id": id})).unwrap();
            store.save(Collection::Records, &item).unwrap();
        }
        std::fs::write(temp_dir.path().join("records/broken.json"), "{not json").unwrap();

        let ids: Vec<String> = store
            .documents(Collection::Records)
            .unwrap()
            .iter()
            .map(|d| d["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
