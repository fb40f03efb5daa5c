//! Search index abstraction
//!
//! The service only needs to push documents into an index and clear it; what
//! sits behind the trait is up to the deployment. Two implementations ship
//! here: a JSON file per index and an in-process map.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

use super::ServiceError;
use crate::types::{RecordId, RecordItem};

/// Sink for indexed record documents
pub trait Indexer {
    /// Add or replace the document of `record`
    fn index(&self, record: &RecordItem) -> Result<(), ServiceError>;

    /// Remove a document, ignoring ids that are not indexed
    fn delete(&self, id: &RecordId) -> Result<(), ServiceError>;

    /// Remove every document
    fn clear(&self) -> Result<(), ServiceError>;

    /// Number of indexed documents
    fn count(&self) -> Result<usize, ServiceError>;

    /// Indexed document of `id`
    fn get(&self, id: &RecordId) -> Result<Option<Value>, ServiceError>;
}

/// Index persisted as one JSON object (`id -> document`) in `<dir>/<name>.json`
#[derive(Debug, Clone)]
pub struct FileIndexer {
    path: PathBuf,
}

impl FileIndexer {
    pub fn new(index_dir: PathBuf, name: &str) -> Result<Self, ServiceError> {
        std::fs::create_dir_all(&index_dir).map_err(|e| ServiceError::IoError(e.to_string()))?;
        Ok(Self {
            path: index_dir.join(format!("{}.json", name)),
        })
    }

    fn load(&self) -> Result<Map<String, Value>, ServiceError> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| ServiceError::IoError(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| ServiceError::SerializationError(e.to_string()))
    }

    fn store(&self, documents: &Map<String, Value>) -> Result<(), ServiceError> {
        let content = serde_json::to_string(documents)
            .map_err(|e| ServiceError::SerializationError(e.to_string()))?;
        std::fs::write(&self.path, content).map_err(|e| ServiceError::IoError(e.to_string()))
    }
}

impl Indexer for FileIndexer {
    fn index(&self, record: &RecordItem) -> Result<(), ServiceError> {
        let mut documents = self.load()?;
        documents.insert(record.id().to_string(), record.data().clone());
        self.store(&documents)
    }

    fn delete(&self, id: &RecordId) -> Result<(), ServiceError> {
        let mut documents = self.load()?;
        if documents.shift_remove(id.value()).is_some() {
            self.store(&documents)?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), ServiceError> {
        self.store(&Map::new())
    }

    fn count(&self) -> Result<usize, ServiceError> {
        Ok(self.load()?.len())
    }

    fn get(&self, id: &RecordId) -> Result<Option<Value>, ServiceError> {
        Ok(self.load()?.get(id.value()).cloned())
    }
}

/// Index held in memory
#[derive(Debug, Default)]
pub struct MemoryIndexer {
    documents: Mutex<BTreeMap<RecordId, Value>>,
}

impl MemoryIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids currently indexed, in id order
    pub fn ids(&self) -> Vec<RecordId> {
        self.lock().keys().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<RecordId, Value>> {
        // A poisoned map is still a consistent map
        self.documents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Indexer for MemoryIndexer {
    fn index(&self, record: &RecordItem) -> Result<(), ServiceError> {
        self.lock()
            .insert(record.id().clone(), record.data().clone());
        Ok(())
    }

    fn delete(&self, id: &RecordId) -> Result<(), ServiceError> {
        self.lock().remove(id);
        Ok(())
    }

    fn clear(&self) -> Result<(), ServiceError> {
        self.lock().clear();
        Ok(())
    }

    fn count(&self) -> Result<usize, ServiceError> {
        Ok(self.lock().len())
    }

    fn get(&self, id: &RecordId) -> Result<Option<Value>, ServiceError> {
        Ok(self.lock().get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn item(id: &str) -> RecordItem {
        RecordItem::from_json(json!({"id": id, "metadata": {}})).unwrap()
    }

    #[test]
    fn test_file_indexer_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let indexer = FileIndexer::new(temp_dir.path().join("index"), "records").unwrap();

        assert_eq!(indexer.count().unwrap(), 0);
        indexer.index(&item("a")).unwrap();
        indexer.index(&item("b")).unwrap();
        indexer.index(&item("a")).unwrap();
        assert_eq!(indexer.count().unwrap(), 2);

        indexer.delete(&RecordId::from("a")).unwrap();
        assert!(indexer.get(&RecordId::from("a")).unwrap().is_none());
        assert!(indexer.get(&RecordId::from("b")).unwrap().is_some());

        indexer.clear().unwrap();
        assert_eq!(indexer.count().unwrap(), 0);
    }

    #[test]
    fn test_memory_indexer() {
        let indexer = MemoryIndexer::new();
        indexer.index(&item("z")).unwrap();
        indexer.index(&item("y")).unwrap();
        assert_eq!(indexer.ids(), vec![RecordId::from("y"), RecordId::from("z")]);
        indexer.delete(&RecordId::from("missing")).unwrap();
        assert_eq!(indexer.count().unwrap(), 2);
    }
}
