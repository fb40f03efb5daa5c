//! LOM records service
//!
//! Creates, publishes and reads records and drafts kept in a [`RecordStore`],
//! checks access for the calling identity and keeps the record and draft
//! indices in sync.

use chrono::{SecondsFormat, Utc};
use serde_json::{Value, json};
use std::path::PathBuf;

use super::{Collection, FileIndexer, Indexer, RecordStore, RecordsService, ServiceError};
use crate::types::{AccessLevel, FileList, Identity, RecordId, RecordItem};

/// Index name of published records
pub const RECORDS_INDEX: &str = "lomrecords-records";

/// Index name of drafts
pub const DRAFTS_INDEX: &str = "lomrecords-drafts";

/// Records service over a file store and two indices
#[derive(Debug)]
pub struct LomRecordsService<I: Indexer = FileIndexer> {
    store: RecordStore,
    record_indexer: I,
    draft_indexer: I,
}

impl LomRecordsService<FileIndexer> {
    /// Open a service with file indices under `<data_dir>/index`
    pub fn open(data_dir: PathBuf) -> Result<Self, ServiceError> {
        let index_dir = data_dir.join("index");
        let store = RecordStore::new(data_dir)?;
        Ok(Self::new(
            store,
            FileIndexer::new(index_dir.clone(), RECORDS_INDEX)?,
            FileIndexer::new(index_dir, DRAFTS_INDEX)?,
        ))
    }
}

impl<I: Indexer> LomRecordsService<I> {
    pub fn new(store: RecordStore, record_indexer: I, draft_indexer: I) -> Self {
        Self {
            store,
            record_indexer,
            draft_indexer,
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Index of published records
    pub fn indexer(&self) -> &I {
        &self.record_indexer
    }

    pub fn draft_indexer(&self) -> &I {
        &self.draft_indexer
    }

    /// Create a draft from a record document
    ///
    /// A missing `id` is generated; `created`/`updated` default to now and
    /// the creating user becomes the owner.
    pub fn create_draft(&self, identity: &Identity, data: Value) -> Result<RecordItem, ServiceError> {
        if matches!(identity, Identity::Anonymous) {
            return Err(ServiceError::PermissionDenied {
                identity: identity.to_string(),
                action: "create",
                id: data
                    .get("id")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            });
        }

        let Value::Object(mut map) = data else {
            return Err(ServiceError::InvalidRecord(
                "record document must be a mapping".to_string(),
            ));
        };

        if !map.contains_key("id") {
            let id = RecordId::generate(&mut rand::thread_rng());
            map.insert("id".to_string(), json!(id.value()));
        }
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, false);
        map.entry("created").or_insert_with(|| json!(now));
        map.entry("updated").or_insert_with(|| json!(now));
        map.entry("metadata").or_insert_with(|| json!({}));
        let access = map
            .entry("access")
            .or_insert_with(|| json!({"record": "public", "files": "public"}));
        if let (Some(user_id), Some(access)) = (identity.user_id(), access.as_object_mut()) {
            access
                .entry("owned_by")
                .or_insert_with(|| json!([user_id]));
        }

        let mut draft = RecordItem::from_json(Value::Object(map))?;
        draft.set_draft(true);

        for collection in [Collection::Drafts, Collection::Records] {
            if self.store.exists(collection, draft.id()) {
                return Err(ServiceError::AlreadyExists {
                    kind: collection.kind(),
                    id: draft.id().to_string(),
                });
            }
        }

        self.store.save(Collection::Drafts, &draft)?;
        self.draft_indexer.index(&draft)?;
        tracing::debug!("Created draft '{}' as {}", draft.id(), identity);
        Ok(draft)
    }

    /// Publish a draft, moving it to the records collection
    pub fn publish(&self, identity: &Identity, id: &RecordId) -> Result<RecordItem, ServiceError> {
        let mut record = self.store.load_item(Collection::Drafts, id)?;
        if !is_owner_or_system(identity, &record) {
            return Err(permission_denied(identity, "publish", id));
        }

        record.set_draft(false);
        self.store.save(Collection::Records, &record)?;
        self.store.delete(Collection::Drafts, id)?;
        self.draft_indexer.delete(id)?;
        self.record_indexer.index(&record)?;

        tracing::info!("Published record '{}'", id);
        Ok(record)
    }

    /// Ids of stored published records that carry an `id`
    pub fn record_ids(&self) -> Result<Vec<RecordId>, ServiceError> {
        Ok(self
            .store
            .documents(Collection::Records)?
            .iter()
            .filter_map(|document| document.get("id").and_then(Value::as_str))
            .map(RecordId::from)
            .collect())
    }

    /// Load a published record by id without access checks
    pub fn resolve(&self, id: &RecordId) -> Result<RecordItem, ServiceError> {
        self.store.load_item(Collection::Records, id)
    }

    /// Index every stored published record, leaving drafts untouched
    pub fn reindex_records(&self, identity: &Identity) -> Result<usize, ServiceError> {
        if !identity.is_system() {
            return Err(permission_denied(identity, "reindex", RECORDS_INDEX));
        }

        let ids = self.record_ids()?;
        for id in &ids {
            let record = self.resolve(id)?;
            self.record_indexer.index(&record)?;
        }

        tracing::info!("Reindexed {} records", ids.len());
        Ok(ids.len())
    }

    fn read_from(
        &self,
        collection: Collection,
        identity: &Identity,
        id: &RecordId,
    ) -> Result<RecordItem, ServiceError> {
        let item = self.store.load_item(collection, id)?;
        let allowed = match collection {
            Collection::Records => can_read_record(identity, &item),
            Collection::Drafts => is_owner_or_system(identity, &item),
        };
        if !allowed {
            return Err(permission_denied(identity, "read", id));
        }
        Ok(item)
    }

    fn files_from(
        &self,
        collection: Collection,
        identity: &Identity,
        id: &RecordId,
    ) -> Result<FileList, ServiceError> {
        let item = self.read_from(collection, identity, id)?;
        if item.files_access() == AccessLevel::Restricted && !is_owner_or_system(identity, &item) {
            return Err(permission_denied(identity, "list files of", id));
        }
        Ok(item.files())
    }
}

impl<I: Indexer> RecordsService for LomRecordsService<I> {
    fn read(&self, identity: &Identity, id: &RecordId) -> Result<RecordItem, ServiceError> {
        self.read_from(Collection::Records, identity, id)
    }

    fn read_draft(&self, identity: &Identity, id: &RecordId) -> Result<RecordItem, ServiceError> {
        self.read_from(Collection::Drafts, identity, id)
    }

    fn list_files(&self, identity: &Identity, id: &RecordId) -> Result<FileList, ServiceError> {
        self.files_from(Collection::Records, identity, id)
    }

    fn list_draft_files(
        &self,
        identity: &Identity,
        id: &RecordId,
    ) -> Result<FileList, ServiceError> {
        self.files_from(Collection::Drafts, identity, id)
    }

    fn rebuild_index(&self, identity: &Identity) -> Result<usize, ServiceError> {
        if !identity.is_system() {
            return Err(permission_denied(identity, "rebuild", "index"));
        }

        let mut indexed = 0;
        for (collection, indexer) in [
            (Collection::Records, &self.record_indexer),
            (Collection::Drafts, &self.draft_indexer),
        ] {
            indexer.clear()?;
            for document in self.store.documents(collection)? {
                match RecordItem::from_json(document) {
                    Ok(item) => {
                        indexer.index(&item)?;
                        indexed += 1;
                    }
                    Err(e) => tracing::warn!("Skipping {} document: {}", collection.kind(), e),
                }
            }
        }

        tracing::info!("Rebuilt indices with {} documents", indexed);
        Ok(indexed)
    }
}

fn is_owner_or_system(identity: &Identity, item: &RecordItem) -> bool {
    match identity {
        Identity::System => true,
        Identity::User(user_id) => item.owners().contains(&user_id.as_str()),
        Identity::Anonymous => false,
    }
}

fn can_read_record(identity: &Identity, item: &RecordItem) -> bool {
    item.record_access() == AccessLevel::Public || is_owner_or_system(identity, item)
}

fn permission_denied(identity: &Identity, action: &'static str, id: impl ToString) -> ServiceError {
    ServiceError::PermissionDenied {
        identity: identity.to_string(),
        action,
        id: id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MemoryIndexer;
    use tempfile::TempDir;

    fn service(temp_dir: &TempDir) -> LomRecordsService<MemoryIndexer> {
        LomRecordsService::new(
            RecordStore::new(temp_dir.path().to_path_buf()).unwrap(),
            MemoryIndexer::new(),
            MemoryIndexer::new(),
        )
    }

    #[test]
    fn test_create_draft_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(&temp_dir);

        let draft = service
            .create_draft(&Identity::user("7"), json!({"metadata": {"general": {}}}))
            .unwrap();

        assert!(draft.is_draft());
        assert_eq!(draft.owners(), vec!["7"]);
        assert!(draft.created().is_some());
        assert_eq!(service.draft_indexer().count().unwrap(), 1);
    }

    #[test]
    fn test_anonymous_cannot_create() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(&temp_dir);
        let err = service
            .create_draft(&Identity::Anonymous, json!({"id": "a"}))
            .unwrap_err();
        assert!(err.is_permission_denied());
    }

    #[test]
    fn test_duplicate_draft_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(&temp_dir);
        service
            .create_draft(&Identity::system(), json!({"id": "a"}))
            .unwrap();
        let err = service
            .create_draft(&Identity::system(), json!({"id": "a"}))
            .unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyExists { .. }));
    }

    #[test]
    fn test_publish_moves_draft() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(&temp_dir);
        let id = RecordId::from("a");
        service
            .create_draft(&Identity::system(), json!({"id": "a"}))
            .unwrap();

        let record = service.publish(&Identity::system(), &id).unwrap();

        assert!(!record.is_draft());
        assert!(service.read_draft(&Identity::system(), &id).unwrap_err().is_not_found());
        assert!(service.read(&Identity::Anonymous, &id).is_ok());
        assert_eq!(service.draft_indexer().count().unwrap(), 0);
        assert_eq!(service.indexer().ids(), vec![id]);
    }

    #[test]
    fn test_only_owner_publishes() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(&temp_dir);
        service
            .create_draft(&Identity::user("1"), json!({"id": "a"}))
            .unwrap();
        let err = service
            .publish(&Identity::user("2"), &RecordId::from("a"))
            .unwrap_err();
        assert!(err.is_permission_denied());
    }

    #[test]
    fn test_reindex_records_skips_drafts() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(&temp_dir);
        service
            .create_draft(&Identity::system(), json!({"id": "a"}))
            .unwrap();
        service.publish(&Identity::system(), &RecordId::from("a")).unwrap();
        service
            .create_draft(&Identity::system(), json!({"id": "b"}))
            .unwrap();
        service.indexer().clear().unwrap();

        assert_eq!(service.reindex_records(&Identity::system()).unwrap(), 1);
        assert_eq!(service.indexer().ids(), vec![RecordId::from("a")]);
        assert!(
            service
                .reindex_records(&Identity::Anonymous)
                .unwrap_err()
                .is_permission_denied()
        );
    }

    #[test]
    fn test_rebuild_index_requires_system() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(&temp_dir);
        let err = service.rebuild_index(&Identity::user("1")).unwrap_err();
        assert!(err.is_permission_denied());
    }
}
