//! Record services
//!
//! Persistence, indexing and access checks for LOM records. Callers get a
//! service handle passed in explicitly (see [`RecordsService`]) instead of
//! resolving one from global state, so views and commands can be exercised
//! against any implementation.

pub mod fixtures;
pub mod indexer;
pub mod records;
pub mod storage;

pub use fixtures::*;
pub use indexer::*;
pub use records::*;
pub use storage::*;

use crate::types::{FileList, Identity, RecordId, RecordItem};

/// Record service errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// No record or draft with this id
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },
    /// The identity may not perform the action
    #[error("Permission denied: {identity} may not {action} '{id}'")]
    PermissionDenied {
        identity: String,
        action: &'static str,
        id: String,
    },
    /// A record or draft with this id already exists
    #[error("{kind} '{id}' already exists")]
    AlreadyExists { kind: &'static str, id: String },
    /// Stored document is not a valid record
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
    /// IO error during persistence
    #[error("IO error: {0}")]
    IoError(String),
    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl ServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }
}

/// Read access to records, drafts and their files
pub trait RecordsService {
    /// Read a published record
    fn read(&self, identity: &Identity, id: &RecordId) -> Result<RecordItem, ServiceError>;

    /// Read a draft
    fn read_draft(&self, identity: &Identity, id: &RecordId) -> Result<RecordItem, ServiceError>;

    /// List the files of a published record
    fn list_files(&self, identity: &Identity, id: &RecordId) -> Result<FileList, ServiceError>;

    /// List the files of a draft
    fn list_draft_files(&self, identity: &Identity, id: &RecordId)
    -> Result<FileList, ServiceError>;

    /// Reindex all records and drafts, returning how many documents were indexed
    fn rebuild_index(&self, identity: &Identity) -> Result<usize, ServiceError>;
}
