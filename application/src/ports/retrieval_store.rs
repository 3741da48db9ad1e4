//! Persistence ports for the retrieval engine
//!
//! Both stores use upsert-by-id semantics so the backing medium (memory,
//! flat file, embedded store) is swappable without changing the in-memory
//! contract. `snapshot` is the consistency point for concurrent search:
//! a search scans a snapshot and can never observe a partially appended
//! entry list.

use async_trait::async_trait;
use council_domain::{Document, VectorEntry};
use thiserror::Error;

/// Errors from a backing store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(String),

    #[error("Storage serialization error: {0}")]
    Serialization(String),
}

/// Document records keyed by id
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert or replace the document with the same id.
    async fn upsert(&self, document: Document) -> Result<(), StoreError>;

    /// Remove a document; returns whether it existed. Removing a missing
    /// id is a no-op, not an error.
    async fn remove(&self, doc_id: &str) -> Result<bool, StoreError>;

    async fn get(&self, doc_id: &str) -> Result<Option<Document>, StoreError>;

    async fn len(&self) -> Result<usize, StoreError>;
}

/// Vector entries keyed by id, with a foreign reference to their document
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace the entry with the same id.
    async fn upsert(&self, entry: VectorEntry) -> Result<(), StoreError>;

    /// Remove every entry belonging to `doc_id`; returns how many were
    /// removed. No orphans are permitted to survive a document deletion.
    async fn remove_by_doc(&self, doc_id: &str) -> Result<usize, StoreError>;

    /// A consistent copy of all entries for exhaustive scanning.
    async fn snapshot(&self) -> Result<Vec<VectorEntry>, StoreError>;

    async fn len(&self) -> Result<usize, StoreError>;
}
