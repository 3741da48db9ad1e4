//! In-memory store adapters
//!
//! HashMap-backed stores guarded by `RwLock`. `snapshot` clones the entry
//! set under the read lock, so a concurrent search works on a consistent
//! copy and can never observe a partially applied write.

use async_trait::async_trait;
use council_application::ports::retrieval_store::{DocumentStore, StoreError, VectorStore};
use council_domain::{Document, VectorEntry};
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<HashMap<String, Document>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn upsert(&self, document: Document) -> Result<(), StoreError> {
        let mut documents = self.documents.write().map_err(poisoned)?;
        documents.insert(document.id.clone(), document);
        Ok(())
    }

    async fn remove(&self, doc_id: &str) -> Result<bool, StoreError> {
        let mut documents = self.documents.write().map_err(poisoned)?;
        Ok(documents.remove(doc_id).is_some())
    }

    async fn get(&self, doc_id: &str) -> Result<Option<Document>, StoreError> {
        let documents = self.documents.read().map_err(poisoned)?;
        Ok(documents.get(doc_id).cloned())
    }

    async fn len(&self) -> Result<usize, StoreError> {
        let documents = self.documents.read().map_err(poisoned)?;
        Ok(documents.len())
    }
}

#[derive(Default)]
pub struct InMemoryVectorStore {
    entries: RwLock<HashMap<String, VectorEntry>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn upsert(&self, entry: VectorEntry) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.insert(entry.id.clone(), entry);
        Ok(())
    }

    async fn remove_by_doc(&self, doc_id: &str) -> Result<usize, StoreError> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        let before = entries.len();
        entries.retain(|_, entry| entry.doc_id != doc_id);
        Ok(before - entries.len())
    }

    async fn snapshot(&self) -> Result<Vec<VectorEntry>, StoreError> {
        let entries = self.entries.read().map_err(poisoned)?;
        let mut snapshot: Vec<VectorEntry> = entries.values().cloned().collect();
        snapshot.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(snapshot)
    }

    async fn len(&self) -> Result<usize, StoreError> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.len())
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> StoreError {
    StoreError::Io("store lock poisoned".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::ChunkMetadata;

    fn entry(doc_id: &str, chunk_index: usize) -> VectorEntry {
        VectorEntry::new(
            doc_id,
            chunk_index,
            format!("chunk {chunk_index} of {doc_id}"),
            vec![0.1, 0.2, 0.3],
            ChunkMetadata {
                title: doc_id.to_string(),
                source: "test".to_string(),
                category: "test".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn document_upsert_replaces_by_id() {
        let store = InMemoryDocumentStore::new();
        store
            .upsert(Document::new("d1", "v1", "c", "s", "cat"))
            .await
            .unwrap();
        store
            .upsert(Document::new("d1", "v2", "c", "s", "cat"))
            .await
            .unwrap();

        assert_eq!(store.len().await.unwrap(), 1);
        assert_eq!(store.get("d1").await.unwrap().unwrap().title, "v2");
    }

    #[tokio::test]
    async fn document_remove_is_idempotent() {
        let store = InMemoryDocumentStore::new();
        store
            .upsert(Document::new("d1", "t", "c", "s", "cat"))
            .await
            .unwrap();

        assert!(store.remove("d1").await.unwrap());
        assert!(!store.remove("d1").await.unwrap());
    }

    #[tokio::test]
    async fn vector_remove_by_doc_cascades_and_spares_others() {
        let store = InMemoryVectorStore::new();
        for chunk in 0..3 {
            store.upsert(entry("drop", chunk)).await.unwrap();
        }
        store.upsert(entry("keep", 0)).await.unwrap();

        let kept_before = entry("keep", 0);
        assert_eq!(store.remove_by_doc("drop").await.unwrap(), 3);

        let snapshot = store.snapshot().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, kept_before.id);
        assert_eq!(snapshot[0].text, kept_before.text);
        assert_eq!(snapshot[0].embedding, kept_before.embedding);
    }

    #[tokio::test]
    async fn vector_remove_by_doc_unknown_is_zero() {
        let store = InMemoryVectorStore::new();
        assert_eq!(store.remove_by_doc("ghost").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn snapshot_is_a_copy() {
        let store = InMemoryVectorStore::new();
        store.upsert(entry("d1", 0)).await.unwrap();

        let snapshot = store.snapshot().await.unwrap();
        store.upsert(entry("d2", 0)).await.unwrap();

        // The earlier snapshot is unaffected by the later write
        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.len().await.unwrap(), 2);
    }
}
