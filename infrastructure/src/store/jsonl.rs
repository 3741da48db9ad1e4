//! JSONL file-backed store adapters
//!
//! One JSON record per line, loaded fully at open. Mutations update the
//! in-memory map and rewrite the file atomically (write to a temp file,
//! then rename), preserving upsert-by-id semantics across restarts.
//! Unreadable lines are skipped with a warning rather than failing the
//! whole store.

use async_trait::async_trait;
use council_application::ports::retrieval_store::{DocumentStore, StoreError, VectorStore};
use council_domain::{Document, VectorEntry};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::warn;

pub struct JsonlDocumentStore {
    path: PathBuf,
    documents: RwLock<HashMap<String, Document>>,
}

impl JsonlDocumentStore {
    /// Open (or create) a document store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let documents = load_records(&path, |d: &Document| d.id.clone())?;
        Ok(Self {
            path,
            documents: RwLock::new(documents),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DocumentStore for JsonlDocumentStore {
    async fn upsert(&self, document: Document) -> Result<(), StoreError> {
        let mut documents = self.documents.write().map_err(poisoned)?;
        documents.insert(document.id.clone(), document);
        write_records(&self.path, documents.values())
    }

    async fn remove(&self, doc_id: &str) -> Result<bool, StoreError> {
        let mut documents = self.documents.write().map_err(poisoned)?;
        let existed = documents.remove(doc_id).is_some();
        if existed {
            write_records(&self.path, documents.values())?;
        }
        Ok(existed)
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

pub struct JsonlVectorStore {
    path: PathBuf,
    entries: RwLock<HashMap<String, VectorEntry>>,
}

impl JsonlVectorStore {
    /// Open (or create) a vector store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let entries = load_records(&path, |e: &VectorEntry| e.id.clone())?;
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl VectorStore for JsonlVectorStore {
    async fn upsert(&self, entry: VectorEntry) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.insert(entry.id.clone(), entry);
        write_records(&self.path, entries.values())
    }

    async fn remove_by_doc(&self, doc_id: &str) -> Result<usize, StoreError> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        let before = entries.len();
        entries.retain(|_, entry| entry.doc_id != doc_id);
        let removed = before - entries.len();
        if removed > 0 {
            write_records(&self.path, entries.values())?;
        }
        Ok(removed)
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

fn load_records<T: DeserializeOwned>(
    path: &Path,
    key: impl Fn(&T) -> String,
) -> Result<HashMap<String, T>, StoreError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }

    let mut map = HashMap::new();
    if !path.exists() {
        return Ok(map);
    }

    let file = File::open(path).map_err(io_err)?;
    for (lineno, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(io_err)?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(&line) {
            Ok(record) => {
                map.insert(key(&record), record);
            }
            Err(e) => {
                warn!(path = %path.display(), lineno, "Skipping unreadable record: {}", e);
            }
        }
    }
    Ok(map)
}

fn write_records<'a, T: Serialize + 'a>(
    path: &Path,
    records: impl Iterator<Item = &'a T>,
) -> Result<(), StoreError> {
    let tmp = path.with_extension("jsonl.tmp");
    {
        let file = File::create(&tmp).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        for record in records {
            let line = serde_json::to_string(record)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            writeln!(writer, "{}", line).map_err(io_err)?;
        }
        writer.flush().map_err(io_err)?;
    }
    std::fs::rename(&tmp, path).map_err(io_err)
}

fn io_err(e: std::io::Error) -> StoreError {
    StoreError::Io(e.to_string())
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> StoreError {
    StoreError::Io("store lock poisoned".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::ChunkMetadata;
    use tempfile::tempdir;

    fn entry(doc_id: &str, chunk_index: usize) -> VectorEntry {
        VectorEntry::new(
            doc_id,
            chunk_index,
            "text",
            vec![0.5, -0.5],
            ChunkMetadata {
                title: doc_id.to_string(),
                source: "file".to_string(),
                category: "test".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn documents_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("documents.jsonl");

        {
            let store = JsonlDocumentStore::open(&path).unwrap();
            store
                .upsert(Document::new("d1", "Title", "content", "upload", "notes"))
                .await
                .unwrap();
        }

        let reopened = JsonlDocumentStore::open(&path).unwrap();
        let document = reopened.get("d1").await.unwrap().unwrap();
        assert_eq!(document.title, "Title");
        assert_eq!(reopened.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn vector_entries_survive_reopen_and_cascade() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vectors.jsonl");

        {
            let store = JsonlVectorStore::open(&path).unwrap();
            store.upsert(entry("drop", 0)).await.unwrap();
            store.upsert(entry("drop", 1)).await.unwrap();
            store.upsert(entry("keep", 0)).await.unwrap();
        }

        let reopened = JsonlVectorStore::open(&path).unwrap();
        assert_eq!(reopened.len().await.unwrap(), 3);
        assert_eq!(reopened.remove_by_doc("drop").await.unwrap(), 2);

        let reopened_again = JsonlVectorStore::open(&path).unwrap();
        let snapshot = reopened_again.snapshot().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].doc_id, "keep");
        assert_eq!(snapshot[0].embedding, vec![0.5, -0.5]);
    }

    #[tokio::test]
    async fn upsert_replaces_by_id_on_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("documents.jsonl");

        let store = JsonlDocumentStore::open(&path).unwrap();
        store
            .upsert(Document::new("d1", "v1", "c", "s", "cat"))
            .await
            .unwrap();
        store
            .upsert(Document::new("d1", "v2", "c", "s", "cat"))
            .await
            .unwrap();

        let reopened = JsonlDocumentStore::open(&path).unwrap();
        assert_eq!(reopened.len().await.unwrap(), 1);
        assert_eq!(reopened.get("d1").await.unwrap().unwrap().title, "v2");
    }

    #[tokio::test]
    async fn unreadable_lines_are_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("documents.jsonl");

        let good = serde_json::to_string(&Document::new("d1", "t", "c", "s", "cat")).unwrap();
        std::fs::write(&path, format!("not json at all\n{}\n", good)).unwrap();

        let store = JsonlDocumentStore::open(&path).unwrap();
        assert_eq!(store.len().await.unwrap(), 1);
        assert!(store.get("d1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn missing_file_opens_empty() {
        let dir = tempdir().unwrap();
        let store = JsonlVectorStore::open(dir.path().join("fresh.jsonl")).unwrap();
        assert_eq!(store.len().await.unwrap(), 0);
        assert!(store.snapshot().await.unwrap().is_empty());
    }
}
