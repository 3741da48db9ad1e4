//! Retrieval engine
//!
//! Document ingestion (chunk → embed → persist), cascade deletion, and
//! exhaustive cosine-similarity search. Ingestion is best-effort per
//! chunk; search never raises — any failure degrades to the documented
//! empty outcome.

use crate::config::RetrievalConfig;
use crate::ports::embedding_gateway::EmbeddingGateway;
use crate::ports::retrieval_store::{DocumentStore, StoreError, VectorStore};
use council_domain::{
    ChunkMetadata, Document, SearchOutcome, SearchResult, SourceRef, VectorEntry,
    cosine_similarity,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Separator between retrieved chunks in the assembled context.
const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// What an ingestion run actually indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestSummary {
    pub chunks_total: usize,
    pub chunks_indexed: usize,
}

/// The retrieval engine over injected embedding and store ports.
pub struct RetrievalEngine<E: EmbeddingGateway + 'static> {
    embedder: Arc<E>,
    documents: Arc<dyn DocumentStore>,
    vectors: Arc<dyn VectorStore>,
    config: RetrievalConfig,
}

impl<E: EmbeddingGateway + 'static> RetrievalEngine<E> {
    pub fn new(
        embedder: Arc<E>,
        documents: Arc<dyn DocumentStore>,
        vectors: Arc<dyn VectorStore>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            embedder,
            documents,
            vectors,
            config,
        }
    }

    /// Ingest (or re-ingest) a document.
    ///
    /// Upserts the document record, replaces any previously indexed
    /// entries for the same id, then chunks and embeds the content.
    /// Per-chunk embedding failures are logged and skipped — ingestion is
    /// never all-or-nothing. Embedding calls are paced by the configured
    /// inter-call delay.
    pub async fn ingest(
        &self,
        doc_id: &str,
        title: &str,
        content: &str,
        source: &str,
        category: &str,
    ) -> Result<IngestSummary, StoreError> {
        let document = Document::new(doc_id, title, content, source, category);
        self.documents.upsert(document).await?;
        self.vectors.remove_by_doc(doc_id).await?;

        let chunks = self.config.chunking.chunk(content);
        let metadata = ChunkMetadata {
            title: title.to_string(),
            source: source.to_string(),
            category: category.to_string(),
        };

        let mut indexed = 0;
        for (chunk_index, chunk) in chunks.iter().enumerate() {
            if chunk_index > 0 && !self.config.embed_delay.is_zero() {
                tokio::time::sleep(self.config.embed_delay).await;
            }
            match self.embedder.embed(chunk).await {
                Ok(embedding) => {
                    let entry =
                        VectorEntry::new(doc_id, chunk_index, chunk, embedding, metadata.clone());
                    self.vectors.upsert(entry).await?;
                    indexed += 1;
                }
                Err(e) => {
                    warn!(doc_id, chunk_index, "Skipping chunk, embedding failed: {}", e);
                }
            }
        }

        info!(doc_id, total = chunks.len(), indexed, "Document ingested");
        Ok(IngestSummary {
            chunks_total: chunks.len(),
            chunks_indexed: indexed,
        })
    }

    /// Remove a document and cascade-delete its vector entries.
    /// Idempotent: removing an unknown id is a no-op.
    pub async fn remove(&self, doc_id: &str) -> Result<(), StoreError> {
        let existed = self.documents.remove(doc_id).await?;
        let removed = self.vectors.remove_by_doc(doc_id).await?;
        debug!(doc_id, existed, removed, "Document removed");
        Ok(())
    }

    /// Rank all stored entries against the query, best first.
    ///
    /// Exhaustive scan over a store snapshot; returns at most `top_k`
    /// results. An embedding failure returns an empty list rather than an
    /// error.
    pub async fn rank(&self, query: &str, top_k: usize) -> Vec<SearchResult> {
        let query_embedding = match self.embedder.embed(query).await {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!("Query embedding failed, returning no results: {}", e);
                return Vec::new();
            }
        };

        let entries = match self.vectors.snapshot().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Vector snapshot failed, returning no results: {}", e);
                return Vec::new();
            }
        };

        let mut results: Vec<SearchResult> = entries
            .into_iter()
            .map(|entry| {
                let score = cosine_similarity(&query_embedding, &entry.embedding);
                SearchResult { entry, score }
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(top_k);
        results
    }

    /// Search with the configured default result count.
    pub async fn search_default(&self, query: &str) -> SearchOutcome {
        self.search(query, self.config.top_k).await
    }

    /// Similarity search, assembled for consumption as grounding context.
    ///
    /// Never raises: an embedding failure or an empty store resolves to
    /// [`SearchOutcome::empty`].
    pub async fn search(&self, query: &str, top_k: usize) -> SearchOutcome {
        let results = self.rank(query, top_k).await;
        if results.is_empty() {
            return SearchOutcome::empty();
        }

        let context = results
            .iter()
            .map(|r| format!("[{}]\n{}", r.entry.metadata.title, r.entry.text))
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR);

        // Unique (title, source) pairs in first-seen order
        let mut sources: Vec<SourceRef> = Vec::new();
        for result in &results {
            let source = SourceRef {
                title: result.entry.metadata.title.clone(),
                source: result.entry.metadata.source.clone(),
            };
            if !sources.contains(&source) {
                sources.push(source);
            }
        }

        // Negative similarities clamp to 0 before averaging
        let relevance_score =
            results.iter().map(|r| r.score.max(0.0)).sum::<f32>() / results.len() as f32;

        SearchOutcome {
            context,
            sources,
            relevance_score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::embedding_gateway::EmbeddingError;
    use async_trait::async_trait;
    use council_domain::ChunkingPolicy;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Deterministic embedder: exact-text table lookups with a uniform
    /// fallback, plus an optional failure trigger.
    struct TableEmbedder {
        table: HashMap<String, Vec<f32>>,
        fail_on: Option<String>,
    }

    impl TableEmbedder {
        fn new() -> Self {
            Self {
                table: HashMap::new(),
                fail_on: None,
            }
        }

        fn with(mut self, text: &str, embedding: Vec<f32>) -> Self {
            self.table.insert(text.to_string(), embedding);
            self
        }

        fn failing_on(mut self, marker: &str) -> Self {
            self.fail_on = Some(marker.to_string());
            self
        }
    }

    #[async_trait]
    impl EmbeddingGateway for TableEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            if let Some(marker) = &self.fail_on
                && text.contains(marker.as_str())
            {
                return Err(EmbeddingError::Api {
                    status: 429,
                    body: "rate limited".to_string(),
                });
            }
            Ok(self
                .table
                .get(text)
                .cloned()
                .unwrap_or_else(|| vec![1.0, 1.0]))
        }
    }

    #[derive(Default)]
    struct MapDocumentStore {
        map: Mutex<HashMap<String, Document>>,
    }

    #[async_trait]
    impl DocumentStore for MapDocumentStore {
        async fn upsert(&self, document: Document) -> Result<(), StoreError> {
            self.map.lock().unwrap().insert(document.id.clone(), document);
            Ok(())
        }
        async fn remove(&self, doc_id: &str) -> Result<bool, StoreError> {
            Ok(self.map.lock().unwrap().remove(doc_id).is_some())
        }
        async fn get(&self, doc_id: &str) -> Result<Option<Document>, StoreError> {
            Ok(self.map.lock().unwrap().get(doc_id).cloned())
        }
        async fn len(&self) -> Result<usize, StoreError> {
            Ok(self.map.lock().unwrap().len())
        }
    }

    #[derive(Default)]
    struct MapVectorStore {
        map: Mutex<HashMap<String, VectorEntry>>,
    }

    #[async_trait]
    impl VectorStore for MapVectorStore {
        async fn upsert(&self, entry: VectorEntry) -> Result<(), StoreError> {
            self.map.lock().unwrap().insert(entry.id.clone(), entry);
            Ok(())
        }
        async fn remove_by_doc(&self, doc_id: &str) -> Result<usize, StoreError> {
            let mut map = self.map.lock().unwrap();
            let before = map.len();
            map.retain(|_, entry| entry.doc_id != doc_id);
            Ok(before - map.len())
        }
        async fn snapshot(&self) -> Result<Vec<VectorEntry>, StoreError> {
            let mut entries: Vec<VectorEntry> =
                self.map.lock().unwrap().values().cloned().collect();
            entries.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(entries)
        }
        async fn len(&self) -> Result<usize, StoreError> {
            Ok(self.map.lock().unwrap().len())
        }
    }

    fn engine(embedder: TableEmbedder, config: RetrievalConfig) -> RetrievalEngine<TableEmbedder> {
        RetrievalEngine::new(
            Arc::new(embedder),
            Arc::new(MapDocumentStore::default()),
            Arc::new(MapVectorStore::default()),
            config,
        )
    }

    fn fast_config() -> RetrievalConfig {
        RetrievalConfig {
            chunking: ChunkingPolicy::default(),
            embed_delay: Duration::ZERO,
            top_k: 5,
        }
    }

    #[tokio::test]
    async fn ingest_indexes_one_entry_per_chunk() {
        let engine = engine(TableEmbedder::new(), fast_config());
        let content = "a".repeat(1200);
        let summary = engine
            .ingest("doc-1", "Long Doc", &content, "upload", "notes")
            .await
            .unwrap();

        assert_eq!(summary.chunks_total, 3);
        assert_eq!(summary.chunks_indexed, 3);
        assert_eq!(engine.vectors.len().await.unwrap(), 3);

        let snapshot = engine.vectors.snapshot().await.unwrap();
        assert!(snapshot.iter().any(|e| e.id == "doc-1_0"));
        assert!(snapshot.iter().any(|e| e.id == "doc-1_2"));
    }

    #[tokio::test]
    async fn ingest_skips_failed_chunks() {
        // Second chunk contains the failure marker
        let content = format!("{}XFAILX{}", "a".repeat(500), "b".repeat(400));
        let engine = engine(TableEmbedder::new().failing_on("XFAILX"), fast_config());
        let summary = engine
            .ingest("doc-1", "Flaky", &content, "upload", "notes")
            .await
            .unwrap();

        assert!(summary.chunks_indexed < summary.chunks_total);
        assert!(engine.vectors.len().await.unwrap() >= 1);
    }

    #[tokio::test]
    async fn reingest_replaces_previous_entries() {
        let engine = engine(TableEmbedder::new(), fast_config());
        let long = "a".repeat(1200);
        engine
            .ingest("doc-1", "V1", &long, "upload", "notes")
            .await
            .unwrap();
        engine
            .ingest("doc-1", "V2", "short now", "upload", "notes")
            .await
            .unwrap();

        let snapshot = engine.vectors.snapshot().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].metadata.title, "V2");
    }

    #[tokio::test]
    async fn remove_cascades_and_leaves_other_documents_untouched() {
        let engine = engine(TableEmbedder::new(), fast_config());
        engine
            .ingest("keep", "Kept", "kept content", "upload", "notes")
            .await
            .unwrap();
        engine
            .ingest("drop", "Dropped", &"x".repeat(900), "upload", "notes")
            .await
            .unwrap();

        let before: Vec<VectorEntry> = engine
            .vectors
            .snapshot()
            .await
            .unwrap()
            .into_iter()
            .filter(|e| e.doc_id == "keep")
            .collect();

        engine.remove("drop").await.unwrap();

        let after = engine.vectors.snapshot().await.unwrap();
        assert!(after.iter().all(|e| e.doc_id == "keep"));
        assert_eq!(after, before);
        assert!(engine.documents.get("drop").await.unwrap().is_none());
        assert!(engine.documents.get("keep").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn remove_unknown_id_is_a_noop() {
        let engine = engine(TableEmbedder::new(), fast_config());
        assert!(engine.remove("ghost").await.is_ok());
    }

    #[tokio::test]
    async fn search_empty_store_returns_empty_outcome() {
        let engine = engine(TableEmbedder::new(), fast_config());
        let outcome = engine.search("anything", 3).await;
        assert_eq!(outcome.context, "");
        assert!(outcome.sources.is_empty());
        assert_eq!(outcome.relevance_score, 0.0);
    }

    #[tokio::test]
    async fn search_embedding_failure_returns_empty_outcome() {
        let engine = engine(TableEmbedder::new().failing_on("query"), fast_config());
        engine
            .ingest("doc-1", "Doc", "some content", "upload", "notes")
            .await
            .unwrap();

        let outcome = engine.search("query text", 3).await;
        assert!(outcome.is_empty());
    }

    #[tokio::test]
    async fn rank_returns_top_k_in_descending_order() {
        let embedder = TableEmbedder::new()
            .with("the query", vec![1.0, 0.0])
            .with("exact match", vec![1.0, 0.0])
            .with("close match", vec![0.9, 0.1])
            .with("orthogonal", vec![0.0, 1.0])
            .with("opposite", vec![-1.0, 0.0])
            .with("diagonal", vec![0.5, 0.5]);
        let engine = engine(embedder, fast_config());
        for (id, text) in [
            ("d1", "exact match"),
            ("d2", "close match"),
            ("d3", "orthogonal"),
            ("d4", "opposite"),
            ("d5", "diagonal"),
        ] {
            engine.ingest(id, id, text, "upload", "notes").await.unwrap();
        }

        let results = engine.rank("the query", 2).await;
        assert_eq!(results.len(), 2);
        assert!(results[0].score >= results[1].score);
        assert_eq!(results[0].entry.text, "exact match");
        assert_eq!(results[1].entry.text, "close match");
    }

    #[tokio::test]
    async fn search_assembles_context_sources_and_relevance() {
        let embedder = TableEmbedder::new()
            .with("q", vec![1.0, 0.0])
            .with("hit", vec![1.0, 0.0])
            .with("anti", vec![-1.0, 0.0]);
        let engine = engine(embedder, fast_config());
        engine.ingest("d1", "Title One", "hit", "src-a", "notes").await.unwrap();
        engine.ingest("d2", "Title Two", "anti", "src-b", "notes").await.unwrap();

        let outcome = engine.search("q", 2).await;
        assert!(outcome.context.starts_with("[Title One]\nhit"));
        assert!(outcome.context.contains("\n\n---\n\n"));
        assert_eq!(outcome.sources.len(), 2);
        assert_eq!(outcome.sources[0].title, "Title One");
        // (1.0 + max(0, -1.0)) / 2
        assert!((outcome.relevance_score - 0.5).abs() < 1e-6);
    }

    #[tokio::test]
    async fn search_dedupes_sources_by_composite_key() {
        let embedder = TableEmbedder::new().with("q", vec![1.0, 1.0]);
        let engine = engine(embedder, fast_config());
        // Same title+source across two documents
        engine.ingest("d1", "Shared", "alpha", "src", "notes").await.unwrap();
        engine.ingest("d2", "Shared", "beta", "src", "notes").await.unwrap();

        let outcome = engine.search("q", 5).await;
        assert_eq!(outcome.sources.len(), 1);
    }
}
