//! Vector index value objects

use serde::{Deserialize, Serialize};

/// Provenance carried alongside each indexed chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub title: String,
    pub source: String,
    pub category: String,
}

/// One embedded chunk of a document
///
/// Many-to-one with [`Document`](super::document::Document): every entry's
/// `doc_id` references its owning document, and deleting a document removes
/// all of its entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorEntry {
    /// Store key, `"{doc_id}_{chunk_index}"`
    pub id: String,
    pub doc_id: String,
    pub chunk_index: usize,
    /// The chunk text this embedding represents
    pub text: String,
    /// Provider-fixed dimension embedding
    pub embedding: Vec<f32>,
    pub metadata: ChunkMetadata,
}

impl VectorEntry {
    pub fn new(
        doc_id: impl Into<String>,
        chunk_index: usize,
        text: impl Into<String>,
        embedding: Vec<f32>,
        metadata: ChunkMetadata,
    ) -> Self {
        let doc_id = doc_id.into();
        Self {
            id: Self::entry_id(&doc_id, chunk_index),
            doc_id,
            chunk_index,
            text: text.into(),
            embedding,
            metadata,
        }
    }

    /// Store key for a (document, chunk) pair.
    pub fn entry_id(doc_id: &str, chunk_index: usize) -> String {
        format!("{}_{}", doc_id, chunk_index)
    }
}

/// A scored entry produced by a similarity search; ephemeral.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub entry: VectorEntry,
    pub score: f32,
}

/// A unique (title, source) provenance pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub title: String,
    pub source: String,
}

/// Assembled search output handed to the deliberation caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Retrieved chunks with provenance headers, joined by a separator;
    /// empty when nothing matched
    pub context: String,
    /// Unique sources in first-seen order
    pub sources: Vec<SourceRef>,
    /// Mean of the non-negative result scores
    pub relevance_score: f32,
}

impl SearchOutcome {
    /// The documented empty result: retrieval never crashes the caller's
    /// pipeline, it degrades to this.
    pub fn empty() -> Self {
        Self {
            context: String::new(),
            sources: Vec::new(),
            relevance_score: 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.context.is_empty()
    }
}
