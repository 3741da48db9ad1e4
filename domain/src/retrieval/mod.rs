//! Retrieval types: documents, vector entries, chunking, similarity

pub mod chunking;
pub mod document;
pub mod similarity;
pub mod vector;

pub use chunking::ChunkingPolicy;
pub use document::Document;
pub use similarity::cosine_similarity;
pub use vector::{ChunkMetadata, SearchOutcome, SearchResult, SourceRef, VectorEntry};
