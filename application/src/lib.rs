//! Application layer for llm-council
//!
//! This crate contains use cases, port definitions, and application
//! configuration. It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{DeliberationConfig, RetrievalConfig};
pub use ports::{
    embedding_gateway::{EmbeddingError, EmbeddingGateway},
    generation_gateway::{GenerationGateway, GenerationOptions, ProviderError, StreamHandle},
    progress::{DeliberationProgress, NoProgress},
    retrieval_store::{DocumentStore, StoreError, VectorStore},
};
pub use use_cases::deliberate::{
    Deliberation, DeliberationError, DeliberateInput, SYNTHESIS_FALLBACK,
};
pub use use_cases::retrieval::{IngestSummary, RetrievalEngine};
