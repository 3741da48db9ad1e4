//! Infrastructure layer for llm-council
//!
//! Adapters implementing the application-layer ports: the HTTP generation
//! and embedding provider, in-memory and JSONL-file stores, the figment
//! configuration loader, and the deliberation transcript logger.

pub mod config;
pub mod logging;
pub mod providers;
pub mod store;

// Re-export commonly used types
pub use config::{ConfigLoader, FileConfig};
pub use logging::JsonlTranscriptLogger;
pub use providers::OpenAiCompatibleGateway;
pub use store::{
    InMemoryDocumentStore, InMemoryVectorStore, JsonlDocumentStore, JsonlVectorStore,
};
