//! Store adapters for the retrieval ports

pub mod jsonl;
pub mod memory;

pub use jsonl::{JsonlDocumentStore, JsonlVectorStore};
pub use memory::{InMemoryDocumentStore, InMemoryVectorStore};
