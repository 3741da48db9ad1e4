//! Application configuration types
//!
//! Plain structs handed to the use cases by the composition root. The
//! file-format counterparts live in the infrastructure layer.

use council_domain::{ChunkingPolicy, Model};
use std::time::Duration;

/// Tunables for the deliberation orchestrator
#[derive(Debug, Clone)]
pub struct DeliberationConfig {
    /// Bounded wait applied to every external call; one unresponsive
    /// provider must not stall the whole deliberation
    pub request_timeout: Duration,
    /// Maximum concurrent peer-review calls
    pub review_concurrency: usize,
    /// Token budget per generation call
    pub max_tokens: u32,
    /// Model used for the synthesis call; defaults to the first roster
    /// member's binding
    pub synthesizer: Option<Model>,
}

impl Default for DeliberationConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(60),
            review_concurrency: 4,
            max_tokens: 1024,
            synthesizer: None,
        }
    }
}

/// Tunables for the retrieval engine
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Chunking strategy applied at ingestion
    pub chunking: ChunkingPolicy,
    /// Pacing delay between consecutive embedding calls during ingestion,
    /// respecting provider throughput limits
    pub embed_delay: Duration,
    /// Default number of results returned by search
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chunking: ChunkingPolicy::default(),
            embed_delay: Duration::from_millis(100),
            top_k: 5,
        }
    }
}
