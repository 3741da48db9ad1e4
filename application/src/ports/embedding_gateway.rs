//! Embedding gateway port
//!
//! The embedding dimension D is fixed by the bound provider model; this
//! core never chooses or validates it beyond length-mismatch handling in
//! similarity scoring.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from the embedding provider
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// The upstream call returned a non-success status
    #[error("Embedding provider returned {status}: {body}")]
    Api { status: u16, body: String },

    /// The request never produced a response
    #[error("Transport error: {0}")]
    Transport(String),

    /// The call succeeded but carried no embedding
    #[error("Embedding provider returned no vector")]
    EmptyResponse,
}

/// Gateway for embedding calls
#[async_trait]
pub trait EmbeddingGateway: Send + Sync {
    /// Embed one text into a provider-dimensioned vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}
