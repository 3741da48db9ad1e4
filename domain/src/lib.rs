//! Domain layer for llm-council
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Council
//!
//! A council is a fixed roster of persona-bound generation members that
//! answer a query independently, critique each other's answers, and have
//! their signals folded into one consensus-scored synthesis.
//!
//! ## Retrieval
//!
//! A small in-process vector index: documents are chunked, embedded, and
//! searched exhaustively by cosine similarity to supply grounding context
//! to a deliberation.

pub mod core;
pub mod council;
pub mod deliberation;
pub mod prompt;
pub mod retrieval;
pub mod session;
pub mod util;

// Re-export commonly used types
pub use core::{error::DomainError, model::Model, query::Query};
pub use council::{member::Member, roster::CouncilRoster};
pub use deliberation::{
    extraction::{
        parse_confidence, parse_reasoning, parse_review_score, parse_strengths, parse_weaknesses,
    },
    phase::DeliberationPhase,
    scoring::consensus_score,
    value_objects::{ConsensusResult, MemberResponse, PeerReview},
};
pub use prompt::PromptTemplate;
pub use retrieval::{
    chunking::ChunkingPolicy,
    document::Document,
    similarity::cosine_similarity,
    vector::{ChunkMetadata, SearchOutcome, SearchResult, SourceRef, VectorEntry},
};
pub use session::{Message, Role, StreamEvent};
pub use util::truncate_chars;
