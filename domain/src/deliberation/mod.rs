//! Deliberation types: phases, results, extraction, and scoring

pub mod extraction;
pub mod phase;
pub mod scoring;
pub mod value_objects;

pub use phase::DeliberationPhase;
pub use value_objects::{ConsensusResult, MemberResponse, PeerReview};
