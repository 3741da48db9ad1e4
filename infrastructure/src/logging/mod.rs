//! Logging adapters

pub mod transcript;

pub use transcript::JsonlTranscriptLogger;
