//! Deliberation phases

use serde::{Deserialize, Serialize};

/// Phase of a deliberation run
///
/// Phases advance strictly forward: Gathering → Reviewing → Synthesizing →
/// Scoring. There are no retries between phases and no backward
/// transitions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeliberationPhase {
    /// All members answer the query concurrently
    Gathering,
    /// Every member critiques every other member's answer
    Reviewing,
    /// One call reconciles all responses and reviews into a unified answer
    Synthesizing,
    /// Pure aggregation of confidences and review scores
    Scoring,
}

impl DeliberationPhase {
    pub fn as_str(&self) -> &str {
        match self {
            DeliberationPhase::Gathering => "gathering",
            DeliberationPhase::Reviewing => "reviewing",
            DeliberationPhase::Synthesizing => "synthesizing",
            DeliberationPhase::Scoring => "scoring",
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            DeliberationPhase::Gathering => "Gathering",
            DeliberationPhase::Reviewing => "Peer Review",
            DeliberationPhase::Synthesizing => "Synthesis",
            DeliberationPhase::Scoring => "Scoring",
        }
    }
}

impl std::fmt::Display for DeliberationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
