//! Deliberation value objects - immutable result types for a council run.
//!
//! These types represent the outputs of each phase:
//! - [`MemberResponse`] - one member's answer from the Gathering phase
//! - [`PeerReview`] - one member's critique of another member's answer
//! - [`ConsensusResult`] - terminal result covering all phases

use super::extraction;
use serde::{Deserialize, Serialize};

/// Response from a single member in the gathering phase.
///
/// `confidence` and `reasoning` are derived by parsing the response text;
/// they are never authoritative provider fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberResponse {
    /// Id of the member that produced this response
    pub member_id: String,
    /// Persona name, for transcripts and display
    pub member_name: String,
    /// The full response text (or an error sentinel for degraded entries)
    pub response_text: String,
    /// Self-reported confidence in [0, 1], parsed from the text
    pub confidence: f32,
    /// Short reasoning excerpt parsed from the text
    pub reasoning: String,
    /// Whether the member's generation call succeeded
    pub success: bool,
}

impl MemberResponse {
    /// Build a response from a successful generation call, deriving the
    /// confidence and reasoning fields from the text.
    pub fn answered(
        member_id: impl Into<String>,
        member_name: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        let text = text.into();
        let confidence = extraction::parse_confidence(&text);
        let reasoning = extraction::parse_reasoning(&text);
        Self {
            member_id: member_id.into(),
            member_name: member_name.into(),
            response_text: text,
            confidence,
            reasoning,
            success: true,
        }
    }

    /// Build the degraded sentinel for a member whose call failed.
    ///
    /// Zero confidence marks the entry as a signal, not a delivery
    /// failure; the member set stays complete for later phases.
    pub fn degraded(
        member_id: impl Into<String>,
        member_name: impl Into<String>,
        error: impl std::fmt::Display,
    ) -> Self {
        Self {
            member_id: member_id.into(),
            member_name: member_name.into(),
            response_text: format!("Error: {}", error),
            confidence: 0.0,
            reasoning: "Unable to process".to_string(),
            success: false,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}

/// Peer review of one member's response by another member.
///
/// At most N·(N−1) reviews exist for N members; fewer only when review
/// calls failed (failed pairs are omitted, never substituted).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerReview {
    /// Member that performed the review
    pub reviewer_id: String,
    /// Member whose response was reviewed
    pub target_member_id: String,
    /// Full evaluation text
    pub evaluation_text: String,
    /// Numeric score in [0, 10], parsed from the text
    pub score: f32,
    /// False when the score fell back to the neutral default because no
    /// score pattern was found in the evaluation text
    pub score_parsed: bool,
    /// Display-only strengths excerpt, not used in scoring
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strengths: Option<String>,
    /// Display-only weaknesses excerpt, not used in scoring
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weaknesses: Option<String>,
}

impl PeerReview {
    /// Build a review from an evaluation text, deriving score and the
    /// display excerpts.
    pub fn from_evaluation(
        reviewer_id: impl Into<String>,
        target_member_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        let text = text.into();
        let (score, score_parsed) = extraction::parse_review_score(&text);
        let strengths = extraction::parse_strengths(&text);
        let weaknesses = extraction::parse_weaknesses(&text);
        Self {
            reviewer_id: reviewer_id.into(),
            target_member_id: target_member_id.into(),
            evaluation_text: text,
            score,
            score_parsed,
            strengths,
            weaknesses,
        }
    }
}

/// Terminal result of one deliberation run.
///
/// Always complete and well-formed: degraded members and omitted reviews
/// are visible in the data, never as an error. Created and returned within
/// one `process_query` call; not cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusResult {
    /// The original query
    pub query: String,
    /// Persona names of the participating members
    pub members: Vec<String>,
    /// Phase 1: exactly one entry per roster member
    pub initial_responses: Vec<MemberResponse>,
    /// Phase 2: up to N·(N−1) reviews in pair-enumeration order
    pub peer_reviews: Vec<PeerReview>,
    /// Phase 3: the unified answer (or the documented fallback sentence)
    pub synthesis_text: String,
    /// Phase 4: aggregate score in [0, 1]
    pub consensus_score: f32,
    /// Wall-clock duration of the run in milliseconds
    pub execution_time_ms: u64,
}

impl ConsensusResult {
    /// Iterate over the responses whose generation call succeeded.
    pub fn answered_responses(&self) -> impl Iterator<Item = &MemberResponse> {
        self.initial_responses.iter().filter(|r| r.success)
    }

    /// Iterate over the degraded (failed-call) responses.
    pub fn degraded_responses(&self) -> impl Iterator<Item = &MemberResponse> {
        self.initial_responses.iter().filter(|r| !r.success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answered_derives_fields() {
        let response = MemberResponse::answered(
            "analyst",
            "The Analyst",
            "The answer is 42.\nConfidence: 85%\nReasoning: arithmetic checks out.",
        );
        assert!(response.success);
        assert!((response.confidence - 0.85).abs() < 1e-6);
        assert!(response.reasoning.contains("arithmetic"));
    }

    #[test]
    fn test_degraded_shape() {
        let response = MemberResponse::degraded("skeptic", "The Skeptic", "connection refused");
        assert!(!response.success);
        assert_eq!(response.confidence, 0.0);
        assert_eq!(response.reasoning, "Unable to process");
        assert_eq!(response.response_text, "Error: connection refused");
    }

    #[test]
    fn test_review_from_evaluation() {
        let review = PeerReview::from_evaluation(
            "skeptic",
            "analyst",
            "Solid answer overall.\nStrengths: clear structure\nWeaknesses: no sources\nScore: 7/10",
        );
        assert_eq!(review.score, 7.0);
        assert!(review.score_parsed);
        assert!(review.strengths.is_some());
        assert!(review.weaknesses.is_some());
    }

    #[test]
    fn test_review_unparsable_score_flagged() {
        let review = PeerReview::from_evaluation("a", "b", "I have no numeric opinion.");
        assert_eq!(review.score, 5.0);
        assert!(!review.score_parsed);
    }

    #[test]
    fn test_result_response_partition() {
        let result = ConsensusResult {
            query: "q".to_string(),
            members: vec!["A".to_string(), "B".to_string()],
            initial_responses: vec![
                MemberResponse::answered("a", "A", "fine"),
                MemberResponse::degraded("b", "B", "boom"),
            ],
            peer_reviews: vec![],
            synthesis_text: "s".to_string(),
            consensus_score: 0.5,
            execution_time_ms: 10,
        };
        assert_eq!(result.answered_responses().count(), 1);
        assert_eq!(result.degraded_responses().count(), 1);
    }
}
