//! Consensus scoring.
//!
//! Pure aggregation of the two heterogeneous signals a deliberation
//! produces: self-reported member confidences (0-1) and peer-review scores
//! (0-10). The weights and the variance normalizer are fixed design
//! constants.

use super::value_objects::{MemberResponse, PeerReview};

/// Weight of the mean member confidence.
pub const CONFIDENCE_WEIGHT: f32 = 0.3;
/// Weight of the mean peer-review score (rescaled to 0-1).
pub const REVIEW_WEIGHT: f32 = 0.4;
/// Weight of the review-agreement term.
pub const AGREEMENT_WEIGHT: f32 = 0.3;
/// Half the 0-10 review scale; normalizes the score standard deviation.
pub const VARIANCE_NORMALIZER: f32 = 5.0;

/// Combine member confidences and peer-review scores into one scalar
/// in [0, 1].
///
/// Returns exactly 0 when either input is empty — a signal the caller can
/// distinguish from a low-but-computed score.
pub fn consensus_score(responses: &[MemberResponse], reviews: &[PeerReview]) -> f32 {
    if responses.is_empty() || reviews.is_empty() {
        return 0.0;
    }

    let avg_confidence =
        responses.iter().map(|r| r.confidence).sum::<f32>() / responses.len() as f32;

    let avg_review = reviews.iter().map(|r| r.score).sum::<f32>() / reviews.len() as f32;

    let variance = reviews
        .iter()
        .map(|r| (r.score - avg_review).powi(2))
        .sum::<f32>()
        / reviews.len() as f32;

    let agreement = (1.0 - variance.sqrt() / VARIANCE_NORMALIZER).max(0.0);

    let score = CONFIDENCE_WEIGHT * avg_confidence
        + REVIEW_WEIGHT * (avg_review / 10.0)
        + AGREEMENT_WEIGHT * agreement;

    score.clamp(0.0, 1.0)
}
