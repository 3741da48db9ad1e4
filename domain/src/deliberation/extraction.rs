//! Field extraction from generated prose.
//!
//! These functions pull structured fields out of free-form model responses.
//! They are pure domain logic — no I/O, no session management, just text
//! pattern matching. A parse failure is never an error: every function
//! resolves to a documented default so the deliberation can always proceed.
//!
//! # Functions
//!
//! | Function | Field | Default |
//! |----------|-------|---------|
//! | [`parse_confidence`] | `confidence: NN%` | 0.7 |
//! | [`parse_reasoning`] | `reasoning: …` segment | first ~200 chars |
//! | [`parse_review_score`] | `score: N/10` | 5.0, flagged unparsed |
//! | [`parse_strengths`] / [`parse_weaknesses`] | labelled excerpt | None |

use crate::util::truncate_chars;

/// Confidence assumed when a response carries no confidence pattern.
pub const DEFAULT_CONFIDENCE: f32 = 0.7;

/// Neutral score used when an evaluation carries no score pattern.
pub const NEUTRAL_REVIEW_SCORE: f32 = 5.0;

const REASONING_BUDGET: usize = 200;
const SEGMENT_BUDGET: usize = 200;

/// Parse a self-reported confidence from a response.
///
/// Looks for a `confidence: NN%` line (case-insensitive; a bare fraction
/// like `confidence: 0.85` is also accepted). Returns [`DEFAULT_CONFIDENCE`]
/// when no pattern is found; the result is clamped to [0, 1].
pub fn parse_confidence(text: &str) -> f32 {
    for line in text.lines() {
        if let Some((value, percent)) = labeled_number(line, "confidence") {
            let fraction = if percent || value > 1.0 {
                value / 100.0
            } else {
                value
            };
            return fraction.clamp(0.0, 1.0);
        }
    }
    DEFAULT_CONFIDENCE
}

/// Parse the reasoning excerpt from a response.
///
/// Captures the segment following a `reasoning:` label (up to the next
/// blank line, truncated); falls back to the first ~200 characters of the
/// response when no label is present.
pub fn parse_reasoning(text: &str) -> String {
    if let Some(pos) = find_label(text, "reasoning") {
        let rest = &text[pos + "reasoning".len()..];
        let rest = rest.trim_start_matches(|c: char| c == ':' || c == '=' || c.is_whitespace());
        let segment = rest.split("\n\n").next().unwrap_or(rest).trim();
        if !segment.is_empty() {
            return truncate_chars(segment, REASONING_BUDGET);
        }
    }
    truncate_chars(text.trim(), REASONING_BUDGET)
}

/// Parse a 0-10 review score from an evaluation.
///
/// Supports, in order of preference:
/// 1. JSON: `{"score": 8, ...}`
/// 2. Fraction token: `7/10` (with or without a `Score:` label)
/// 3. Labelled number: `score: 8`
///
/// Returns `(score clamped to [0, 10], true)` on a successful parse and
/// `(`[`NEUTRAL_REVIEW_SCORE`]`, false)` when nothing matched — the flag
/// lets callers distinguish parser fallback from a genuine 5/10.
pub fn parse_review_score(text: &str) -> (f32, bool) {
    // JSON candidate first
    if let Some(start) = text.find('{')
        && let Some(end) = text[start..].rfind('}')
    {
        let json_str = &text[start..start + end + 1];
        if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(json_str)
            && let Some(score) = parsed.get("score").and_then(|v| v.as_f64())
        {
            return ((score as f32).clamp(0.0, 10.0), true);
        }
    }

    // "N/10" token, possibly wrapped in punctuation
    for word in text.split_whitespace() {
        let word = word.trim_matches(|c: char| !c.is_ascii_digit() && c != '/');
        if let Some(num_str) = word.strip_suffix("/10")
            && let Ok(num) = num_str.parse::<f32>()
        {
            return (num.clamp(0.0, 10.0), true);
        }
    }

    // "score:" label followed by a bare number
    if let Some((value, _)) = labeled_number(text, "score") {
        return (value.clamp(0.0, 10.0), true);
    }

    (NEUTRAL_REVIEW_SCORE, false)
}

/// Display-only strengths excerpt; not used in scoring.
pub fn parse_strengths(text: &str) -> Option<String> {
    labeled_segment(text, "strengths")
}

/// Display-only weaknesses excerpt; not used in scoring.
pub fn parse_weaknesses(text: &str) -> Option<String> {
    labeled_segment(text, "weaknesses")
}

/// Byte offset of a case-insensitive ASCII label match.
fn find_label(text: &str, label: &str) -> Option<usize> {
    let text_bytes = text.as_bytes();
    let label_bytes = label.as_bytes();
    if label_bytes.is_empty() || text_bytes.len() < label_bytes.len() {
        return None;
    }
    (0..=text_bytes.len() - label_bytes.len())
        .find(|&i| text_bytes[i..i + label_bytes.len()].eq_ignore_ascii_case(label_bytes))
}

/// Number immediately following `label` (after `:`/`=` separators).
///
/// Returns the value and whether it was suffixed with `%`.
fn labeled_number(text: &str, label: &str) -> Option<(f32, bool)> {
    let pos = find_label(text, label)?;
    let rest = &text[pos + label.len()..];
    let rest = rest.trim_start_matches(|c: char| c == ':' || c == '=' || c == ' ' || c == '\t');

    let mut end = 0;
    for (i, c) in rest.char_indices() {
        if c.is_ascii_digit() || c == '.' {
            end = i + c.len_utf8();
        } else {
            break;
        }
    }
    if end == 0 {
        return None;
    }
    let value: f32 = rest[..end].parse().ok()?;
    let percent = rest[end..].starts_with('%');
    Some((value, percent))
}

/// Segment following `label`: the rest of the label's line, or the bullet
/// list below it when the label stands alone.
fn labeled_segment(text: &str, label: &str) -> Option<String> {
    let pos = find_label(text, label)?;
    let rest = &text[pos + label.len()..];
    let rest = rest.trim_start_matches(|c: char| c == ':' || c == '=' || c == ' ' || c == '\t');

    let mut lines = rest.lines();
    let first = lines.next().unwrap_or("").trim();
    if !first.is_empty() {
        return Some(truncate_chars(first, SEGMENT_BUDGET));
    }

    let mut bullets = Vec::new();
    for line in lines {
        let trimmed = line.trim();
        if let Some(item) = trimmed
            .strip_prefix('-')
            .or_else(|| trimmed.strip_prefix('*'))
        {
            bullets.push(item.trim().to_string());
        } else if !bullets.is_empty() || !trimmed.is_empty() {
            break;
        }
    }
    if bullets.is_empty() {
        None
    } else {
        Some(truncate_chars(&bullets.join("; "), SEGMENT_BUDGET))
    }
}
