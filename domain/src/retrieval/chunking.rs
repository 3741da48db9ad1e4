//! Document chunking.
//!
//! One configurable strategy with two modes. Both guarantee that no
//! produced chunk is empty or whitespace-only.

use serde::{Deserialize, Serialize};

/// Chunking strategy applied at ingestion time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChunkingPolicy {
    /// Overlapping character windows: chunks start at 0, W−O, 2(W−O), …
    /// until the input is exhausted. `overlap` must be smaller than
    /// `window`; a degenerate configuration is clamped to a step of 1.
    FixedWindow { window: usize, overlap: usize },
    /// Greedy paragraph packing: split on blank lines, append paragraphs
    /// into the running chunk until the next one would exceed `max_chunk`,
    /// then flush. A paragraph is never split, even when it alone exceeds
    /// the maximum.
    ParagraphGreedy { max_chunk: usize },
}

impl Default for ChunkingPolicy {
    fn default() -> Self {
        ChunkingPolicy::FixedWindow {
            window: 500,
            overlap: 100,
        }
    }
}

impl ChunkingPolicy {
    /// Chunk `content` according to this policy.
    pub fn chunk(&self, content: &str) -> Vec<String> {
        match *self {
            ChunkingPolicy::FixedWindow { window, overlap } => {
                fixed_window(content, window, overlap)
            }
            ChunkingPolicy::ParagraphGreedy { max_chunk } => paragraph_greedy(content, max_chunk),
        }
    }
}

fn fixed_window(content: &str, window: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = content.chars().collect();
    if chars.is_empty() || window == 0 {
        return Vec::new();
    }
    let step = window.saturating_sub(overlap).max(1);

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + window).min(chars.len());
        let chunk: String = chars[start..end].iter().collect();
        let trimmed = chunk.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }
        start += step;
    }
    chunks
}

fn paragraph_greedy(content: &str, max_chunk: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for paragraph in content.split("\n\n") {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            continue;
        }
        let added_len = if current.is_empty() {
            paragraph.chars().count()
        } else {
            current.chars().count() + 2 + paragraph.chars().count()
        };
        if !current.is_empty() && added_len > max_chunk {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(paragraph);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
