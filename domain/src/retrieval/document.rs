//! Document entity owned by the retrieval engine

use crate::util::now_millis;
use serde::{Deserialize, Serialize};

/// A document in the private collection (Entity)
///
/// Created on ingestion, replaced by re-ingestion under the same id,
/// destroyed by explicit removal (which cascades to its vector entries).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub content: String,
    pub source: String,
    pub category: String,
    /// Milliseconds since the Unix epoch
    pub uploaded_at: u64,
}

impl Document {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        source: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            source: source.into(),
            category: category.into(),
            uploaded_at: now_millis(),
        }
    }
}
