//! Council member entity

use crate::core::model::Model;
use serde::{Deserialize, Serialize};

/// A deliberation member: one persona-bound generation configuration.
///
/// Members are immutable and defined by the roster at startup. Each member
/// answers the query independently and reviews every other member's answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    /// Stable identifier, unique within the roster
    pub id: String,
    /// Display name of the persona (e.g. "The Skeptic")
    pub persona_name: String,
    /// Short role description shown in transcripts
    pub role: String,
    /// Persona-specific system prompt
    pub system_prompt: String,
    /// Model binding this member generates with
    pub model: Model,
    /// Sampling temperature for this member's calls
    pub temperature: f32,
}

impl Member {
    pub fn new(
        id: impl Into<String>,
        persona_name: impl Into<String>,
        role: impl Into<String>,
        system_prompt: impl Into<String>,
        model: Model,
        temperature: f32,
    ) -> Self {
        Self {
            id: id.into(),
            persona_name: persona_name.into(),
            role: role.into(),
            system_prompt: system_prompt.into(),
            model,
            temperature,
        }
    }
}

impl std::fmt::Display for Member {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.persona_name, self.model)
    }
}
