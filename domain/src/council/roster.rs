//! Council roster (registry of members)

use super::member::Member;
use crate::core::error::DomainError;
use crate::core::model::Model;
use serde::{Deserialize, Serialize};

/// The fixed roster of council members (Entity)
///
/// Pure configuration with no behavior beyond validation: one roster per
/// deployment, read-only for the lifetime of the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouncilRoster {
    members: Vec<Member>,
}

impl CouncilRoster {
    pub fn new(members: Vec<Member>) -> Self {
        Self { members }
    }

    /// The reference four-member panel used when no roster is configured.
    pub fn default_roster() -> Self {
        Self::new(vec![
            Member::new(
                "analyst",
                "The Analyst",
                "methodical decomposition",
                "You are a rigorous analyst. Break the question down into its \
                 components, reason through each one explicitly, and state the \
                 assumptions your answer depends on.",
                Model::ClaudeSonnet45,
                0.3,
            ),
            Member::new(
                "skeptic",
                "The Skeptic",
                "critical challenge",
                "You are a professional skeptic. Probe the question for hidden \
                 assumptions, point out where the obvious answer fails, and \
                 flag anything that cannot be known with confidence.",
                Model::Gpt52,
                0.5,
            ),
            Member::new(
                "pragmatist",
                "The Pragmatist",
                "practical grounding",
                "You are a pragmatist. Favor what works in practice over what \
                 is elegant in theory, and anchor your answer in concrete, \
                 actionable terms.",
                Model::Gemini3Pro,
                0.7,
            ),
            Member::new(
                "theorist",
                "The Theorist",
                "first-principles framing",
                "You are a theorist. Place the question in its wider conceptual \
                 frame, connect it to established principles, and note where \
                 the general theory and the specific case diverge.",
                Model::ClaudeOpus45,
                0.9,
            ),
        ])
    }

    /// Validate the roster: non-empty, with non-blank ids and bindings.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.members.is_empty() {
            return Err(DomainError::EmptyRoster);
        }
        for member in &self.members {
            if member.id.trim().is_empty() {
                return Err(DomainError::InvalidMember(
                    "member id cannot be empty".to_string(),
                ));
            }
            if member.model.as_str().trim().is_empty() {
                return Err(DomainError::InvalidMember(format!(
                    "member {} has an empty model binding",
                    member.id
                )));
            }
        }
        Ok(())
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.id == id)
    }
}
