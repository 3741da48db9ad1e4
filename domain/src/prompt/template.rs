//! Prompt templates for each deliberation stage

use crate::council::member::Member;

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    /// System prompt for a member in the gathering phase, framing the
    /// persona around its configured prompt.
    pub fn member_system(member: &Member) -> String {
        format!(
            r#"You are {persona}, participating in a panel deliberation. Your role: {role}.

{prompt}

Answer the question from your own perspective. End your response with two lines:
Confidence: NN%
Reasoning: one sentence explaining your confidence"#,
            persona = member.persona_name,
            role = member.role,
            prompt = member.system_prompt,
        )
    }

    /// User prompt for the gathering phase, optionally grounded in
    /// retrieved reference material.
    pub fn gathering_prompt(query: &str, rag_context: Option<&str>) -> String {
        match rag_context {
            Some(context) if !context.trim().is_empty() => format!(
                r#"Reference material retrieved for this question:

{context}

Using the reference material where relevant, answer the following question:

{query}"#,
            ),
            _ => format!(
                r#"Please answer the following question:

{query}"#,
            ),
        }
    }

    /// System prompt for the peer review phase
    pub fn review_system() -> &'static str {
        r#"You are a critical reviewer evaluating another panelist's answer.
Assess accuracy, completeness, and clarity. Be fair but thorough: identify
both strengths and weaknesses, and ground your critique in the original
question rather than in style preferences."#
    }

    /// User prompt asking one member to critique one target answer
    pub fn review_prompt(query: &str, target_name: &str, target_text: &str) -> String {
        format!(
            r#"Original question: {query}

Answer given by {target_name}:

--- begin answer ---
{target_text}
--- end answer ---

Review this answer. Provide:
Strengths: what the answer gets right
Weaknesses: what it misses or gets wrong
Then end with a final line of the form:
Score: N/10"#,
        )
    }

    /// System prompt for the synthesis phase
    pub fn synthesis_system() -> &'static str {
        r#"You are the moderator of a panel deliberation, synthesizing the
panelists' answers and their peer reviews into one conclusion.
Identify consensus, weigh disagreements by how well they are supported,
and produce a single unified answer. Be balanced and objective."#
    }

    /// User prompt for synthesis, built from truncated member summaries
    /// and the highest-scored reviews.
    pub fn synthesis_prompt(
        query: &str,
        responses: &[(String, String)],
        reviews: &[(String, String)],
    ) -> String {
        let mut prompt = format!(
            r#"Original question: {query}

Panelist answers (summarized):
"#,
        );

        for (name, summary) in responses {
            prompt.push_str(&format!("\n--- {} ---\n{}\n", name, summary));
        }

        if !reviews.is_empty() {
            prompt.push_str("\nTop peer reviews:\n");
            for (label, excerpt) in reviews {
                prompt.push_str(&format!("\n--- {} ---\n{}\n", label, excerpt));
            }
        }

        prompt.push_str(
            r#"
Reconcile these perspectives into one unified answer to the original
question. Where panelists disagree, state which position is better
supported and why."#,
        );

        prompt
    }
}
