//! Deliberation orchestrator
//!
//! Runs the four-stage protocol: Gathering (parallel fan-out over all
//! members) → Peer Review (bounded-concurrency fan-out over all ordered
//! pairs) → Synthesis (one call) → Scoring (pure aggregation).
//!
//! The orchestrator never fails a request on a partial failure: per-member
//! failures become degraded responses, per-pair review failures are
//! omitted, and a synthesis failure falls back to a fixed sentence. The
//! only error it ever raises is construction-time misconfiguration.

use crate::config::DeliberationConfig;
use crate::ports::generation_gateway::{GenerationGateway, GenerationOptions, ProviderError};
use crate::ports::progress::{DeliberationProgress, NoProgress};
use council_domain::{
    ConsensusResult, CouncilRoster, DeliberationPhase, DomainError, Member, MemberResponse,
    Message, Model, PeerReview, PromptTemplate, Query, consensus_score, truncate_chars,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Returned in place of a synthesis when the synthesis call fails or the
/// run is cancelled before reaching it.
pub const SYNTHESIS_FALLBACK: &str =
    "The council could not produce a synthesized answer; the individual member responses stand on their own.";

/// Reviews carried into the synthesis transcript, highest score first.
const TOP_REVIEWS_IN_TRANSCRIPT: usize = 8;
/// Character budget for each member summary in the synthesis transcript.
const SUMMARY_BUDGET: usize = 300;
/// Character budget for each review excerpt in the synthesis transcript.
const REVIEW_EXCERPT_BUDGET: usize = 400;

/// Construction-time misconfiguration — the only error class that
/// propagates out of the orchestrator.
#[derive(Error, Debug)]
pub enum DeliberationError {
    #[error("Council roster is empty")]
    EmptyRoster,

    #[error("Invalid roster: {0}")]
    InvalidRoster(String),
}

/// Input for one deliberation run
#[derive(Debug, Clone)]
pub struct DeliberateInput {
    /// The question to deliberate
    pub query: Query,
    /// Retrieved grounding context, if the caller ran a search first
    pub rag_context: Option<String>,
}

impl DeliberateInput {
    pub fn new(query: impl Into<Query>) -> Self {
        Self {
            query: query.into(),
            rag_context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.rag_context = Some(context.into());
        self
    }
}

/// The deliberation orchestrator
pub struct Deliberation<G: GenerationGateway + 'static> {
    gateway: Arc<G>,
    roster: CouncilRoster,
    config: DeliberationConfig,
}

impl<G: GenerationGateway + 'static> Deliberation<G> {
    /// Build an orchestrator over a validated roster.
    pub fn new(
        gateway: Arc<G>,
        roster: CouncilRoster,
        config: DeliberationConfig,
    ) -> Result<Self, DeliberationError> {
        roster.validate().map_err(|e| match e {
            DomainError::EmptyRoster => DeliberationError::EmptyRoster,
            other => DeliberationError::InvalidRoster(other.to_string()),
        })?;
        Ok(Self {
            gateway,
            roster,
            config,
        })
    }

    /// Read-only roster introspection for UI/admin surfaces.
    pub fn members(&self) -> &[Member] {
        self.roster.members()
    }

    /// Run a full deliberation. Always returns a complete result.
    pub async fn process_query(&self, input: DeliberateInput) -> ConsensusResult {
        self.process_query_cancellable(input, &NoProgress, &CancellationToken::new())
            .await
    }

    /// Run a full deliberation with progress callbacks.
    pub async fn process_query_with_progress(
        &self,
        input: DeliberateInput,
        progress: &dyn DeliberationProgress,
    ) -> ConsensusResult {
        self.process_query_cancellable(input, progress, &CancellationToken::new())
            .await
    }

    /// Run a deliberation that can be aborted cooperatively.
    ///
    /// A cancelled run still returns a partial [`ConsensusResult`]: stages
    /// that already settled keep their results, later stages are skipped.
    pub async fn process_query_cancellable(
        &self,
        input: DeliberateInput,
        progress: &dyn DeliberationProgress,
        cancel: &CancellationToken,
    ) -> ConsensusResult {
        let started = Instant::now();
        let query = input.query.content().to_string();
        info!(members = self.roster.len(), "Starting deliberation");

        let responses = self
            .phase_gathering(&query, input.rag_context.as_deref(), progress, cancel)
            .await;

        let reviews = if cancel.is_cancelled() {
            debug!("Cancelled before peer review");
            Vec::new()
        } else {
            self.phase_reviewing(&query, &responses, progress, cancel)
                .await
        };

        let synthesis_text = if cancel.is_cancelled() {
            debug!("Cancelled before synthesis");
            SYNTHESIS_FALLBACK.to_string()
        } else {
            self.phase_synthesis(&query, &responses, &reviews, progress)
                .await
        };

        progress.on_phase_start(&DeliberationPhase::Scoring, 1);
        let score = consensus_score(&responses, &reviews);
        progress.on_phase_complete(&DeliberationPhase::Scoring);

        info!(
            score,
            reviews = reviews.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Deliberation complete"
        );

        ConsensusResult {
            query,
            members: self
                .roster
                .members()
                .iter()
                .map(|m| m.persona_name.clone())
                .collect(),
            initial_responses: responses,
            peer_reviews: reviews,
            synthesis_text,
            consensus_score: score,
            execution_time_ms: started.elapsed().as_millis() as u64,
        }
    }

    /// Stage 1: all members answer concurrently.
    ///
    /// "Wait for all, fail none": every call is spawned before any is
    /// awaited, and the stage completes only once all N have settled. The
    /// member set handed to later stages always has exactly N entries.
    async fn phase_gathering(
        &self,
        query: &str,
        rag_context: Option<&str>,
        progress: &dyn DeliberationProgress,
        cancel: &CancellationToken,
    ) -> Vec<MemberResponse> {
        let members = self.roster.members();
        let n = members.len();
        progress.on_phase_start(&DeliberationPhase::Gathering, n);

        let mut join_set = JoinSet::new();
        for (slot, member) in members.iter().cloned().enumerate() {
            let gateway = Arc::clone(&self.gateway);
            let messages = vec![
                Message::system(PromptTemplate::member_system(&member)),
                Message::user(PromptTemplate::gathering_prompt(query, rag_context)),
            ];
            let options = GenerationOptions {
                temperature: member.temperature,
                max_tokens: self.config.max_tokens,
                ..GenerationOptions::default()
            };
            let timeout = self.config.request_timeout;

            join_set.spawn(async move {
                let result =
                    generate_bounded(gateway.as_ref(), &member.model, &messages, options, timeout)
                        .await;
                (slot, member, result)
            });
        }

        // Index-addressed slots: no two writers share a location
        let mut slots: Vec<Option<MemberResponse>> = vec![None; n];
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    warn!("Gathering cancelled; aborting outstanding member calls");
                    join_set.abort_all();
                    break;
                }
                next = join_set.join_next() => match next {
                    None => break,
                    Some(Ok((slot, member, Ok(text)))) => {
                        debug!(member = %member.id, "Member responded");
                        progress.on_task_complete(
                            &DeliberationPhase::Gathering,
                            &member.persona_name,
                            true,
                        );
                        slots[slot] =
                            Some(MemberResponse::answered(&member.id, &member.persona_name, text));
                    }
                    Some(Ok((slot, member, Err(e)))) => {
                        warn!(member = %member.id, "Member failed: {}", e);
                        progress.on_task_complete(
                            &DeliberationPhase::Gathering,
                            &member.persona_name,
                            false,
                        );
                        slots[slot] =
                            Some(MemberResponse::degraded(&member.id, &member.persona_name, e));
                    }
                    Some(Err(e)) => {
                        warn!("Member task join error: {}", e);
                    }
                }
            }
        }

        progress.on_phase_complete(&DeliberationPhase::Gathering);

        slots
            .into_iter()
            .enumerate()
            .map(|(slot, entry)| {
                entry.unwrap_or_else(|| {
                    let member = &members[slot];
                    MemberResponse::degraded(
                        &member.id,
                        &member.persona_name,
                        "call did not complete",
                    )
                })
            })
            .collect()
    }

    /// Stage 2: every ordered (reviewer, target) pair, reviewer ≠ target.
    ///
    /// The pair enumeration is reviewer-major and reproducible; completed
    /// reviews are reassembled in that order regardless of completion
    /// order. A failed pair is omitted — no substitute record.
    async fn phase_reviewing(
        &self,
        query: &str,
        responses: &[MemberResponse],
        progress: &dyn DeliberationProgress,
        cancel: &CancellationToken,
    ) -> Vec<PeerReview> {
        let members = self.roster.members();
        let n = members.len();
        let pairs: Vec<(usize, usize)> = (0..n)
            .flat_map(|i| (0..n).filter(move |&j| j != i).map(move |j| (i, j)))
            .collect();
        progress.on_phase_start(&DeliberationPhase::Reviewing, pairs.len());

        let semaphore = Arc::new(Semaphore::new(self.config.review_concurrency.max(1)));
        let mut join_set = JoinSet::new();
        for (slot, &(reviewer_idx, target_idx)) in pairs.iter().enumerate() {
            let gateway = Arc::clone(&self.gateway);
            let semaphore = Arc::clone(&semaphore);
            let reviewer = members[reviewer_idx].clone();
            let target = members[target_idx].clone();
            let prompt = PromptTemplate::review_prompt(
                query,
                &target.persona_name,
                &responses[target_idx].response_text,
            );
            let options = GenerationOptions {
                temperature: reviewer.temperature,
                max_tokens: self.config.max_tokens,
                ..GenerationOptions::default()
            };
            let timeout = self.config.request_timeout;

            join_set.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return (
                            slot,
                            reviewer,
                            target,
                            Err(ProviderError::Transport(
                                "review scheduler closed".to_string(),
                            )),
                        );
                    }
                };
                let messages = vec![
                    Message::system(PromptTemplate::review_system()),
                    Message::user(prompt),
                ];
                let result =
                    generate_bounded(gateway.as_ref(), &reviewer.model, &messages, options, timeout)
                        .await;
                (slot, reviewer, target, result)
            });
        }

        let mut slots: Vec<Option<PeerReview>> = vec![None; pairs.len()];
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    warn!("Reviewing cancelled; aborting outstanding review calls");
                    join_set.abort_all();
                    break;
                }
                next = join_set.join_next() => match next {
                    None => break,
                    Some(Ok((slot, reviewer, target, Ok(text)))) => {
                        debug!(reviewer = %reviewer.id, target = %target.id, "Review complete");
                        progress.on_task_complete(
                            &DeliberationPhase::Reviewing,
                            &reviewer.persona_name,
                            true,
                        );
                        slots[slot] =
                            Some(PeerReview::from_evaluation(&reviewer.id, &target.id, text));
                    }
                    Some(Ok((_slot, reviewer, target, Err(e)))) => {
                        warn!(
                            reviewer = %reviewer.id,
                            target = %target.id,
                            "Review failed, omitting pair: {}", e
                        );
                        progress.on_task_complete(
                            &DeliberationPhase::Reviewing,
                            &reviewer.persona_name,
                            false,
                        );
                    }
                    Some(Err(e)) => {
                        warn!("Review task join error: {}", e);
                    }
                }
            }
        }

        progress.on_phase_complete(&DeliberationPhase::Reviewing);

        // Flatten preserves pair enumeration order; omitted pairs vanish
        slots.into_iter().flatten().collect()
    }

    /// Stage 3: one synthesis call over a bounded transcript.
    async fn phase_synthesis(
        &self,
        query: &str,
        responses: &[MemberResponse],
        reviews: &[PeerReview],
        progress: &dyn DeliberationProgress,
    ) -> String {
        progress.on_phase_start(&DeliberationPhase::Synthesizing, 1);

        let summaries: Vec<(String, String)> = responses
            .iter()
            .map(|r| {
                (
                    r.member_name.clone(),
                    truncate_chars(&r.response_text, SUMMARY_BUDGET),
                )
            })
            .collect();

        // Highest-scored reviews first; sort_by is stable, so ties keep
        // the original pairing order
        let mut ranked: Vec<&PeerReview> = reviews.iter().collect();
        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let top: Vec<(String, String)> = ranked
            .iter()
            .take(TOP_REVIEWS_IN_TRANSCRIPT)
            .map(|r| {
                let label = format!(
                    "{} on {} ({:.0}/10)",
                    r.reviewer_id, r.target_member_id, r.score
                );
                (label, truncate_chars(&r.evaluation_text, REVIEW_EXCERPT_BUDGET))
            })
            .collect();

        let synthesizer = self
            .config
            .synthesizer
            .clone()
            .unwrap_or_else(|| self.roster.members()[0].model.clone());
        let messages = vec![
            Message::system(PromptTemplate::synthesis_system()),
            Message::user(PromptTemplate::synthesis_prompt(query, &summaries, &top)),
        ];
        let options = GenerationOptions {
            max_tokens: self.config.max_tokens,
            ..GenerationOptions::default()
        };

        let text = match generate_bounded(
            self.gateway.as_ref(),
            &synthesizer,
            &messages,
            options,
            self.config.request_timeout,
        )
        .await
        {
            Ok(text) => {
                progress.on_task_complete(
                    &DeliberationPhase::Synthesizing,
                    synthesizer.as_str(),
                    true,
                );
                text
            }
            Err(e) => {
                warn!("Synthesis failed, using fallback: {}", e);
                progress.on_task_complete(
                    &DeliberationPhase::Synthesizing,
                    synthesizer.as_str(),
                    false,
                );
                SYNTHESIS_FALLBACK.to_string()
            }
        };

        progress.on_phase_complete(&DeliberationPhase::Synthesizing);
        text
    }
}

/// One generation call under the configured bounded wait.
async fn generate_bounded<G: GenerationGateway + ?Sized>(
    gateway: &G,
    model: &Model,
    messages: &[Message],
    options: GenerationOptions,
    timeout: Duration,
) -> Result<String, ProviderError> {
    match tokio::time::timeout(timeout, gateway.generate(model, messages, options)).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Scripted gateway: behavior is keyed off markers in the system
    /// prompt of each call (persona name / reviewer / moderator).
    struct ScriptedGateway {
        fail_personas: Vec<&'static str>,
        fail_reviews: bool,
        fail_synthesis: bool,
    }

    impl ScriptedGateway {
        fn reliable() -> Self {
            Self {
                fail_personas: vec![],
                fail_reviews: false,
                fail_synthesis: false,
            }
        }
    }

    #[async_trait]
    impl GenerationGateway for ScriptedGateway {
        async fn generate(
            &self,
            _model: &Model,
            messages: &[Message],
            _options: GenerationOptions,
        ) -> Result<String, ProviderError> {
            let system = &messages[0].content;

            if system.contains("moderator") {
                if self.fail_synthesis {
                    return Err(ProviderError::Transport("synthesis transport down".into()));
                }
                return Ok("Unified answer reconciling all perspectives.".to_string());
            }

            if system.contains("critical reviewer") {
                if self.fail_reviews {
                    return Err(ProviderError::Api {
                        status: 503,
                        body: "overloaded".into(),
                    });
                }
                return Ok(
                    "Strengths: clear\nWeaknesses: shallow sourcing\nScore: 8/10".to_string(),
                );
            }

            for persona in &self.fail_personas {
                if system.contains(persona) {
                    return Err(ProviderError::Api {
                        status: 500,
                        body: "upstream failure".into(),
                    });
                }
            }
            Ok("A considered answer.\nConfidence: 90%\nReasoning: the premises hold.".to_string())
        }
    }

    fn deliberation(gateway: ScriptedGateway) -> Deliberation<ScriptedGateway> {
        Deliberation::new(
            Arc::new(gateway),
            CouncilRoster::default_roster(),
            DeliberationConfig::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn full_run_produces_all_pairwise_reviews() {
        let deliberation = deliberation(ScriptedGateway::reliable());
        let result = deliberation
            .process_query(DeliberateInput::new("What is consensus?"))
            .await;

        // N·(N−1) for N = 4
        assert_eq!(result.initial_responses.len(), 4);
        assert_eq!(result.peer_reviews.len(), 12);
        assert_eq!(
            result.synthesis_text,
            "Unified answer reconciling all perspectives."
        );
        assert!(result.consensus_score > 0.0 && result.consensus_score <= 1.0);
        assert!(result.initial_responses.iter().all(|r| r.success));
    }

    #[tokio::test]
    async fn reviews_keep_pair_enumeration_order() {
        let deliberation = deliberation(ScriptedGateway::reliable());
        let result = deliberation
            .process_query(DeliberateInput::new("Order check"))
            .await;

        let ids: Vec<&str> = deliberation.members().iter().map(|m| m.id.as_str()).collect();
        let expected: Vec<(String, String)> = (0..ids.len())
            .flat_map(|i| {
                let ids = ids.clone();
                (0..ids.len())
                    .filter(move |&j| j != i)
                    .map(move |j| (ids[i].to_string(), ids[j].to_string()))
            })
            .collect();
        let actual: Vec<(String, String)> = result
            .peer_reviews
            .iter()
            .map(|r| (r.reviewer_id.clone(), r.target_member_id.clone()))
            .collect();
        assert_eq!(actual, expected);
    }

    #[tokio::test]
    async fn partial_gathering_failure_degrades_without_aborting() {
        let deliberation = deliberation(ScriptedGateway {
            fail_personas: vec!["The Skeptic", "The Theorist"],
            fail_reviews: false,
            fail_synthesis: false,
        });
        let result = deliberation
            .process_query(DeliberateInput::new("Resilience check"))
            .await;

        // Exactly 4 entries: 2 genuine, 2 degraded with confidence 0
        assert_eq!(result.initial_responses.len(), 4);
        assert_eq!(result.answered_responses().count(), 2);
        assert_eq!(result.degraded_responses().count(), 2);
        for degraded in result.degraded_responses() {
            assert_eq!(degraded.confidence, 0.0);
            assert_eq!(degraded.reasoning, "Unable to process");
            assert!(degraded.response_text.starts_with("Error:"));
        }
        // Reviewing still runs over all 4 members
        assert_eq!(result.peer_reviews.len(), 12);
    }

    #[tokio::test]
    async fn synthesis_failure_uses_fallback_and_scores_normally() {
        let deliberation = deliberation(ScriptedGateway {
            fail_personas: vec![],
            fail_reviews: false,
            fail_synthesis: true,
        });
        let result = deliberation
            .process_query(DeliberateInput::new("Fallback check"))
            .await;

        assert_eq!(result.synthesis_text, SYNTHESIS_FALLBACK);
        // Score is computed from the unaffected responses/reviews
        assert!(result.consensus_score > 0.0);
        assert_eq!(result.peer_reviews.len(), 12);
    }

    #[tokio::test]
    async fn failed_review_pairs_are_omitted() {
        let deliberation = deliberation(ScriptedGateway {
            fail_personas: vec![],
            fail_reviews: true,
            fail_synthesis: false,
        });
        let result = deliberation
            .process_query(DeliberateInput::new("Omission check"))
            .await;

        assert!(result.peer_reviews.is_empty());
        // Empty reviews means the scorer's explicit guard kicks in
        assert_eq!(result.consensus_score, 0.0);
        assert_eq!(result.initial_responses.len(), 4);
    }

    #[tokio::test]
    async fn empty_roster_is_rejected_at_construction() {
        let result = Deliberation::new(
            Arc::new(ScriptedGateway::reliable()),
            CouncilRoster::new(vec![]),
            DeliberationConfig::default(),
        );
        assert!(matches!(result, Err(DeliberationError::EmptyRoster)));
    }

    #[tokio::test]
    async fn cancelled_run_returns_partial_result() {
        let deliberation = deliberation(ScriptedGateway::reliable());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = deliberation
            .process_query_cancellable(
                DeliberateInput::new("Cancelled"),
                &NoProgress,
                &cancel,
            )
            .await;

        // Still a complete, well-formed result
        assert_eq!(result.initial_responses.len(), 4);
        assert!(result.peer_reviews.is_empty());
        assert_eq!(result.synthesis_text, SYNTHESIS_FALLBACK);
        assert_eq!(result.consensus_score, 0.0);
    }

    #[tokio::test]
    async fn rag_context_reaches_member_prompts() {
        struct ContextProbe;

        #[async_trait]
        impl GenerationGateway for ContextProbe {
            async fn generate(
                &self,
                _model: &Model,
                messages: &[Message],
                _options: GenerationOptions,
            ) -> Result<String, ProviderError> {
                let system = &messages[0].content;
                if !system.contains("moderator") && !system.contains("critical reviewer") {
                    assert!(messages[1].content.contains("[Handbook]"));
                }
                Ok("ok. Score: 7/10".to_string())
            }
        }

        let deliberation = Deliberation::new(
            Arc::new(ContextProbe),
            CouncilRoster::default_roster(),
            DeliberationConfig::default(),
        )
        .unwrap();

        let result = deliberation
            .process_query(
                DeliberateInput::new("Grounded?").with_context("[Handbook]\nGround truth."),
            )
            .await;
        assert_eq!(result.initial_responses.len(), 4);
    }
}
