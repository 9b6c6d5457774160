//! Per-message pipeline.
//!
//! Each message either short-circuits (recovery mode on entry, or overload
//! right after analysis) or runs the full turn: analyze, update state,
//! gather handler responses concurrently, synthesize, record history. A
//! failing turn is absorbed once as extra confusion/instability; if that
//! does not tip the state into regulation the turn's error is returned.

use crate::api_types::{HandlerResponse, MessageAnalysis, Synthesis};
use crate::collaborators::{Analyzer, Responder, Synthesizer};
use crate::context::{ConversationContext, HistoryEntry, TransitionCause};
use crate::error::PipelineError;
use crate::handlers::HandlerSet;
use anyhow::Result;
use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use solace_core::{EmotionalState, OrchestratorConfig, SolaceConfig};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

pub const RECOVERY_REPLY: &str =
    "I need a moment to process and center myself. Let's take this slowly.";
pub const REGULATING_REPLY: &str =
    "I'm feeling a bit overwhelmed right now. Let me take a moment to regulate before we continue.";
pub const ERROR_RECOVERY_REPLY: &str =
    "I ran into a problem while thinking that through. Give me a moment, then could you try rephrasing?";

const CANNED_CONFIDENCE: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
    /// Session was already in recovery mode; nothing was processed.
    Recovery,
    /// Analysis pushed the state past a limit; regulation was applied.
    Regulating,
    /// A pipeline failure was absorbed into regulation.
    ErrorRecovery,
    /// Normal turn.
    Synthesized,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    pub kind: ReplyKind,
    pub final_response: String,
    pub emotional_context: String,
    pub confidence: f32,
    pub mood: String,
    /// State after the turn.
    pub state: EmotionalState,
}

/// Replies that skip synthesis.
#[derive(Debug, Clone, Copy)]
enum Canned {
    Recovery,
    Regulating,
    ErrorRecovery,
}

impl Reply {
    fn canned(canned: Canned, state: &EmotionalState) -> Self {
        let (kind, text, mood) = match canned {
            Canned::Recovery => (ReplyKind::Recovery, RECOVERY_REPLY, "recovering"),
            Canned::Regulating => (ReplyKind::Regulating, REGULATING_REPLY, "regulating"),
            Canned::ErrorRecovery => (ReplyKind::ErrorRecovery, ERROR_RECOVERY_REPLY, "recovering"),
        };
        Self {
            kind,
            final_response: text.to_string(),
            emotional_context: state.describe(),
            confidence: CANNED_CONFIDENCE,
            mood: mood.to_string(),
            state: state.clone(),
        }
    }

    fn synthesized(synthesis: Synthesis, state: &EmotionalState) -> Self {
        Self {
            kind: ReplyKind::Synthesized,
            final_response: synthesis.final_response,
            emotional_context: synthesis.emotional_context,
            confidence: synthesis.confidence,
            mood: synthesis.mood,
            state: state.clone(),
        }
    }
}

pub struct Orchestrator {
    analyzer: Arc<dyn Analyzer>,
    responder: Arc<dyn Responder>,
    synthesizer: Arc<dyn Synthesizer>,
    config: OrchestratorConfig,
    context: ConversationContext,
}

impl Orchestrator {
    pub fn new(
        analyzer: Arc<dyn Analyzer>,
        responder: Arc<dyn Responder>,
        synthesizer: Arc<dyn Synthesizer>,
        config: &SolaceConfig,
    ) -> Self {
        Self {
            analyzer,
            responder,
            synthesizer,
            config: config.orchestrator.clone(),
            context: ConversationContext::new(&config.regulator, &config.orchestrator),
        }
    }

    pub fn context(&self) -> &ConversationContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut ConversationContext {
        &mut self.context
    }

    pub fn emotional_state(&self) -> &EmotionalState {
        &self.context.emotional_state
    }

    /// Handle one user message.
    #[tracing::instrument(skip(self, message), fields(chars = message.len()))]
    pub async fn process_message(&mut self, message: &str) -> Result<Reply> {
        if self.context.emotional_state.recovery_mode {
            tracing::info!("Session in recovery mode, replying without processing");
            return Ok(Reply::canned(Canned::Recovery, &self.context.emotional_state));
        }

        match self.run_turn(message).await {
            Ok(reply) => Ok(reply),
            Err(e) => {
                self.context.emotional_state.absorb_failure();
                if self.context.emotional_state.needs_regulation() {
                    tracing::warn!("Turn failed, absorbed into regulation: {:#}", e);
                    self.context
                        .track_mode(TransitionCause::ErrorRecovery, EmotionalState::apply_regulation);
                    Ok(Reply::canned(Canned::ErrorRecovery, &self.context.emotional_state))
                } else {
                    tracing::error!("Turn failed: {:#}", e);
                    Err(e)
                }
            }
        }
    }

    /// Explicit recovery tick between turns. Returns whether the session is
    /// still in recovery mode afterwards.
    pub fn recover(&mut self) -> bool {
        let cause = if self.context.emotional_state.needs_regulation() {
            TransitionCause::Regulation
        } else {
            TransitionCause::Recovered
        };
        self.context.track_mode(cause, EmotionalState::apply_regulation);
        self.context.emotional_state.recovery_mode
    }

    async fn run_turn(&mut self, message: &str) -> Result<Reply> {
        let analysis = self.analyzer.analyze(message).await?;
        self.update_emotional_state(&analysis);

        if self.context.emotional_state.needs_regulation() {
            tracing::info!(
                state = %self.context.emotional_state.describe(),
                "Overload after analysis, regulating"
            );
            self.context
                .track_mode(TransitionCause::Regulation, EmotionalState::apply_regulation);
            return Ok(Reply::canned(Canned::Regulating, &self.context.emotional_state));
        }

        let handlers = HandlerSet::select(
            &analysis,
            &self.config.handlers,
            self.config.handler_threshold,
        );
        tracing::debug!(handlers = ?handlers.iter().collect::<Vec<_>>(), "Gathering responses");

        let responses = self.gather(message, &handlers).await?;
        self.context.last_responses = responses.clone();

        let complexity: f32 = responses.values().map(|r| r.complexity).sum();
        self.context
            .emotional_state
            .absorb_workload(responses.len(), complexity);

        let synthesis = self.synthesizer.synthesize(&analysis, &responses).await?;

        self.context.push_history(HistoryEntry {
            timestamp: chrono::Utc::now(),
            message: message.to_string(),
            analysis,
            responses,
            final_response: synthesis.final_response.clone(),
        });

        Ok(Reply::synthesized(synthesis, &self.context.emotional_state))
    }

    fn update_emotional_state(&mut self, analysis: &MessageAnalysis) {
        let level = analysis.peak_intensity();
        let state = &mut self.context.emotional_state;
        state.regulate_arousal(level, level);
        state.absorb_uncertainty(analysis.uncertainty);
        state.absorb_destabilization(analysis.destabilizing_factor);
    }

    /// Launch every handler at once and wait for all of them. The first
    /// failure (or timeout, when configured) fails the turn and drops the
    /// handlers still in flight.
    async fn gather(
        &self,
        message: &str,
        handlers: &HandlerSet,
    ) -> Result<BTreeMap<String, HandlerResponse>> {
        let deadline = self.config.handler_timeout_ms.map(Duration::from_millis);

        let calls = handlers.iter().map(|id| {
            let responder = Arc::clone(&self.responder);
            async move {
                let call = responder.respond(message, id);
                let response = match deadline {
                    Some(after) => tokio::time::timeout(after, call).await.map_err(|_| {
                        PipelineError::HandlerTimeout {
                            handler: id.to_string(),
                            after,
                        }
                    })??,
                    None => call.await?,
                };
                Ok::<_, anyhow::Error>((id.to_string(), response))
            }
        });

        Ok(try_join_all(calls).await?.into_iter().collect())
    }
}
