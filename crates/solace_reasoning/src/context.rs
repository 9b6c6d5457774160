//! Per-session conversation context.
//!
//! One `ConversationContext` per orchestrator, one `EmotionalState` per
//! context. History and the recovery transition log are both bounded and
//! drop their oldest entries first.

use crate::api_types::{HandlerResponse, MessageAnalysis};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use solace_core::{EmotionalState, OrchestratorConfig, RegulatorConfig};
use std::collections::{BTreeMap, VecDeque};

/// One completed turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub analysis: MessageAnalysis,
    pub responses: BTreeMap<String, HandlerResponse>,
    pub final_response: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Normal,
    Recovery,
}

impl Mode {
    fn of(state: &EmotionalState) -> Self {
        if state.recovery_mode {
            Mode::Recovery
        } else {
            Mode::Normal
        }
    }
}

/// What moved the session between modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionCause {
    /// Overload detected after analysis.
    Regulation,
    /// Overload caused by an absorbed pipeline failure.
    ErrorRecovery,
    /// Explicit recovery tick.
    Recovered,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeTransition {
    pub at: DateTime<Utc>,
    pub from: Mode,
    pub to: Mode,
    pub cause: TransitionCause,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationContext {
    pub emotional_state: EmotionalState,
    pub technical_depth: f32,
    pub creativity_needed: f32,
    pub user_expertise: f32,
    history: VecDeque<HistoryEntry>,
    pub last_responses: BTreeMap<String, HandlerResponse>,
    transitions: VecDeque<ModeTransition>,
    history_limit: usize,
    transition_limit: usize,
}

impl Default for ConversationContext {
    fn default() -> Self {
        Self::new(&RegulatorConfig::default(), &OrchestratorConfig::default())
    }
}

impl ConversationContext {
    pub fn new(regulator: &RegulatorConfig, orchestrator: &OrchestratorConfig) -> Self {
        Self {
            emotional_state: EmotionalState::from_config(regulator),
            technical_depth: 0.0,
            creativity_needed: 0.0,
            user_expertise: 0.0,
            history: VecDeque::new(),
            last_responses: BTreeMap::new(),
            transitions: VecDeque::new(),
            history_limit: orchestrator.history_limit,
            transition_limit: orchestrator.transition_limit,
        }
    }

    /// Append a turn, dropping the oldest entries beyond the limit.
    pub fn push_history(&mut self, entry: HistoryEntry) {
        self.history.push_back(entry);
        while self.history.len() > self.history_limit {
            self.history.pop_front();
        }
    }

    /// Oldest first.
    pub fn history(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn transitions(&self) -> impl Iterator<Item = &ModeTransition> {
        self.transitions.iter()
    }

    /// Run `f` on the emotional state and log a transition if it flipped
    /// the recovery flag.
    pub(crate) fn track_mode<F>(&mut self, cause: TransitionCause, f: F)
    where
        F: FnOnce(&mut EmotionalState),
    {
        let from = Mode::of(&self.emotional_state);
        f(&mut self.emotional_state);
        let to = Mode::of(&self.emotional_state);
        if from != to {
            tracing::debug!(?from, ?to, ?cause, "Mode transition");
            self.transitions.push_back(ModeTransition {
                at: Utc::now(),
                from,
                to,
                cause,
            });
            while self.transitions.len() > self.transition_limit {
                self.transitions.pop_front();
            }
        }
    }
}
