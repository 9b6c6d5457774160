//! # Solace Reasoning
//!
//! The per-message orchestration pipeline: recovery and regulation
//! short-circuits, concurrent handler fan-out, synthesis and bounded
//! conversation history, plus one actor per session so a session's state
//! only ever has a single writer.

pub mod api_types;
pub mod collaborators;
pub mod context;
pub mod error;
pub mod handlers;
pub mod orchestrator;
pub mod providers;
pub mod retry;
pub mod session;

pub use api_types::{HandlerResponse, MessageAnalysis, Synthesis};
pub use collaborators::{Analyzer, Responder, Synthesizer};
pub use context::{ConversationContext, HistoryEntry, Mode, ModeTransition, TransitionCause};
pub use error::PipelineError;
pub use handlers::HandlerSet;
pub use orchestrator::{Orchestrator, Reply, ReplyKind};
pub use session::{SessionHandle, SessionManager};
