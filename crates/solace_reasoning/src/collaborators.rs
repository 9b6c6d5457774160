//! External collaborators consumed by the orchestrator.
//!
//! None of these are implemented by the pipeline itself; `providers` holds
//! the in-tree implementations (offline mock, Ollama).

use crate::api_types::{HandlerResponse, MessageAnalysis, Synthesis};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;

#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Score a message on the signals the pipeline reacts to.
    async fn analyze(&self, message: &str) -> Result<MessageAnalysis>;
}

#[async_trait]
pub trait Responder: Send + Sync {
    /// Produce one participant's response. Called concurrently for every
    /// selected handler of a turn.
    async fn respond(&self, message: &str, handler_id: &str) -> Result<HandlerResponse>;
}

#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Merge the gathered responses into the final reply.
    async fn synthesize(
        &self,
        analysis: &MessageAnalysis,
        responses: &BTreeMap<String, HandlerResponse>,
    ) -> Result<Synthesis>;
}
