//! One actor per session.
//!
//! The emotional state is mutated in place by whoever runs the pipeline, so
//! each session gets a single task that owns its `Orchestrator` and handles
//! commands one at a time. Different sessions run independently.

use crate::error::PipelineError;
use crate::orchestrator::{Orchestrator, Reply};
use anyhow::Result;
use solace_core::EmotionalState;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, RwLock};

const SESSION_QUEUE_DEPTH: usize = 32;

enum SessionCommand {
    Process {
        message: String,
        reply: oneshot::Sender<Result<Reply>>,
    },
    Recover {
        reply: oneshot::Sender<bool>,
    },
    Snapshot {
        reply: oneshot::Sender<EmotionalState>,
    },
    HistoryLen {
        reply: oneshot::Sender<usize>,
    },
}

/// Cloneable handle to a running session actor. The actor stops once every
/// handle is dropped.
#[derive(Clone)]
pub struct SessionHandle {
    id: String,
    tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn process(&self, message: impl Into<String>) -> Result<Reply> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Process {
            message: message.into(),
            reply,
        })
        .await?;
        rx.await
            .map_err(|_| PipelineError::SessionClosed(self.id.clone()))?
    }

    pub async fn recover(&self) -> Result<bool> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Recover { reply }).await?;
        Ok(rx
            .await
            .map_err(|_| PipelineError::SessionClosed(self.id.clone()))?)
    }

    pub async fn snapshot(&self) -> Result<EmotionalState> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Snapshot { reply }).await?;
        Ok(rx
            .await
            .map_err(|_| PipelineError::SessionClosed(self.id.clone()))?)
    }

    pub async fn history_len(&self) -> Result<usize> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::HistoryLen { reply }).await?;
        Ok(rx
            .await
            .map_err(|_| PipelineError::SessionClosed(self.id.clone()))?)
    }

    async fn send(&self, command: SessionCommand) -> Result<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| PipelineError::SessionClosed(self.id.clone()).into())
    }
}

fn spawn_session(id: String, mut orchestrator: Orchestrator) -> SessionHandle {
    let (tx, mut rx) = mpsc::channel(SESSION_QUEUE_DEPTH);
    let session_id = id.clone();

    tokio::spawn(async move {
        tracing::debug!(session = %session_id, "Session actor started");
        while let Some(command) = rx.recv().await {
            match command {
                SessionCommand::Process { message, reply } => {
                    let result = orchestrator.process_message(&message).await;
                    let _ = reply.send(result);
                }
                SessionCommand::Recover { reply } => {
                    let _ = reply.send(orchestrator.recover());
                }
                SessionCommand::Snapshot { reply } => {
                    let _ = reply.send(orchestrator.emotional_state().clone());
                }
                SessionCommand::HistoryLen { reply } => {
                    let _ = reply.send(orchestrator.context().history_len());
                }
            }
        }
        tracing::debug!(session = %session_id, "Session actor stopped");
    });

    SessionHandle { id, tx }
}

type OrchestratorFactory = dyn Fn() -> Orchestrator + Send + Sync;

/// Routes messages to per-session actors, spawning them on first use.
pub struct SessionManager {
    factory: Arc<OrchestratorFactory>,
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionManager {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Orchestrator + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(factory),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Get the session's handle, spawning its actor if needed.
    pub async fn open(&self, id: &str) -> SessionHandle {
        if let Some(handle) = self.sessions.read().await.get(id) {
            return handle.clone();
        }
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(id.to_string())
            .or_insert_with(|| {
                tracing::info!(session = %id, "Opening session");
                spawn_session(id.to_string(), (self.factory)())
            })
            .clone()
    }

    /// Open a session under a fresh random id.
    pub async fn open_new(&self) -> SessionHandle {
        self.open(&uuid::Uuid::new_v4().to_string()).await
    }

    pub async fn get(&self, id: &str) -> Result<SessionHandle> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| PipelineError::UnknownSession(id.to_string()).into())
    }

    pub async fn process(&self, id: &str, message: impl Into<String>) -> Result<Reply> {
        self.open(id).await.process(message).await
    }

    /// Forget a session. Its actor stops once outstanding handles are dropped.
    pub async fn close(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            tracing::info!(session = %id, "Closed session");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
