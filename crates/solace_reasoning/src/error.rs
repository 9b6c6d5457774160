use std::time::Duration;
use thiserror::Error;

/// Failures raised by the pipeline itself, as opposed to errors bubbling up
/// from collaborators.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("handler '{handler}' did not respond within {after:?}")]
    HandlerTimeout { handler: String, after: Duration },

    #[error("session {0} is closed")]
    SessionClosed(String),

    #[error("unknown session {0}")]
    UnknownSession(String),
}
