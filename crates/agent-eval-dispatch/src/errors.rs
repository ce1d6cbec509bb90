/// Failures reported by an execution engine.
///
/// Only the `Behavior` class is recovered by the dispatcher (surfaced to the
/// sink as an error callback); `Transport` and `Protocol` abort the run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The model misbehaved (for example exceeded its retry budget).
    #[error("model behavior failure: {message}")]
    Behavior { message: String },
    /// Transport or stream I/O failed.
    #[error("engine transport failure: {message}")]
    Transport { message: String },
    /// Event shape or sequencing from the engine was invalid.
    #[error("engine protocol failure: {message}")]
    Protocol { message: String },
}

impl EngineError {
    /// Creates a model-behavior failure.
    pub fn behavior(message: impl Into<String>) -> Self {
        Self::Behavior {
            message: message.into(),
        }
    }

    /// Creates a transport failure.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a protocol failure.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Returns the human-readable message for this failure.
    pub fn message(&self) -> &str {
        match self {
            Self::Behavior { message } | Self::Transport { message } | Self::Protocol { message } => {
                message
            }
        }
    }
}

/// Error returned by a sink callback to abort the current run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("sink aborted run: {message}")]
pub struct SinkError {
    message: String,
}

impl SinkError {
    /// Creates a sink abort with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the abort message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Top-level error type for the dispatcher API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// Non-recoverable engine failure (`Transport`/`Protocol` class).
    #[error(transparent)]
    Engine(#[from] EngineError),
    /// A sink callback aborted the run; propagated uncaught.
    #[error(transparent)]
    Sink(#[from] SinkError),
    /// A tool result arrived without a matching pending tool call.
    #[error("tool result for unknown call id: {call_id}")]
    UnmatchedToolResult { call_id: String },
    /// The dispatcher detected an event-sequencing violation.
    #[error("dispatch protocol error: {0}")]
    Protocol(String),
}
