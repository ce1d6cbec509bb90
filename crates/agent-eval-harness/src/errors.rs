use agent_eval_dispatch::DispatchError;

/// Top-level error type for the harness API.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// Cassette fixture could not be read or parsed.
    #[error("cassette error: {0}")]
    Cassette(String),
    /// A dispatcher run failed with a non-recoverable error.
    #[error(transparent)]
    Run(#[from] DispatchError),
}
