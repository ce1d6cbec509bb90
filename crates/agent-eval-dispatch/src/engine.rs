use std::pin::Pin;

use futures::Stream;

use crate::errors::EngineError;
use crate::event::EngineEvent;

/// Boxed event stream produced by an execution engine for a single run.
pub type EngineEventStream =
    Pin<Box<dyn Stream<Item = Result<EngineEvent, EngineError>> + Send + 'static>>;

/// Input for a single model-execution run.
#[derive(Clone, Debug)]
pub struct RunRequest {
    /// Identifier for this run, assigned by the dispatcher.
    pub run_id: uuid::Uuid,
    /// User prompt for this turn.
    pub prompt: String,
    /// Conversation history snapshot from the previous run, passed back
    /// verbatim. `Value::Null` on the first run of a dispatcher.
    pub history: serde_json::Value,
}

/// Adapter seam for the model-execution engine.
///
/// The engine itself is an external collaborator; implementations translate
/// their native event protocol into `EngineEvent`s. Engines must end every
/// successful run with `EngineEvent::RunCompleted`.
#[async_trait::async_trait]
pub trait ExecutionEngine: Send + Sync {
    /// Starts a run and returns its event stream.
    async fn start_run(&self, request: RunRequest) -> Result<EngineEventStream, EngineError>;
}
