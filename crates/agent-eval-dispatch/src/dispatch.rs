use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use futures::StreamExt as _;
use tracing::debug;

use crate::engine::{EngineEventStream, ExecutionEngine, RunRequest};
use crate::errors::{DispatchError, EngineError};
use crate::event::EngineEvent;
use crate::sink::{ArgMap, RunSink};

/// Progress marker yielded by `RunTurn`, one per dispatched sink callback.
#[derive(Clone, Debug, PartialEq)]
pub enum RunMarker {
    /// `on_tool_call_start` was dispatched.
    ToolCallStarted { name: String, call_id: String },
    /// `on_tool_call_end` was dispatched.
    ToolCallFinished {
        name: String,
        call_id: String,
        is_error: bool,
    },
    /// Buffered text was flushed ahead of a tool call.
    IntermediateResponse { text: String },
    /// Trailing text was flushed at run completion.
    FinalResponse { text: String },
    /// An engine behavior failure was surfaced to the sink.
    Error { message: String },
}

/// Arguments recorded at `ToolCallStarted`, re-attached when the matching
/// result arrives (the result event carries no argument payload).
struct PendingCall {
    name: String,
    args: ArgMap,
}

/// Converts a raw engine event stream into semantic sink callbacks.
///
/// A dispatcher owns the conversation history across its runs: the snapshot
/// from each `RunCompleted` replaces the previous one and is passed back
/// verbatim on the next run. Text buffering and pending-call state are
/// run-scoped, so one dispatcher must not serve overlapping runs; a harness
/// executing cases concurrently uses one dispatcher per case.
pub struct Dispatcher {
    engine: Arc<dyn ExecutionEngine>,
    history: serde_json::Value,
}

impl Dispatcher {
    /// Creates a dispatcher with no conversation history.
    pub fn new(engine: Arc<dyn ExecutionEngine>) -> Self {
        Self {
            engine,
            history: serde_json::Value::Null,
        }
    }

    /// Returns the latest conversation history snapshot.
    pub fn history(&self) -> &serde_json::Value {
        &self.history
    }

    /// Starts a run and returns its lazy marker sequence.
    ///
    /// The returned `RunTurn` borrows the dispatcher, so runs on one instance
    /// are strictly serial. Dropping the turn before it completes cancels the
    /// run; no background work is spawned.
    pub async fn run<'a, S: RunSink>(
        &'a mut self,
        prompt: impl Into<String>,
        sink: &'a mut S,
    ) -> Result<RunTurn<'a, S>, DispatchError> {
        let run_id = uuid::Uuid::new_v4();
        let request = RunRequest {
            run_id,
            prompt: prompt.into(),
            history: self.history.clone(),
        };
        debug!(run_id = %run_id, "starting dispatcher run");
        let mut queued = VecDeque::new();
        let (events, done): (EngineEventStream, bool) =
            match self.engine.start_run(request).await {
                Ok(events) => (events, false),
                // Behavior failures are recovered wherever they surface.
                Err(EngineError::Behavior { message }) => {
                    sink.on_error(&message)?;
                    queued.push_back(RunMarker::Error { message });
                    (Box::pin(futures::stream::empty()), true)
                }
                Err(err) => return Err(err.into()),
            };
        Ok(RunTurn {
            run_id,
            events,
            sink,
            history: &mut self.history,
            text_buffer: String::new(),
            pending_calls: HashMap::new(),
            queued,
            done,
        })
    }

    /// Runs a prompt to completion and returns every marker in order.
    pub async fn run_to_end<S: RunSink>(
        &mut self,
        prompt: impl Into<String>,
        sink: &mut S,
    ) -> Result<Vec<RunMarker>, DispatchError> {
        let turn = self.run(prompt, sink).await?;
        turn.drive().await
    }
}

/// Lazy, finite, non-restartable marker sequence for a single run.
pub struct RunTurn<'a, S: RunSink> {
    run_id: uuid::Uuid,
    events: EngineEventStream,
    sink: &'a mut S,
    history: &'a mut serde_json::Value,
    text_buffer: String,
    pending_calls: HashMap<String, PendingCall>,
    queued: VecDeque<RunMarker>,
    done: bool,
}

impl<'a, S: RunSink> RunTurn<'a, S> {
    /// Returns the run id for this turn.
    pub fn run_id(&self) -> uuid::Uuid {
        self.run_id
    }

    /// Pulls engine events until the next sink callback is dispatched and
    /// returns its marker, or `None` once the run has terminated.
    ///
    /// A run that produces neither text nor tool calls nor an error yields
    /// zero markers.
    pub async fn next_marker(&mut self) -> Result<Option<RunMarker>, DispatchError> {
        if let Some(marker) = self.queued.pop_front() {
            return Ok(Some(marker));
        }
        if self.done {
            return Ok(None);
        }
        loop {
            match self.events.next().await {
                Some(Ok(EngineEvent::TextStart { text }))
                | Some(Ok(EngineEvent::TextDelta { text })) => {
                    self.text_buffer.push_str(&text);
                }
                Some(Ok(EngineEvent::ToolCallStarted {
                    tool_name,
                    args,
                    call_id,
                })) => {
                    if !self.text_buffer.is_empty() {
                        let text = std::mem::take(&mut self.text_buffer);
                        self.sink.on_intermediate_response(&text)?;
                        self.queued.push_back(RunMarker::IntermediateResponse { text });
                    }
                    debug!(run_id = %self.run_id, tool = %tool_name, call_id = %call_id, "tool call started");
                    let pending = PendingCall {
                        name: tool_name,
                        args: coerce_args(args),
                    };
                    self.sink
                        .on_tool_call_start(&pending.name, &pending.args, &call_id)?;
                    self.queued.push_back(RunMarker::ToolCallStarted {
                        name: pending.name.clone(),
                        call_id: call_id.clone(),
                    });
                    self.pending_calls.insert(call_id, pending);
                    return Ok(self.queued.pop_front());
                }
                Some(Ok(EngineEvent::ToolCallFinished {
                    call_id,
                    content,
                    is_error,
                })) => {
                    let Some(pending) = self.pending_calls.remove(&call_id) else {
                        return Err(DispatchError::UnmatchedToolResult { call_id });
                    };
                    debug!(run_id = %self.run_id, tool = %pending.name, call_id = %call_id, is_error, "tool call finished");
                    self.sink.on_tool_call_end(
                        &pending.name,
                        &pending.args,
                        &content,
                        &call_id,
                        is_error,
                    )?;
                    return Ok(Some(RunMarker::ToolCallFinished {
                        name: pending.name,
                        call_id,
                        is_error,
                    }));
                }
                Some(Ok(EngineEvent::RunCompleted { history })) => {
                    *self.history = history;
                    self.done = true;
                    if self.text_buffer.is_empty() {
                        return Ok(None);
                    }
                    let text = std::mem::take(&mut self.text_buffer);
                    self.sink.on_final_response(&text)?;
                    return Ok(Some(RunMarker::FinalResponse { text }));
                }
                Some(Err(EngineError::Behavior { message })) => {
                    debug!(run_id = %self.run_id, "engine behavior failure surfaced to sink");
                    self.done = true;
                    self.sink.on_error(&message)?;
                    return Ok(Some(RunMarker::Error { message }));
                }
                Some(Err(err)) => {
                    self.done = true;
                    return Err(DispatchError::Engine(err));
                }
                None => {
                    self.done = true;
                    return Err(DispatchError::Protocol(
                        "engine stream ended without completion".into(),
                    ));
                }
            }
        }
    }

    /// Drains the sequence and returns every remaining marker in order.
    pub async fn drive(mut self) -> Result<Vec<RunMarker>, DispatchError> {
        let mut markers = Vec::new();
        while let Some(marker) = self.next_marker().await? {
            markers.push(marker);
        }
        Ok(markers)
    }
}

/// Coerces a tool-call argument payload into a mapping.
///
/// Accepts a structured mapping or a JSON-encoded string holding one; any
/// other shape, including malformed JSON, falls back to an empty mapping.
pub fn coerce_args(value: serde_json::Value) -> ArgMap {
    match value {
        serde_json::Value::Object(map) => map,
        serde_json::Value::String(raw) => match serde_json::from_str(&raw) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => ArgMap::new(),
        },
        _ => ArgMap::new(),
    }
}
