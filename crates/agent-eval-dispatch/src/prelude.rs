//! Common imports for typical dispatcher usage.
pub use crate::{
    ArgMap, DispatchError, Dispatcher, EngineError, EngineEvent, EngineEventStream,
    ExecutionEngine, NoopSink, RunMarker, RunRequest, RunSink, RunTurn, SinkError,
};
