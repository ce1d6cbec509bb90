//! Streaming run dispatcher for agent tool-use evaluation.
//!
//! Consumes the raw event stream of a model-execution engine and converts it
//! into a small, stable set of semantic callbacks (tool invoked, tool
//! completed, partial text, final text, error) delivered to a [`RunSink`],
//! with correct text buffering, flush ordering, and cross-run conversation
//! history carry-over.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use agent_eval_dispatch::prelude::*;
//!
//! # async fn demo(engine: Arc<dyn ExecutionEngine>) -> Result<(), DispatchError> {
//! let mut dispatcher = Dispatcher::new(engine);
//! let mut sink = NoopSink;
//!
//! let mut turn = dispatcher.run("List all users", &mut sink).await?;
//! while let Some(marker) = turn.next_marker().await? {
//!     println!("{marker:?}");
//! }
//! # Ok(())
//! # }
//! ```

/// Dispatcher, run turn, and progress markers.
pub mod dispatch;
/// Execution-engine adapter seam.
pub mod engine;
/// Public error types used by the dispatcher API.
pub mod errors;
/// Normalized model-execution events.
pub mod event;
/// Common imports for typical usage.
pub mod prelude;
/// Sink callback contract and the trivial no-op adapter.
pub mod sink;

pub use dispatch::{Dispatcher, RunMarker, RunTurn, coerce_args};
pub use engine::{EngineEventStream, ExecutionEngine, RunRequest};
pub use errors::{DispatchError, EngineError, SinkError};
pub use event::EngineEvent;
pub use sink::{ArgMap, NoopSink, RunSink};
