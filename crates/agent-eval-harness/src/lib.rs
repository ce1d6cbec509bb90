//! Case runner for agent tool-use evaluation.
//!
//! Ties the streaming run dispatcher and the assignment-based evaluator
//! together: each [`EvalCase`] is driven through a fresh dispatcher with a
//! [`RecordingSink`], the observed tool calls and final answer are scored,
//! and the outcome lands in a [`CaseReport`]. Cassette fixtures and the
//! answer judge are deliberately simple collaborators.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use agent_eval_harness::prelude::*;
//! use agent_eval_metrics::{Expected, ExpectedToolCall};
//!
//! # async fn demo(engine: Arc<dyn agent_eval_dispatch::ExecutionEngine>) {
//! init_observability();
//!
//! let runner = CaseRunner::new(engine);
//! let case = EvalCase::new("users-list", "List all users")
//!     .expect_call(ExpectedToolCall::new("users", "list").with_arg("limit", Expected::any()))
//!     .expect_answer("users");
//!
//! let report = runner.run_case(&case).await;
//! println!("{}: passed={}", report.case_name, report.passed());
//! # }
//! ```

/// Evaluation case definitions.
pub mod case;
/// Deterministic recorded-response fixtures.
pub mod cassette;
/// Public error types used by the harness API.
pub mod errors;
/// Trivial answer-containment judge.
pub mod judge;
/// Process-wide tracing setup.
pub mod observability;
/// Common imports for typical usage.
pub mod prelude;
/// Sink that records dispatcher callbacks.
pub mod recording;
/// Bounded-concurrency case runner.
pub mod runner;

pub use case::EvalCase;
pub use cassette::{CassetteEntry, CassetteStore};
pub use errors::HarnessError;
pub use judge::{ANSWER_ASSERTION_METRIC, ANSWER_SCORE_METRIC, AnswerJudgement, judge_answer};
pub use observability::init_observability;
pub use recording::RecordingSink;
pub use runner::{CaseReport, CaseRunner, RunnerOptions};
