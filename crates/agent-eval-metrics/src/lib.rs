//! Assignment-based tool-call evaluator.
//!
//! Scores a set of observed tool invocations against a declared set of
//! expected invocations using an optimal bipartite assignment (Hungarian
//! algorithm) over a custom cost model, producing a pass/fail verdict and a
//! human-readable diagnosis. The evaluator is a pure function of its inputs:
//! no I/O, no shared state, safe to call from any number of concurrent cases.
//!
//! # Usage
//!
//! ```
//! use agent_eval_metrics::{ActualToolCall, Expected, ExpectedToolCall, evaluate_tool_calls};
//! use serde_json::json;
//!
//! let expected = vec![
//!     ExpectedToolCall::new("users", "list").with_arg("limit", Expected::from(json!(5))),
//! ];
//! let actual = vec![ActualToolCall::from_name(
//!     "users_list",
//!     serde_json::from_value(json!({"limit": 5})).unwrap(),
//! )];
//!
//! let verdict = evaluate_tool_calls(&expected, &actual, 1.0);
//! assert!(verdict.passed);
//! ```

/// Expected and actual tool-call records.
pub mod call;
/// Cost-matrix construction, assignment, classification, and scoring.
pub mod evaluate;
/// Deep-match predicate and heuristic closeness scorer.
pub mod matcher;

pub use call::{ActualToolCall, ExpectedToolCall};
pub use evaluate::{
    MetricOutcome, MetricValue, TOOLS_ASSERTION_METRIC, TOOLS_SCORE_METRIC, ToolCallEvaluation,
    evaluate_tool_calls,
};
pub use matcher::{
    Expected, ExpectedArgs, NON_MAPPING_SCORE, Predicate, match_score, matches_args, matches_value,
};
