use std::collections::BTreeMap;
use std::sync::Arc;

use agent_eval_dispatch::{Dispatcher, ExecutionEngine};
use agent_eval_metrics::{MetricOutcome, evaluate_tool_calls};
use futures::StreamExt as _;
use tracing::info;

use crate::case::EvalCase;
use crate::judge::judge_answer;
use crate::recording::RecordingSink;

/// Runner behavior options.
#[derive(Clone, Debug)]
pub struct RunnerOptions {
    /// Maximum number of cases in flight at once.
    pub concurrency: usize,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self { concurrency: 4 }
    }
}

/// Outcome of one evaluated case.
#[derive(Clone, Debug)]
pub struct CaseReport {
    /// Name of the case this report belongs to.
    pub case_name: String,
    /// Metric name to outcome, covering tools and answer metrics.
    pub metrics: BTreeMap<String, MetricOutcome>,
    /// Run-level failure, if the case could not complete normally: either a
    /// hard dispatch error or an engine behavior failure surfaced mid-run.
    pub run_error: Option<String>,
}

impl CaseReport {
    /// True when every assertion metric passed and the run had no error.
    pub fn passed(&self) -> bool {
        self.run_error.is_none()
            && self.metrics.values().all(|outcome| {
                !matches!(
                    outcome.value,
                    agent_eval_metrics::MetricValue::Assertion(false)
                )
            })
    }
}

/// Drives evaluation cases against one execution engine.
///
/// Dispatcher state is run-scoped, so the runner creates a fresh dispatcher
/// per case; the engine adapter itself is shared. The evaluator is pure, so
/// cases evaluate safely at any concurrency.
pub struct CaseRunner {
    engine: Arc<dyn ExecutionEngine>,
    options: RunnerOptions,
}

impl CaseRunner {
    /// Creates a runner with default options.
    pub fn new(engine: Arc<dyn ExecutionEngine>) -> Self {
        Self::with_options(engine, RunnerOptions::default())
    }

    /// Creates a runner with explicit options.
    pub fn with_options(engine: Arc<dyn ExecutionEngine>, options: RunnerOptions) -> Self {
        Self { engine, options }
    }

    /// Runs a single case to a report.
    ///
    /// Run-level failures land in `CaseReport::run_error` rather than an
    /// `Err`, so one broken case never aborts a dataset sweep.
    pub async fn run_case(&self, case: &EvalCase) -> CaseReport {
        let mut dispatcher = Dispatcher::new(self.engine.clone());
        let mut sink = RecordingSink::new();
        let run_error = match dispatcher.run_to_end(&case.prompt, &mut sink).await {
            Ok(_) => sink.error().map(str::to_string),
            Err(err) => Some(err.to_string()),
        };

        let tools = evaluate_tool_calls(&case.expected_calls, sink.tool_calls(), case.threshold);
        let answer = judge_answer(
            sink.final_response().unwrap_or(""),
            &case.expected_answer,
            case.threshold,
        );
        let mut metrics = tools.metrics();
        metrics.append(&mut answer.metrics());

        info!(
            case = %case.name,
            tools_score = tools.score,
            answer_score = answer.score,
            run_error = run_error.as_deref().unwrap_or(""),
            "case evaluated"
        );
        CaseReport {
            case_name: case.name.clone(),
            metrics,
            run_error,
        }
    }

    /// Runs every case with bounded concurrency, reports in case order.
    pub async fn run_all(&self, cases: &[EvalCase]) -> Vec<CaseReport> {
        futures::stream::iter(cases.iter().map(|case| self.run_case(case)))
            .buffered(self.options.concurrency.max(1))
            .collect()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_eval_dispatch::{EngineError, EngineEvent, EngineEventStream, RunRequest};
    use agent_eval_metrics::{
        Expected, ExpectedToolCall, MetricValue, TOOLS_ASSERTION_METRIC, TOOLS_SCORE_METRIC,
    };
    use crate::judge::{ANSWER_ASSERTION_METRIC, ANSWER_SCORE_METRIC};
    use futures::stream;
    use serde_json::json;

    struct ScriptedEngine {
        events: Vec<Result<EngineEvent, EngineError>>,
    }

    #[async_trait::async_trait]
    impl ExecutionEngine for ScriptedEngine {
        async fn start_run(&self, _request: RunRequest) -> Result<EngineEventStream, EngineError> {
            Ok(Box::pin(stream::iter(self.events.clone())))
        }
    }

    fn lookup_engine() -> Arc<dyn ExecutionEngine> {
        Arc::new(ScriptedEngine {
            events: vec![
                Ok(EngineEvent::TextStart {
                    text: "Checking users".into(),
                }),
                Ok(EngineEvent::ToolCallStarted {
                    tool_name: "users_list".into(),
                    args: json!({"limit": 5}),
                    call_id: "tc1".into(),
                }),
                Ok(EngineEvent::ToolCallFinished {
                    call_id: "tc1".into(),
                    content: r#"{"data": [{"id": 1}]}"#.into(),
                    is_error: false,
                }),
                Ok(EngineEvent::TextDelta {
                    text: "Found 1 user".into(),
                }),
                Ok(EngineEvent::RunCompleted { history: json!([]) }),
            ],
        })
    }

    #[tokio::test]
    async fn case_with_matching_expectations_passes() {
        let runner = CaseRunner::new(lookup_engine());
        let case = EvalCase::new("users-list", "list the users")
            .expect_call(
                ExpectedToolCall::new("users", "list").with_arg("limit", Expected::from(json!(5))),
            )
            .expect_answer("found 1 user");

        let report = runner.run_case(&case).await;
        assert!(report.passed(), "report: {report:?}");
        assert_eq!(
            report.metrics[TOOLS_SCORE_METRIC].value,
            MetricValue::Score(1.0)
        );
        assert_eq!(
            report.metrics[ANSWER_SCORE_METRIC].value,
            MetricValue::Score(1.0)
        );
        assert_eq!(report.run_error, None);
    }

    #[tokio::test]
    async fn case_with_wrong_expectations_fails_with_reasons() {
        let runner = CaseRunner::new(lookup_engine());
        let case = EvalCase::new("orders", "list the orders")
            .expect_call(ExpectedToolCall::new("orders", "list"))
            .expect_answer("found 3 orders");

        let report = runner.run_case(&case).await;
        assert!(!report.passed());
        assert_eq!(
            report.metrics[TOOLS_ASSERTION_METRIC].value,
            MetricValue::Assertion(false)
        );
        assert!(report.metrics[TOOLS_ASSERTION_METRIC]
            .reason
            .contains("missing tool calls: orders_list"));
        assert_eq!(
            report.metrics[ANSWER_ASSERTION_METRIC].value,
            MetricValue::Assertion(false)
        );
    }

    #[tokio::test]
    async fn behavior_failure_lands_in_run_error() {
        let runner = CaseRunner::new(Arc::new(ScriptedEngine {
            events: vec![Err(EngineError::behavior("model exceeded retries"))],
        }));
        let case = EvalCase::new("broken", "anything")
            .expect_call(ExpectedToolCall::new("users", "list"));

        let report = runner.run_case(&case).await;
        assert_eq!(report.run_error.as_deref(), Some("model exceeded retries"));
        assert!(!report.passed());
        // No calls were observed, so the expected call is missing.
        assert_eq!(
            report.metrics[TOOLS_SCORE_METRIC].value,
            MetricValue::Score(0.0)
        );
    }

    #[tokio::test]
    async fn run_all_reports_every_case_in_order() {
        let runner = CaseRunner::with_options(lookup_engine(), RunnerOptions { concurrency: 2 });
        let cases = vec![
            EvalCase::new("a", "list the users").expect_call(
                ExpectedToolCall::new("users", "list").with_arg("limit", Expected::from(json!(5))),
            ),
            EvalCase::new("b", "list the orders")
                .expect_call(ExpectedToolCall::new("orders", "list")),
            EvalCase::new("c", "free-form")
                .expect_answer("found 1 user")
                .threshold(0.0),
        ];

        let reports = runner.run_all(&cases).await;
        assert_eq!(reports.len(), 3);
        assert_eq!(
            reports.iter().map(|r| r.case_name.as_str()).collect::<Vec<_>>(),
            ["a", "b", "c"]
        );
        assert!(reports[0].passed());
        assert!(!reports[1].passed());
        assert!(reports[2].passed());
    }
}
