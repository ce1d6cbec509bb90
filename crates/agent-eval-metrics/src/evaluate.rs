use std::collections::{BTreeMap, HashSet};

use pathfinding::prelude::{Matrix, kuhn_munkres_min};
use serde_json::Value;
use tracing::debug;

use crate::call::{ActualToolCall, ExpectedToolCall};
use crate::matcher::{Expected, ExpectedArgs, match_score, matches_args, matches_value, render_value};

/// Metric name for the float score in `[0, 1]`.
pub const TOOLS_SCORE_METRIC: &str = "tools_score";
/// Metric name for the boolean pass/fail assertion.
pub const TOOLS_ASSERTION_METRIC: &str = "tools_assertion";

/// Cost of pairing an expected call with an ineligible actual call, and of
/// another row's missing slot. Effectively forbidden, never optimal.
const FORBIDDEN_COST: i64 = 10_000;
/// Cost of a row's own "declare missing" slot; the guaranteed escape hatch.
const MISSING_SLOT_COST: i64 = 1_000;
/// Reward subtracted from an eligible cell when the arguments deep-match.
const EXACT_MATCH_BONUS: i64 = 1_000;
/// Serialized actual values in predicate diagnostics are cut at this length.
const DIAGNOSTIC_VALUE_LIMIT: usize = 500;

/// Verdict for one evaluation; immutable once produced.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ToolCallEvaluation {
    /// Weighted score in `[0, 1]`.
    pub score: f64,
    /// Whether the score met the pass threshold.
    pub passed: bool,
    /// Human-readable diagnosis.
    pub reason: String,
}

/// Value carried by one reported metric.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub enum MetricValue {
    Assertion(bool),
    Score(f64),
}

/// One reported metric: a value plus its reason.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct MetricOutcome {
    pub value: MetricValue,
    pub reason: String,
}

impl ToolCallEvaluation {
    /// Renders the verdict as the two-metric mapping consumed by reports.
    pub fn metrics(&self) -> BTreeMap<String, MetricOutcome> {
        BTreeMap::from([
            (
                TOOLS_ASSERTION_METRIC.to_string(),
                MetricOutcome {
                    value: MetricValue::Assertion(self.passed),
                    reason: self.reason.clone(),
                },
            ),
            (
                TOOLS_SCORE_METRIC.to_string(),
                MetricOutcome {
                    value: MetricValue::Score(self.score),
                    reason: self.reason.clone(),
                },
            ),
        ])
    }
}

/// Scores observed tool calls against expected ones.
///
/// Builds an `m x (n+m)` cost matrix (one extra "declare missing" slot per
/// expected call), solves the optimal assignment, classifies every expected
/// and actual call, and reduces the classification to a weighted score and a
/// diagnosis.
pub fn evaluate_tool_calls(
    expected: &[ExpectedToolCall],
    actual: &[ActualToolCall],
    threshold: f64,
) -> ToolCallEvaluation {
    if expected.is_empty() {
        return evaluate_with_no_expectations(actual, threshold);
    }

    let m = expected.len();
    let n = actual.len();
    let expected_names: Vec<String> = expected.iter().map(ExpectedToolCall::name).collect();
    let actual_arg_values: Vec<Value> = actual
        .iter()
        .map(|call| Value::Object(call.args.clone()))
        .collect();

    let costs = Matrix::from_fn(m, n + m, |(row, col)| {
        if col >= n {
            return if col == n + row {
                MISSING_SLOT_COST
            } else {
                FORBIDDEN_COST
            };
        }
        let exp = &expected[row];
        let act = &actual[col];
        let eligible =
            act.name == expected_names[row] || (act.entity == exp.entity && act.action == exp.action);
        if !eligible {
            return FORBIDDEN_COST;
        }
        let heuristic = match_score(&exp.args, &actual_arg_values[col]);
        let bonus = if matches_args(&exp.args, &act.args) {
            EXACT_MATCH_BONUS
        } else {
            0
        };
        -(heuristic + bonus)
    });
    let (_, assignment) = kuhn_munkres_min(&costs);

    // Classification order is load-bearing: a name-mismatched assignment books
    // the expected row as missing and keeps the actual column out of the
    // unexpected bucket.
    let mut missing: Vec<usize> = Vec::new();
    let mut matched_actuals: HashSet<usize> = HashSet::new();
    let mut mismatched_actuals: HashSet<usize> = HashSet::new();
    let mut wrong_args: Vec<(usize, usize)> = Vec::new();
    let mut correct_args = 0_usize;

    for (row, &col) in assignment.iter().enumerate() {
        if col >= n {
            missing.push(row);
            continue;
        }
        if actual[col].name != expected_names[row] {
            missing.push(row);
            mismatched_actuals.insert(col);
            continue;
        }
        matched_actuals.insert(col);
        if matches_args(&expected[row].args, &actual[col].args) {
            correct_args += 1;
        } else {
            wrong_args.push((row, col));
        }
    }

    let unexpected: Vec<usize> = (0..n)
        .filter(|col| !matched_actuals.contains(col) && !mismatched_actuals.contains(col))
        .collect();

    let m_f = m as f64;
    let name_score =
        ((m as i64 - missing.len() as i64 - unexpected.len() as i64) as f64 / m_f).max(0.0);
    let args_score = (correct_args as f64 / m_f).max(0.0);
    let score = (0.5 * name_score + 0.5 * args_score).clamp(0.0, 1.0);
    debug!(
        expected = m,
        actual = n,
        missing = missing.len(),
        unexpected = unexpected.len(),
        correct_args,
        score,
        "tool call evaluation"
    );

    let mut segments: Vec<String> = Vec::new();
    if !missing.is_empty() {
        let rendered: Vec<String> = missing
            .iter()
            .map(|&row| {
                format!(
                    "{}({})",
                    expected_names[row],
                    render_expected_args(&expected[row].args)
                )
            })
            .collect();
        segments.push(format!("missing tool calls: {}", rendered.join(", ")));
    }
    for &(row, col) in &wrong_args {
        let notes = diagnose_args(&expected[row].args, &actual[col].args);
        segments.push(format!(
            "wrong args for {}: {}",
            expected_names[row],
            notes.join("; ")
        ));
    }
    if !unexpected.is_empty() {
        let rendered: Vec<String> = unexpected
            .iter()
            .map(|&col| {
                format!(
                    "{}({})",
                    actual[col].name,
                    render_value(&actual_arg_values[col])
                )
            })
            .collect();
        segments.push(format!("unexpected tool calls: {}", rendered.join(", ")));
    }
    let reason = if segments.is_empty() {
        "all expected tool calls present with correct args".to_string()
    } else {
        segments.join("; ")
    };

    ToolCallEvaluation {
        score,
        passed: score >= threshold,
        reason,
    }
}

fn evaluate_with_no_expectations(actual: &[ActualToolCall], threshold: f64) -> ToolCallEvaluation {
    if actual.is_empty() {
        return ToolCallEvaluation {
            score: 1.0,
            passed: true,
            reason: "no tools expected".to_string(),
        };
    }
    let names: Vec<&str> = actual.iter().map(|call| call.name.as_str()).collect();
    let score = 0.0;
    ToolCallEvaluation {
        score,
        passed: score >= threshold,
        reason: format!("unexpected tool calls: {}", names.join(", ")),
    }
}

/// Per-key diagnostics for a name-matched call whose arguments diverge.
fn diagnose_args(expected: &ExpectedArgs, actual: &serde_json::Map<String, Value>) -> Vec<String> {
    let mut notes = Vec::new();
    for (key, exp) in expected {
        match exp {
            Expected::Predicate(p) => {
                let holds = actual.get(key).is_some_and(|value| p.holds(value));
                if !holds {
                    let got = actual
                        .get(key)
                        .map(render_value)
                        .unwrap_or_else(|| "<absent>".to_string());
                    notes.push(format!(
                        "{key}: expected <{}> got {}",
                        p.description(),
                        truncate_chars(got, DIAGNOSTIC_VALUE_LIMIT)
                    ));
                }
            }
            _ => {
                let ok = actual.get(key).is_some_and(|value| matches_value(exp, value));
                if !ok {
                    let got = actual
                        .get(key)
                        .map(render_value)
                        .unwrap_or_else(|| "<absent>".to_string());
                    notes.push(format!("{key}: expected {exp} got {got}"));
                }
            }
        }
    }
    notes
}

fn render_expected_args(args: &ExpectedArgs) -> String {
    let parts: Vec<String> = args
        .iter()
        .map(|(key, value)| format!("{key:?}: {value}"))
        .collect();
    format!("{{{}}}", parts.join(", "))
}

fn truncate_chars(mut text: String, limit: usize) -> String {
    if let Some((idx, _)) = text.char_indices().nth(limit) {
        text.truncate(idx);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::Expected;
    use serde_json::json;

    fn args(value: serde_json::Value) -> serde_json::Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("args must be an object, got {other}"),
        }
    }

    fn expected(entity: &str, action: &str, value: serde_json::Value) -> ExpectedToolCall {
        let mut call = ExpectedToolCall::new(entity, action);
        for (key, v) in args(value) {
            call = call.with_arg(key, Expected::from(v));
        }
        call
    }

    fn actual(name: &str, value: serde_json::Value) -> ActualToolCall {
        ActualToolCall::from_name(name, args(value))
    }

    #[test]
    fn empty_case_passes_with_full_score() {
        let verdict = evaluate_tool_calls(&[], &[], 1.0);
        assert_eq!(verdict.score, 1.0);
        assert!(verdict.passed);
        assert_eq!(verdict.reason, "no tools expected");
    }

    #[test]
    fn unexpected_calls_with_no_expectations_score_zero() {
        let verdict = evaluate_tool_calls(&[], &[actual("users_list", json!({}))], 1.0);
        assert_eq!(verdict.score, 0.0);
        assert!(!verdict.passed);
        assert!(verdict.reason.contains("users_list"));

        // A zero threshold turns the same case into a pass.
        let verdict = evaluate_tool_calls(&[], &[actual("users_list", json!({}))], 0.0);
        assert!(verdict.passed);
    }

    #[test]
    fn missing_expected_call_scores_zero() {
        let verdict = evaluate_tool_calls(&[expected("users", "list", json!({}))], &[], 1.0);
        assert_eq!(verdict.score, 0.0);
        assert!(!verdict.passed);
        assert!(verdict.reason.starts_with("missing tool calls: users_list"));
    }

    #[test]
    fn exact_match_scores_one() {
        let verdict = evaluate_tool_calls(
            &[expected("a", "list", json!({"x": 1}))],
            &[actual("a_list", json!({"x": 1}))],
            1.0,
        );
        assert_eq!(verdict.score, 1.0);
        assert!(verdict.passed);
        assert_eq!(verdict.reason, "all expected tool calls present with correct args");
    }

    #[test]
    fn name_match_with_wrong_args_scores_half() {
        let verdict = evaluate_tool_calls(
            &[expected("a", "list", json!({"x": 1}))],
            &[actual("a_list", json!({"x": 2}))],
            1.0,
        );
        assert_eq!(verdict.score, 0.5);
        assert!(!verdict.passed);
        assert_eq!(verdict.reason, "wrong args for a_list: x: expected 1 got 2");
    }

    #[test]
    fn assignment_prefers_exact_args_among_same_named_calls() {
        let verdict = evaluate_tool_calls(
            &[expected("users", "list", json!({"limit": 5}))],
            &[
                actual("users_list", json!({"limit": 99})),
                actual("users_list", json!({"limit": 5})),
            ],
            1.0,
        );
        // The exact call pairs; the other is unexpected: names (1-0-1)/1 = 0,
        // args 1/1, weighted 0.5.
        assert_eq!(verdict.score, 0.5);
        assert!(verdict.reason.contains("unexpected tool calls: users_list({\"limit\":99})"));
        assert!(!verdict.reason.contains("wrong args"));
    }

    #[test]
    fn entity_action_eligible_name_mismatch_is_missing_not_unexpected() {
        let verdict = evaluate_tool_calls(
            &[expected("users", "list", json!({}))],
            &[ActualToolCall::new("users.list", "users", "list", args(json!({})))],
            1.0,
        );
        assert_eq!(verdict.score, 0.0);
        assert!(verdict.reason.contains("missing tool calls: users_list"));
        assert!(!verdict.reason.contains("unexpected"));
    }

    #[test]
    fn ineligible_actual_is_unexpected_and_expected_is_missing() {
        let verdict = evaluate_tool_calls(
            &[expected("users", "list", json!({}))],
            &[actual("orders_create", json!({}))],
            1.0,
        );
        // names (1-1-1)/1 clamps to 0.
        assert_eq!(verdict.score, 0.0);
        assert!(verdict.reason.contains("missing tool calls: users_list({})"));
        assert!(verdict.reason.contains("unexpected tool calls: orders_create({})"));
    }

    #[test]
    fn wildcard_and_predicate_args_count_as_correct() {
        let call = ExpectedToolCall::new("users", "search")
            .with_arg("q", Expected::any())
            .with_arg(
                "limit",
                Expected::predicate("positive", |v| v.as_i64().is_some_and(|n| n > 0)),
            );
        let verdict = evaluate_tool_calls(
            &[call],
            &[actual("users_search", json!({"q": "smith", "limit": 10}))],
            1.0,
        );
        assert_eq!(verdict.score, 1.0);
        assert!(verdict.passed);
    }

    #[test]
    fn predicate_failure_reports_description_and_truncated_value() {
        let call = ExpectedToolCall::new("users", "search").with_arg(
            "q",
            Expected::predicate("non-empty query", |v| {
                v.as_str().is_some_and(|s| !s.is_empty())
            }),
        );
        let long = "x".repeat(600);
        let verdict = evaluate_tool_calls(
            &[call],
            &[actual("users_search", json!({"q": long}))],
            1.0,
        );
        assert!(verdict.reason.contains("expected <non-empty query>"));
        // 500 value chars plus the surrounding JSON quotes.
        let got = verdict.reason.split(" got ").nth(1).expect("diagnostic tail");
        assert_eq!(got.chars().count(), DIAGNOSTIC_VALUE_LIMIT);
    }

    #[test]
    fn two_expected_two_actual_all_matched() {
        let verdict = evaluate_tool_calls(
            &[
                expected("users", "list", json!({})),
                expected("orders", "create", json!({"sku": "a-1"})),
            ],
            &[
                actual("orders_create", json!({"sku": "a-1"})),
                actual("users_list", json!({})),
            ],
            1.0,
        );
        assert_eq!(verdict.score, 1.0);
        assert!(verdict.passed);
    }

    #[test]
    fn reason_orders_missing_then_wrong_args_then_unexpected() {
        let verdict = evaluate_tool_calls(
            &[
                expected("users", "list", json!({})),
                expected("orders", "create", json!({"sku": "a-1"})),
            ],
            &[
                actual("orders_create", json!({"sku": "b-2"})),
                actual("carts_clear", json!({})),
            ],
            1.0,
        );
        let missing_at = verdict.reason.find("missing tool calls").expect("missing segment");
        let wrong_at = verdict.reason.find("wrong args").expect("wrong-args segment");
        let unexpected_at = verdict
            .reason
            .find("unexpected tool calls")
            .expect("unexpected segment");
        assert!(missing_at < wrong_at && wrong_at < unexpected_at);
    }

    #[test]
    fn metrics_mapping_exposes_assertion_and_score() {
        let verdict = evaluate_tool_calls(
            &[expected("a", "list", json!({"x": 1}))],
            &[actual("a_list", json!({"x": 1}))],
            1.0,
        );
        let metrics = verdict.metrics();
        assert_eq!(
            metrics[TOOLS_ASSERTION_METRIC].value,
            MetricValue::Assertion(true)
        );
        assert_eq!(metrics[TOOLS_SCORE_METRIC].value, MetricValue::Score(1.0));
        assert_eq!(metrics.len(), 2);
    }
}
