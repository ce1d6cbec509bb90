use std::collections::BTreeMap;

use agent_eval_metrics::{MetricOutcome, MetricValue};

/// Metric name for the answer coverage score in `[0, 1]`.
pub const ANSWER_SCORE_METRIC: &str = "answer_score";
/// Metric name for the answer pass/fail assertion.
pub const ANSWER_ASSERTION_METRIC: &str = "answer_assertion";

/// Verdict of the containment judge for one final answer.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct AnswerJudgement {
    /// Fraction of expected phrases present in the answer.
    pub score: f64,
    /// Whether the score met the pass threshold.
    pub passed: bool,
    /// Which phrases were missing, if any.
    pub reason: String,
}

impl AnswerJudgement {
    /// Renders the judgement as its two-metric mapping.
    pub fn metrics(&self) -> BTreeMap<String, MetricOutcome> {
        BTreeMap::from([
            (
                ANSWER_ASSERTION_METRIC.to_string(),
                MetricOutcome {
                    value: MetricValue::Assertion(self.passed),
                    reason: self.reason.clone(),
                },
            ),
            (
                ANSWER_SCORE_METRIC.to_string(),
                MetricOutcome {
                    value: MetricValue::Score(self.score),
                    reason: self.reason.clone(),
                },
            ),
        ])
    }
}

/// Case-insensitive containment check of expected phrases in a final answer.
///
/// Deliberately trivial: no semantics, no tokenization beyond lowercasing.
pub fn judge_answer(answer: &str, expected_phrases: &[String], threshold: f64) -> AnswerJudgement {
    if expected_phrases.is_empty() {
        return AnswerJudgement {
            score: 1.0,
            passed: true,
            reason: "no answer expectations".to_string(),
        };
    }
    let haystack = answer.to_lowercase();
    let missing: Vec<&str> = expected_phrases
        .iter()
        .filter(|phrase| !haystack.contains(&phrase.to_lowercase()))
        .map(String::as_str)
        .collect();
    let found = expected_phrases.len() - missing.len();
    let score = found as f64 / expected_phrases.len() as f64;
    let reason = if missing.is_empty() {
        "all expected phrases present".to_string()
    } else {
        format!("answer missing phrases: {}", missing.join(", "))
    };
    AnswerJudgement {
        score,
        passed: score >= threshold,
        reason,
    }
}
