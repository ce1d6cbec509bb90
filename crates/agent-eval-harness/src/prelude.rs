//! Common imports for typical harness usage.
pub use crate::{
    AnswerJudgement, CaseReport, CaseRunner, CassetteEntry, CassetteStore, EvalCase, HarnessError,
    RecordingSink, RunnerOptions, init_observability, judge_answer,
};
