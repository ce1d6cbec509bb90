use agent_eval_metrics::ExpectedToolCall;

/// One evaluation case: a prompt plus its expectations.
///
/// Expected calls are built programmatically because argument expectations
/// may carry wildcards and predicates, which have no data representation.
#[derive(Clone, Debug)]
pub struct EvalCase {
    /// Case name, used in reports and logs.
    pub name: String,
    /// User prompt sent to the agent.
    pub prompt: String,
    /// Tool calls the agent is expected to make.
    pub expected_calls: Vec<ExpectedToolCall>,
    /// Phrases the final answer must contain.
    pub expected_answer: Vec<String>,
    /// Pass threshold applied to both the tools and answer scores.
    pub threshold: f64,
}

impl EvalCase {
    /// Creates a case with no expectations and a threshold of 1.0.
    pub fn new(name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prompt: prompt.into(),
            expected_calls: Vec::new(),
            expected_answer: Vec::new(),
            threshold: 1.0,
        }
    }

    /// Adds an expected tool call.
    pub fn expect_call(mut self, call: ExpectedToolCall) -> Self {
        self.expected_calls.push(call);
        self
    }

    /// Adds a phrase the final answer must contain.
    pub fn expect_answer(mut self, phrase: impl Into<String>) -> Self {
        self.expected_answer.push(phrase.into());
        self
    }

    /// Overrides the pass threshold.
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }
}
