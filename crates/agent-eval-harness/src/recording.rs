use agent_eval_dispatch::{ArgMap, RunSink, SinkError};
use agent_eval_metrics::ActualToolCall;

/// Sink that records dispatcher callbacks for later evaluation.
///
/// Tool invocations are captured at the start callback (that is where the
/// arguments live) and converted into `ActualToolCall` records; intermediate
/// text, the final answer, and any surfaced engine error are kept verbatim.
#[derive(Debug, Default)]
pub struct RecordingSink {
    tool_calls: Vec<ActualToolCall>,
    intermediate: Vec<String>,
    final_response: Option<String>,
    error: Option<String>,
}

impl RecordingSink {
    /// Creates an empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Observed tool calls, in invocation order.
    pub fn tool_calls(&self) -> &[ActualToolCall] {
        &self.tool_calls
    }

    /// Intermediate responses, in flush order.
    pub fn intermediate_responses(&self) -> &[String] {
        &self.intermediate
    }

    /// Final answer text, if the run produced one.
    pub fn final_response(&self) -> Option<&str> {
        self.final_response.as_deref()
    }

    /// Behavior-failure message surfaced by the engine, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

impl RunSink for RecordingSink {
    fn on_tool_call_start(
        &mut self,
        name: &str,
        args: &ArgMap,
        _call_id: &str,
    ) -> Result<(), SinkError> {
        self.tool_calls.push(ActualToolCall::from_name(name, args.clone()));
        Ok(())
    }

    fn on_intermediate_response(&mut self, text: &str) -> Result<(), SinkError> {
        self.intermediate.push(text.to_string());
        Ok(())
    }

    fn on_final_response(&mut self, text: &str) -> Result<(), SinkError> {
        self.final_response = Some(text.to_string());
        Ok(())
    }

    fn on_error(&mut self, message: &str) -> Result<(), SinkError> {
        self.error = Some(message.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn records_calls_and_responses() {
        let mut sink = RecordingSink::new();
        let args: ArgMap = [("limit".to_string(), json!(5))].into_iter().collect();

        sink.on_intermediate_response("looking").expect("intermediate");
        sink.on_tool_call_start("users_list", &args, "tc1").expect("start");
        sink.on_final_response("done").expect("final");

        assert_eq!(sink.tool_calls().len(), 1);
        assert_eq!(sink.tool_calls()[0].entity, "users");
        assert_eq!(sink.tool_calls()[0].action, "list");
        assert_eq!(sink.intermediate_responses(), ["looking"]);
        assert_eq!(sink.final_response(), Some("done"));
        assert_eq!(sink.error(), None);
    }
}
