use crate::errors::SinkError;

/// JSON object shape used for tool-call arguments.
pub type ArgMap = serde_json::Map<String, serde_json::Value>;

/// Capability set receiving the dispatcher's semantic callbacks.
///
/// Every method defaults to a no-op, so a partial implementation is always
/// valid. Returning `Err` from any callback aborts the run; the dispatcher
/// propagates the error to the caller without catching or retrying.
pub trait RunSink {
    /// A tool invocation was requested by the model.
    fn on_tool_call_start(
        &mut self,
        name: &str,
        args: &ArgMap,
        call_id: &str,
    ) -> Result<(), SinkError> {
        let _ = (name, args, call_id);
        Ok(())
    }

    /// A tool invocation produced its result.
    fn on_tool_call_end(
        &mut self,
        name: &str,
        args: &ArgMap,
        result: &str,
        call_id: &str,
        is_error: bool,
    ) -> Result<(), SinkError> {
        let _ = (name, args, result, call_id, is_error);
        Ok(())
    }

    /// Text produced before a tool call, flushed strictly before the
    /// tool-start callback.
    fn on_intermediate_response(&mut self, text: &str) -> Result<(), SinkError> {
        let _ = text;
        Ok(())
    }

    /// Trailing text at run completion.
    fn on_final_response(&mut self, text: &str) -> Result<(), SinkError> {
        let _ = text;
        Ok(())
    }

    /// The engine reported a model-behavior failure; the run ends normally
    /// after this callback.
    fn on_error(&mut self, message: &str) -> Result<(), SinkError> {
        let _ = message;
        Ok(())
    }
}

/// Trivial sink that ignores every callback.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl RunSink for NoopSink {}
