/// Normalized model-execution events consumed by the `Dispatcher`.
///
/// Events arrive once, in order, and are never replayed. Non-text delta
/// payloads are filtered out by the engine adapter and never reach this enum.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum EngineEvent {
    /// First chunk of a text block.
    TextStart {
        text: String,
    },
    /// Incremental text chunk.
    TextDelta {
        text: String,
    },
    /// The model requested a tool invocation.
    ///
    /// `args` may be a structured mapping or a JSON-encoded string; the
    /// dispatcher coerces either into a mapping.
    ToolCallStarted {
        tool_name: String,
        args: serde_json::Value,
        call_id: String,
    },
    /// A previously started tool invocation produced its result.
    ///
    /// Carries no argument payload; the dispatcher re-attaches the arguments
    /// recorded at `ToolCallStarted`.
    ToolCallFinished {
        call_id: String,
        content: String,
        is_error: bool,
    },
    /// Terminal success event with the engine's conversation history snapshot.
    RunCompleted {
        history: serde_json::Value,
    },
}
