use serde_json::Value;

use crate::matcher::{Expected, ExpectedArgs};

/// Tool invocation declared by a test case.
///
/// The connector tool name is derived as `"{entity}_{action}"`.
#[derive(Clone, Debug)]
pub struct ExpectedToolCall {
    pub entity: String,
    pub action: String,
    pub args: ExpectedArgs,
}

impl ExpectedToolCall {
    /// Creates an expected call with no argument constraints.
    pub fn new(entity: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            action: action.into(),
            args: ExpectedArgs::new(),
        }
    }

    /// Adds one expected argument.
    pub fn with_arg(mut self, key: impl Into<String>, expected: impl Into<Expected>) -> Self {
        self.args.insert(key.into(), expected.into());
        self
    }

    /// Replaces the expected argument map wholesale.
    pub fn with_args(mut self, args: ExpectedArgs) -> Self {
        self.args = args;
        self
    }

    /// Derived connector tool name.
    pub fn name(&self) -> String {
        format!("{}_{}", self.entity, self.action)
    }
}

/// Tool invocation observed from a run.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ActualToolCall {
    pub name: String,
    pub entity: String,
    pub action: String,
    pub args: serde_json::Map<String, Value>,
}

impl ActualToolCall {
    /// Creates an actual call with explicit entity and action.
    pub fn new(
        name: impl Into<String>,
        entity: impl Into<String>,
        action: impl Into<String>,
        args: serde_json::Map<String, Value>,
    ) -> Self {
        Self {
            name: name.into(),
            entity: entity.into(),
            action: action.into(),
            args,
        }
    }

    /// Derives entity and action by splitting the name on its last `_`.
    ///
    /// A name without a separator becomes the entity with an empty action;
    /// such a call can then only pair with an expected call via the full-name
    /// comparison.
    pub fn from_name(name: impl Into<String>, args: serde_json::Map<String, Value>) -> Self {
        let name = name.into();
        let (entity, action) = match name.rsplit_once('_') {
            Some((entity, action)) => (entity.to_string(), action.to_string()),
            None => (name.clone(), String::new()),
        };
        Self {
            name,
            entity,
            action,
            args,
        }
    }
}
